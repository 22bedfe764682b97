//! Seam to the embedded real-time video SDK.
//!
//! Media negotiation and transport stay inside the SDK. The core only sees
//! track handles, a room handle and the room's ordered event stream.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::events::{Participant, Track};

/// Verbosity the SDK logs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkLogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl SdkLogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SdkLogLevel::Debug => "debug",
            SdkLogLevel::Info => "info",
            SdkLogLevel::Warn => "warn",
            SdkLogLevel::Error => "error",
            SdkLogLevel::Off => "off",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub name: String,
    pub log_level: SdkLogLevel,
    /// Pre-acquired local tracks to publish instead of creating new ones.
    pub tracks: Option<Arc<[Track]>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SdkError {
    pub message: String,
}

impl SdkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Events raised by a connected room, delivered in order.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    ParticipantConnected(Participant),
    ParticipantDisconnected(Participant),
    TrackSubscribed { track: Track, participant: Participant },
    TrackUnsubscribed { track: Track, participant: Participant },
    Disconnected,
}

/// A connected room.
pub trait SdkRoom: Send + Sync {
    fn name(&self) -> String;

    fn local_participant(&self) -> Participant;

    /// Remote participants currently in the room.
    fn participants(&self) -> Vec<Participant>;

    /// Ask the SDK to leave. Completion is signalled by
    /// [`RoomEvent::Disconnected`] on the room's event stream.
    fn disconnect(&self);
}

#[async_trait]
pub trait VideoSdk: Send + Sync {
    async fn create_local_tracks(&self) -> Result<Vec<Track>, SdkError>;

    async fn connect(
        &self,
        token: &str,
        options: ConnectOptions,
    ) -> Result<(Arc<dyn SdkRoom>, UnboundedReceiver<RoomEvent>), SdkError>;

    fn stop_track(&self, track: &Track);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_serializes_lowercase() {
        let json = serde_json::to_string(&SdkLogLevel::Debug).unwrap();
        assert_eq!(json, "\"debug\"");
        let level: SdkLogLevel = serde_json::from_str("\"off\"").unwrap();
        assert_eq!(level, SdkLogLevel::Off);
        assert_eq!(SdkLogLevel::Warn.as_str(), "warn");
    }

    #[test]
    fn sdk_error_displays_message() {
        assert_eq!(SdkError::new("network error").to_string(), "network error");
    }
}
