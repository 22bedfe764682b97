use std::fmt;
use std::sync::Arc;

use crate::activity::ActivityEntry;

/// Events emitted by the core to native UI listeners.
#[derive(Debug, Clone)]
pub enum RoomcallEvent {
    StatusChanged(SessionStatus),
    ActivityLogged(ActivityEntry),
    /// User-facing modal message.
    Alert(String),
    PreviewStarted(Vec<Track>),
    ParticipantJoined(Participant),
    ParticipantLeft(Participant),
    TrackSubscribed { participant_sid: String, track: Track },
    TrackUnsubscribed { participant_sid: String, track: Track },
}

/// Whether the local user is currently in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    InRoom,
}

impl SessionStatus {
    pub fn visibility(self) -> Visibility {
        Visibility {
            join_visible: self == SessionStatus::Idle,
            leave_visible: self == SessionStatus::InRoom,
        }
    }
}

/// Which of the join/leave controls the UI shows. Derived from
/// [`SessionStatus`], so exactly one flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub join_visible: bool,
    pub leave_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// Handle to a media track owned by the video SDK.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track {
    pub sid: String,
    pub kind: TrackKind,
    pub name: String,
}

/// A track a participant has published. `track` is `None` until the
/// underlying media is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPublication {
    pub sid: String,
    pub kind: TrackKind,
    pub track: Option<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub sid: String,
    pub identity: String,
    pub publications: Vec<TrackPublication>,
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait RoomcallEventListener: Send + Sync {
    fn on_event(&self, event: RoomcallEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone)]
pub struct EventEmitter {
    listeners: Arc<std::sync::RwLock<Vec<Arc<dyn RoomcallEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(std::sync::RwLock::new(Vec::new())),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn RoomcallEventListener>) {
        self.listeners
            .write()
            .expect("listener lock poisoned")
            .push(listener);
    }

    pub fn emit(&self, event: RoomcallEvent) {
        let listeners = self.listeners.read().expect("listener lock poisoned");
        for listener in listeners.iter() {
            listener.on_event(event.clone());
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
