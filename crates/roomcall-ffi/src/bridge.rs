//! Adapters from the foreign [`PlatformBridge`] to the core's seams.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use roomcall_core::{
    Container as CoreContainer, ConnectOptions as CoreConnectOptions,
    MediaSurface, Participant as CoreParticipant, Permission as CorePermission, PermissionGate,
    RoomEvent as CoreRoomEvent, RoomcallError as CoreRoomcallError, SdkError, SdkRoom,
    Track as CoreTrack, VideoSdk,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{BridgeError, PlatformBridge};

impl From<BridgeError> for SdkError {
    fn from(e: BridgeError) -> Self {
        SdkError::new(e.to_string())
    }
}

/// Run a blocking bridge call on the runtime's blocking pool.
async fn off_runtime<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| format!("platform call failed: {e}"))
}

/// Sender half of the active room's event stream.
#[derive(Clone, Default)]
pub(crate) struct EventSlot {
    sender: Arc<Mutex<Option<UnboundedSender<CoreRoomEvent>>>>,
}

impl EventSlot {
    fn open(&self) -> UnboundedReceiver<CoreRoomEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock().expect("event slot poisoned") = Some(tx);
        rx
    }

    fn close(&self) {
        self.sender.lock().expect("event slot poisoned").take();
    }

    pub(crate) fn deliver(&self, event: CoreRoomEvent) {
        let mut sender = self.sender.lock().expect("event slot poisoned");
        let Some(tx) = sender.as_ref() else {
            tracing::warn!("dropping room event with no active room: {event:?}");
            return;
        };
        let last = matches!(event, CoreRoomEvent::Disconnected);
        if tx.send(event).is_err() {
            tracing::warn!("room event loop already ended");
        }
        if last {
            sender.take();
        }
    }
}

pub(crate) struct BridgeSdk {
    bridge: Arc<dyn PlatformBridge>,
    events: EventSlot,
}

impl BridgeSdk {
    pub(crate) fn new(bridge: Arc<dyn PlatformBridge>, events: EventSlot) -> Self {
        Self { bridge, events }
    }
}

#[async_trait]
impl VideoSdk for BridgeSdk {
    async fn create_local_tracks(&self) -> Result<Vec<CoreTrack>, SdkError> {
        let bridge = self.bridge.clone();
        let tracks = off_runtime(move || bridge.create_local_tracks())
            .await
            .map_err(SdkError::new)??;
        Ok(tracks.into_iter().map(CoreTrack::from).collect())
    }

    async fn connect(
        &self,
        token: &str,
        options: CoreConnectOptions,
    ) -> Result<(Arc<dyn SdkRoom>, UnboundedReceiver<CoreRoomEvent>), SdkError> {
        let name = options.name.clone();
        // Open the stream first so events raised during connect are kept.
        let events = self.events.open();

        let bridge = self.bridge.clone();
        let token = token.to_string();
        let result = off_runtime(move || bridge.connect(token, options.into()))
            .await
            .map_err(SdkError::new)
            .and_then(|r| r.map_err(SdkError::from));
        if let Err(e) = result {
            self.events.close();
            return Err(e);
        }

        tracing::info!("connected to room '{name}'");
        let room = BridgeRoom {
            bridge: self.bridge.clone(),
            name,
        };
        Ok((Arc::new(room), events))
    }

    fn stop_track(&self, track: &CoreTrack) {
        self.bridge.stop_track(track.clone().into());
    }
}

struct BridgeRoom {
    bridge: Arc<dyn PlatformBridge>,
    name: String,
}

impl SdkRoom for BridgeRoom {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn local_participant(&self) -> CoreParticipant {
        self.bridge.local_participant().into()
    }

    fn participants(&self) -> Vec<CoreParticipant> {
        self.bridge
            .remote_participants()
            .into_iter()
            .map(CoreParticipant::from)
            .collect()
    }

    fn disconnect(&self) {
        self.bridge.disconnect();
    }
}

pub(crate) struct BridgePermissions {
    bridge: Arc<dyn PlatformBridge>,
}

impl BridgePermissions {
    pub(crate) fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl PermissionGate for BridgePermissions {
    async fn request(&self, permissions: &[CorePermission]) -> Result<(), CoreRoomcallError> {
        let bridge = self.bridge.clone();
        let permissions: Vec<crate::Permission> =
            permissions.iter().copied().map(Into::into).collect();
        off_runtime(move || bridge.request_permissions(permissions))
            .await
            .map_err(CoreRoomcallError::Permission)?
            .map_err(|e| CoreRoomcallError::Permission(e.to_string()))
    }
}

pub(crate) struct BridgeSurface {
    bridge: Arc<dyn PlatformBridge>,
}

impl BridgeSurface {
    pub(crate) fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self { bridge }
    }
}

impl MediaSurface for BridgeSurface {
    fn attach(&self, container: CoreContainer, track: &CoreTrack) {
        self.bridge.attach(container.into(), track.clone().into());
    }

    fn detach(&self, track: &CoreTrack) -> usize {
        self.bridge.detach(track.clone().into()) as usize
    }

    fn has_video(&self, container: CoreContainer) -> bool {
        self.bridge.has_video(container.into())
    }
}
