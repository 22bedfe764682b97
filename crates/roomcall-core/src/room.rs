use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{Mutex, watch};
use tracing::Instrument;
use uuid::Uuid;

use crate::activity::{ActivityEntry, ActivityLog};
use crate::auth::{HttpTokenTransport, TokenFetcher, TokenTransport};
use crate::errors::RoomcallError;
use crate::events::{
    EventEmitter, Participant, RoomcallEvent, RoomcallEventListener, SessionStatus, Track,
    Visibility,
};
use crate::media::{
    Container, MediaSurface, attach_participant_tracks, attach_tracks, detach_participant_tracks,
    detach_tracks,
};
use crate::participants::ParticipantManager;
use crate::permissions::{MEDIA_PERMISSIONS, PermissionGate};
use crate::preview::PreviewController;
use crate::sdk::{ConnectOptions, RoomEvent, SdkRoom, VideoSdk};
use crate::settings::SettingsStore;

/// Platform collaborators the session drives.
#[derive(Clone)]
pub struct Platform {
    pub sdk: Arc<dyn VideoSdk>,
    pub permissions: Arc<dyn PermissionGate>,
    pub surface: Arc<dyn MediaSurface>,
}

/// Manages the lifecycle of a room session: preview, credentials,
/// connection and the room's event stream.
pub struct RoomManager {
    platform: Platform,
    tokens: TokenFetcher,
    preview: Arc<PreviewController>,
    settings: Arc<SettingsStore>,
    emitter: EventEmitter,
    activity: ActivityLog,
    room: Arc<Mutex<Option<Arc<dyn SdkRoom>>>>,
    /// Held for the whole of a join attempt.
    join_gate: Mutex<()>,
    participants: Arc<Mutex<ParticipantManager>>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl RoomManager {
    pub fn new(
        platform: Platform,
        transport: Arc<dyn TokenTransport>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        let emitter = EventEmitter::new();
        let activity = ActivityLog::new(emitter.clone());
        let preview = Arc::new(PreviewController::new(
            platform.sdk.clone(),
            platform.permissions.clone(),
            platform.surface.clone(),
            activity.clone(),
            emitter.clone(),
        ));
        let (status, _) = watch::channel(SessionStatus::Idle);

        Self {
            platform,
            tokens: TokenFetcher::new(transport),
            preview,
            settings,
            emitter,
            activity,
            room: Arc::new(Mutex::new(None)),
            join_gate: Mutex::new(()),
            participants: Arc::new(Mutex::new(ParticipantManager::new())),
            status: Arc::new(status),
        }
    }

    /// Session whose credentials come from the backend configured in `settings`.
    pub fn with_http_backend(
        platform: Platform,
        settings: Arc<SettingsStore>,
    ) -> Result<Self, RoomcallError> {
        let transport = HttpTokenTransport::new(&settings.get().backend_url)?;
        Ok(Self::new(platform, Arc::new(transport), settings))
    }

    /// Register a listener for session events.
    pub fn add_listener(&self, listener: Arc<dyn RoomcallEventListener>) {
        self.emitter.add_listener(listener);
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Watch status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn visibility(&self) -> Visibility {
        self.status().visibility()
    }

    /// Identity assigned by the backend, once credentials were fetched.
    pub fn identity(&self) -> Option<String> {
        self.tokens.identity().map(str::to_string)
    }

    pub fn activity_log(&self) -> Vec<ActivityEntry> {
        self.activity.entries()
    }

    /// Snapshot of remote participants in the current room.
    pub async fn participants(&self) -> Vec<Participant> {
        self.participants.lock().await.participants().to_vec()
    }

    pub async fn active_room_name(&self) -> Option<String> {
        self.room.lock().await.as_ref().map(|room| room.name())
    }

    pub fn preview(&self) -> Arc<PreviewController> {
        self.preview.clone()
    }

    /// Show the local camera/microphone preview.
    pub async fn start_preview(&self) -> Result<Arc<[Track]>, RoomcallError> {
        self.preview.start().await
    }

    /// Join `room_name` using the cached preview tracks, if any.
    ///
    /// A blank name raises an [`RoomcallEvent::Alert`] and changes nothing.
    /// Errors leave the status untouched.
    pub async fn join_room(&self, room_name: &str) -> Result<(), RoomcallError> {
        let name = room_name.trim();
        if name.is_empty() {
            self.emitter.emit(RoomcallEvent::Alert("Please enter a room name.".to_string()));
            return Err(RoomcallError::MissingRoomName);
        }
        let Ok(_joining) = self.join_gate.try_lock() else {
            tracing::warn!("join already in progress, rejecting '{name}'");
            return Err(RoomcallError::AlreadyConnected);
        };
        if self.room.lock().await.is_some() {
            return Err(RoomcallError::AlreadyConnected);
        }

        let attempt = Uuid::new_v4();
        self.join(name)
            .instrument(tracing::info_span!("join", %attempt, room = name))
            .await
    }

    async fn join(&self, name: &str) -> Result<(), RoomcallError> {
        self.activity.log(format!("Joining room '{name}'..."));
        self.settings.set_last_room_name(Some(name.to_string()));

        let options = ConnectOptions {
            name: name.to_string(),
            log_level: self.settings.get().sdk_log_level,
            tracks: self.preview.cached_tracks().await,
        };

        let ((), credentials) = futures_util::future::try_join(
            self.platform.permissions.request(&MEDIA_PERMISSIONS),
            self.tokens.fetch(),
        )
        .await
        .inspect_err(|e| tracing::warn!("join prerequisites failed: {e}"))?;

        let (room, events) = match self.platform.sdk.connect(&credentials.token, options).await {
            Ok(connected) => connected,
            Err(e) => {
                self.activity.log(format!("Could not connect to the video service: {}", e.message));
                return Err(RoomcallError::Connection(e.message));
            }
        };

        self.room_joined(room, events, &credentials.identity).await;
        Ok(())
    }

    async fn room_joined(
        &self,
        room: Arc<dyn SdkRoom>,
        events: UnboundedReceiver<RoomEvent>,
        identity: &str,
    ) {
        *self.room.lock().await = Some(room.clone());

        self.activity.log(format!("Joined as '{identity}'"));
        set_status(&self.status, &self.emitter, SessionStatus::InRoom);

        let surface = self.platform.surface.as_ref();
        if !surface.has_video(Container::LocalMedia) {
            attach_participant_tracks(surface, &room.local_participant(), Container::LocalMedia);
        }

        {
            let mut pm = self.participants.lock().await;
            for participant in room.participants() {
                self.activity.log(format!("Already in Room: '{}'", participant.identity));
                attach_participant_tracks(surface, &participant, Container::RemoteMedia);
                pm.add_participant(participant.clone());
                self.emitter.emit(RoomcallEvent::ParticipantJoined(participant));
            }
        }

        let dispatcher = Dispatcher {
            surface: self.platform.surface.clone(),
            preview: self.preview.clone(),
            activity: self.activity.clone(),
            emitter: self.emitter.clone(),
            room_slot: self.room.clone(),
            participants: self.participants.clone(),
            status: self.status.clone(),
        };
        tokio::spawn(
            dispatcher
                .run(room, events)
                .instrument(tracing::info_span!("room_events")),
        );
    }

    /// Ask the SDK to leave the room.
    ///
    /// Teardown happens when the room reports it has disconnected.
    pub async fn leave_room(&self) -> Result<(), RoomcallError> {
        let room = self
            .room
            .lock()
            .await
            .clone()
            .ok_or(RoomcallError::NotConnected)?;
        self.activity.log("Leaving room...");
        room.disconnect();
        Ok(())
    }

    /// Best-effort disconnect when the host is going away. Does not wait
    /// for teardown.
    pub fn unload(&self) {
        match self.room.try_lock() {
            Ok(room) => {
                if let Some(room) = room.as_ref() {
                    tracing::info!("disconnecting active room on unload");
                    room.disconnect();
                }
            }
            Err(_) => tracing::warn!("room busy during unload, skipping disconnect"),
        }
    }
}

impl Drop for RoomManager {
    fn drop(&mut self) {
        self.unload();
    }
}

fn set_status(
    status: &watch::Sender<SessionStatus>,
    emitter: &EventEmitter,
    new: SessionStatus,
) {
    let old = status.send_replace(new);
    if old != new {
        tracing::debug!("session status {old:?} -> {new:?}");
        emitter.emit(RoomcallEvent::StatusChanged(new));
    }
}

/// Single consumer of a room's event stream.
struct Dispatcher {
    surface: Arc<dyn MediaSurface>,
    preview: Arc<PreviewController>,
    activity: ActivityLog,
    emitter: EventEmitter,
    room_slot: Arc<Mutex<Option<Arc<dyn SdkRoom>>>>,
    participants: Arc<Mutex<ParticipantManager>>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl Dispatcher {
    async fn run(self, room: Arc<dyn SdkRoom>, mut events: UnboundedReceiver<RoomEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                RoomEvent::ParticipantConnected(participant) => {
                    self.activity.log(format!("Joining: '{}'", participant.identity));
                    self.participants
                        .lock()
                        .await
                        .add_participant(participant.clone());
                    self.emitter.emit(RoomcallEvent::ParticipantJoined(participant));
                }

                RoomEvent::TrackSubscribed { track, participant } => {
                    self.activity.log(format!(
                        "Subscribed to {}'s track: {}",
                        participant.identity, track.kind
                    ));
                    attach_tracks(
                        self.surface.as_ref(),
                        std::slice::from_ref(&track),
                        Container::RemoteMedia,
                    );
                    self.emitter.emit(RoomcallEvent::TrackSubscribed {
                        participant_sid: participant.sid,
                        track,
                    });
                }

                RoomEvent::TrackUnsubscribed { track, participant } => {
                    self.activity.log(format!(
                        "Unsubscribed from {}'s track: {}",
                        participant.identity, track.kind
                    ));
                    detach_tracks(self.surface.as_ref(), std::slice::from_ref(&track));
                    self.emitter.emit(RoomcallEvent::TrackUnsubscribed {
                        participant_sid: participant.sid,
                        track,
                    });
                }

                RoomEvent::ParticipantDisconnected(participant) => {
                    self.activity.log(format!(
                        "RemoteParticipant '{}' left the room",
                        participant.identity
                    ));
                    detach_participant_tracks(self.surface.as_ref(), &participant);
                    self.participants
                        .lock()
                        .await
                        .remove_participant(&participant.sid);
                    self.emitter.emit(RoomcallEvent::ParticipantLeft(participant));
                }

                RoomEvent::Disconnected => {
                    self.teardown(&room).await;
                    tracing::info!("room event loop ended");
                    return;
                }
            }
        }

        tracing::warn!("room event stream closed without a disconnect");
        self.teardown(&room).await;
    }

    /// Detach every participant, stop the preview and return to idle.
    /// The status flips last.
    async fn teardown(&self, room: &Arc<dyn SdkRoom>) {
        let active = self.room_slot.lock().await.clone();
        if !active.is_some_and(|active| Arc::ptr_eq(&active, room)) {
            tracing::warn!("room '{}' is no longer active, skipping teardown", room.name());
            return;
        }

        self.activity.log("Left");
        self.preview.release().await;

        let surface = self.surface.as_ref();
        detach_participant_tracks(surface, &room.local_participant());
        for participant in room.participants() {
            detach_participant_tracks(surface, &participant);
        }

        self.participants.lock().await.clear();
        *self.room_slot.lock().await = None;
        set_status(&self.status, &self.emitter, SessionStatus::Idle);
    }
}
