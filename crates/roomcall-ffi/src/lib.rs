//! UniFFI bindings for roomcall-core.
//!
//! Provides a RoomcallClient object that wraps RoomManager into a single
//! FFI-safe interface. The native shell implements [`PlatformBridge`] to
//! give the core access to the video SDK, runtime permissions and the
//! view hierarchy.

use std::sync::Arc;

use roomcall_core::{
    self as core_, ActivityEntry as CoreActivityEntry, Container as CoreContainer,
    ConnectOptions as CoreConnectOptions, Participant as CoreParticipant,
    Permission as CorePermission, RoomEvent as CoreRoomEvent, RoomcallEvent as CoreRoomcallEvent,
    SdkLogLevel as CoreSdkLogLevel, SessionStatus as CoreSessionStatus, Track as CoreTrack,
    TrackKind as CoreTrackKind, TrackPublication as CoreTrackPublication,
};

mod bridge;

use bridge::{BridgePermissions, BridgeSdk, BridgeSurface, EventSlot};

uniffi::setup_scaffolding!();

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before using RoomcallClient.
/// On Android, stderr goes to logcat for debuggable builds.
#[uniffi::export]
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new("roomcall_core=debug,roomcall_ffi=debug")
                    }),
            )
            .with_ansi(false)
            .init();
    });
}

// ── FFI-safe type conversions ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum SessionStatus {
    Idle,
    InRoom,
}

impl From<CoreSessionStatus> for SessionStatus {
    fn from(s: CoreSessionStatus) -> Self {
        match s {
            CoreSessionStatus::Idle => Self::Idle,
            CoreSessionStatus::InRoom => Self::InRoom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Visibility {
    pub join_visible: bool,
    pub leave_visible: bool,
}

impl From<core_::Visibility> for Visibility {
    fn from(v: core_::Visibility) -> Self {
        Self {
            join_visible: v.join_visible,
            leave_visible: v.leave_visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum TrackKind {
    Audio,
    Video,
}

impl From<CoreTrackKind> for TrackKind {
    fn from(k: CoreTrackKind) -> Self {
        match k {
            CoreTrackKind::Audio => Self::Audio,
            CoreTrackKind::Video => Self::Video,
        }
    }
}

impl From<TrackKind> for CoreTrackKind {
    fn from(k: TrackKind) -> Self {
        match k {
            TrackKind::Audio => Self::Audio,
            TrackKind::Video => Self::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Track {
    pub sid: String,
    pub kind: TrackKind,
    pub name: String,
}

impl From<CoreTrack> for Track {
    fn from(t: CoreTrack) -> Self {
        Self {
            sid: t.sid,
            kind: t.kind.into(),
            name: t.name,
        }
    }
}

impl From<Track> for CoreTrack {
    fn from(t: Track) -> Self {
        Self {
            sid: t.sid,
            kind: t.kind.into(),
            name: t.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct TrackPublication {
    pub sid: String,
    pub kind: TrackKind,
    pub track: Option<Track>,
}

impl From<CoreTrackPublication> for TrackPublication {
    fn from(p: CoreTrackPublication) -> Self {
        Self {
            sid: p.sid,
            kind: p.kind.into(),
            track: p.track.map(Track::from),
        }
    }
}

impl From<TrackPublication> for CoreTrackPublication {
    fn from(p: TrackPublication) -> Self {
        Self {
            sid: p.sid,
            kind: p.kind.into(),
            track: p.track.map(CoreTrack::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Participant {
    pub sid: String,
    pub identity: String,
    pub publications: Vec<TrackPublication>,
}

impl From<CoreParticipant> for Participant {
    fn from(p: CoreParticipant) -> Self {
        Self {
            sid: p.sid,
            identity: p.identity,
            publications: p.publications.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Participant> for CoreParticipant {
    fn from(p: Participant) -> Self {
        Self {
            sid: p.sid,
            identity: p.identity,
            publications: p.publications.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ActivityEntry {
    pub timestamp_ms: i64,
    pub message: String,
}

impl From<CoreActivityEntry> for ActivityEntry {
    fn from(e: CoreActivityEntry) -> Self {
        Self {
            timestamp_ms: e.timestamp.timestamp_millis(),
            message: e.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum Permission {
    Camera,
    RecordAudio,
}

impl From<CorePermission> for Permission {
    fn from(p: CorePermission) -> Self {
        match p {
            CorePermission::Camera => Self::Camera,
            CorePermission::RecordAudio => Self::RecordAudio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum Container {
    LocalMedia,
    RemoteMedia,
}

impl From<CoreContainer> for Container {
    fn from(c: CoreContainer) -> Self {
        match c {
            CoreContainer::LocalMedia => Self::LocalMedia,
            CoreContainer::RemoteMedia => Self::RemoteMedia,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum SdkLogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<CoreSdkLogLevel> for SdkLogLevel {
    fn from(l: CoreSdkLogLevel) -> Self {
        match l {
            CoreSdkLogLevel::Debug => Self::Debug,
            CoreSdkLogLevel::Info => Self::Info,
            CoreSdkLogLevel::Warn => Self::Warn,
            CoreSdkLogLevel::Error => Self::Error,
            CoreSdkLogLevel::Off => Self::Off,
        }
    }
}

impl From<SdkLogLevel> for CoreSdkLogLevel {
    fn from(l: SdkLogLevel) -> Self {
        match l {
            SdkLogLevel::Debug => Self::Debug,
            SdkLogLevel::Info => Self::Info,
            SdkLogLevel::Warn => Self::Warn,
            SdkLogLevel::Error => Self::Error,
            SdkLogLevel::Off => Self::Off,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ConnectOptions {
    pub name: String,
    pub log_level: SdkLogLevel,
    pub tracks: Option<Vec<Track>>,
}

impl From<CoreConnectOptions> for ConnectOptions {
    fn from(o: CoreConnectOptions) -> Self {
        Self {
            name: o.name,
            log_level: o.log_level.into(),
            tracks: o
                .tracks
                .map(|tracks| tracks.iter().cloned().map(Track::from).collect()),
        }
    }
}

/// Room events reported by the native SDK glue.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum RoomEvent {
    ParticipantConnected { participant: Participant },
    ParticipantDisconnected { participant: Participant },
    TrackSubscribed { track: Track, participant: Participant },
    TrackUnsubscribed { track: Track, participant: Participant },
    Disconnected,
}

impl From<RoomEvent> for CoreRoomEvent {
    fn from(e: RoomEvent) -> Self {
        match e {
            RoomEvent::ParticipantConnected { participant } => {
                Self::ParticipantConnected(participant.into())
            }
            RoomEvent::ParticipantDisconnected { participant } => {
                Self::ParticipantDisconnected(participant.into())
            }
            RoomEvent::TrackSubscribed { track, participant } => Self::TrackSubscribed {
                track: track.into(),
                participant: participant.into(),
            },
            RoomEvent::TrackUnsubscribed { track, participant } => Self::TrackUnsubscribed {
                track: track.into(),
                participant: participant.into(),
            },
            RoomEvent::Disconnected => Self::Disconnected,
        }
    }
}

#[derive(Debug, Clone, uniffi::Enum)]
pub enum RoomcallEvent {
    StatusChanged { status: SessionStatus },
    ActivityLogged { entry: ActivityEntry },
    Alert { message: String },
    PreviewStarted { tracks: Vec<Track> },
    ParticipantJoined { participant: Participant },
    ParticipantLeft { participant: Participant },
    TrackSubscribed { participant_sid: String, track: Track },
    TrackUnsubscribed { participant_sid: String, track: Track },
}

impl From<CoreRoomcallEvent> for RoomcallEvent {
    fn from(e: CoreRoomcallEvent) -> Self {
        match e {
            CoreRoomcallEvent::StatusChanged(s) => Self::StatusChanged { status: s.into() },
            CoreRoomcallEvent::ActivityLogged(entry) => Self::ActivityLogged {
                entry: entry.into(),
            },
            CoreRoomcallEvent::Alert(message) => Self::Alert { message },
            CoreRoomcallEvent::PreviewStarted(tracks) => Self::PreviewStarted {
                tracks: tracks.into_iter().map(Track::from).collect(),
            },
            CoreRoomcallEvent::ParticipantJoined(p) => Self::ParticipantJoined {
                participant: p.into(),
            },
            CoreRoomcallEvent::ParticipantLeft(p) => Self::ParticipantLeft {
                participant: p.into(),
            },
            CoreRoomcallEvent::TrackSubscribed {
                participant_sid,
                track,
            } => Self::TrackSubscribed {
                participant_sid,
                track: track.into(),
            },
            CoreRoomcallEvent::TrackUnsubscribed {
                participant_sid,
                track,
            } => Self::TrackUnsubscribed {
                participant_sid,
                track: track.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Settings {
    pub backend_url: String,
    pub sdk_log_level: SdkLogLevel,
    pub last_room_name: Option<String>,
}

impl From<core_::Settings> for Settings {
    fn from(s: core_::Settings) -> Self {
        Self {
            backend_url: s.backend_url,
            sdk_log_level: s.sdk_log_level.into(),
            last_room_name: s.last_room_name,
        }
    }
}

// ── Error conversion ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RoomcallError {
    #[error("Room name is required")]
    MissingRoomName,
    #[error("Already connected to a room")]
    AlreadyConnected,
    #[error("Not connected to a room")]
    NotConnected,
    #[error("Permission error: {msg}")]
    Permission { msg: String },
    #[error("HTTP error: {msg}")]
    Http { msg: String },
    #[error("Auth error: {msg}")]
    Auth { msg: String },
    #[error("Invalid URL: {msg}")]
    InvalidUrl { msg: String },
    #[error("Media error: {msg}")]
    Media { msg: String },
    #[error("Connection error: {msg}")]
    Connection { msg: String },
    #[error("Internal error: {msg}")]
    Internal { msg: String },
}

impl From<core_::RoomcallError> for RoomcallError {
    fn from(e: core_::RoomcallError) -> Self {
        tracing::error!("RoomcallError: {e}");
        match e {
            core_::RoomcallError::MissingRoomName => Self::MissingRoomName,
            core_::RoomcallError::AlreadyConnected => Self::AlreadyConnected,
            core_::RoomcallError::NotConnected => Self::NotConnected,
            core_::RoomcallError::Permission(msg) => Self::Permission { msg },
            core_::RoomcallError::Http(msg) => Self::Http { msg },
            core_::RoomcallError::Auth(msg) => Self::Auth { msg },
            core_::RoomcallError::InvalidUrl(msg) => Self::InvalidUrl { msg },
            core_::RoomcallError::Media(msg) => Self::Media { msg },
            core_::RoomcallError::Connection(msg) => Self::Connection { msg },
        }
    }
}

/// Failure reported by the native side of [`PlatformBridge`].
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum BridgeError {
    #[error("{msg}")]
    Failed { msg: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for BridgeError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Failed { msg: e.reason }
    }
}

// ── Foreign interfaces ────────────────────────────────────────────────

/// Implemented by the native shell. Blocking calls are made off the
/// async runtime threads.
#[uniffi::export(with_foreign)]
pub trait PlatformBridge: Send + Sync {
    fn request_permissions(&self, permissions: Vec<Permission>) -> Result<(), BridgeError>;
    fn create_local_tracks(&self) -> Result<Vec<Track>, BridgeError>;
    fn stop_track(&self, track: Track);
    /// Connect the SDK. Room events go to [`RoomcallClient::deliver_room_event`].
    fn connect(&self, token: String, options: ConnectOptions) -> Result<(), BridgeError>;
    fn disconnect(&self);
    fn local_participant(&self) -> Participant;
    fn remote_participants(&self) -> Vec<Participant>;
    fn attach(&self, container: Container, track: Track);
    fn detach(&self, track: Track) -> u32;
    fn has_video(&self, container: Container) -> bool;
}

#[uniffi::export(callback_interface)]
pub trait RoomcallEventListener: Send + Sync {
    fn on_event(&self, event: RoomcallEvent);
}

// ── Bridge listener: FFI callback → core listener ─────────────────────

struct BridgeListener {
    ffi_listener: Box<dyn RoomcallEventListener>,
}

impl core_::RoomcallEventListener for BridgeListener {
    fn on_event(&self, event: CoreRoomcallEvent) {
        self.ffi_listener.on_event(event.into());
    }
}

// ── RoomcallClient: main FFI object ───────────────────────────────────

#[derive(uniffi::Object)]
pub struct RoomcallClient {
    room_manager: core_::RoomManager,
    room_events: EventSlot,
    rt: tokio::runtime::Runtime,
}

#[uniffi::export]
impl RoomcallClient {
    #[uniffi::constructor]
    pub fn new(
        data_dir: String,
        bridge: Arc<dyn PlatformBridge>,
    ) -> Result<Arc<Self>, RoomcallError> {
        tracing::info!("RoomcallClient::new() data_dir={data_dir}");
        let rt = tokio::runtime::Runtime::new().map_err(|e| RoomcallError::Internal {
            msg: format!("failed to create tokio runtime: {e}"),
        })?;
        let settings = Arc::new(core_::SettingsStore::new(&data_dir));
        let room_events = EventSlot::default();

        let platform = core_::Platform {
            sdk: Arc::new(BridgeSdk::new(bridge.clone(), room_events.clone())),
            permissions: Arc::new(BridgePermissions::new(bridge.clone())),
            surface: Arc::new(BridgeSurface::new(bridge)),
        };
        let room_manager = core_::RoomManager::with_http_backend(platform, settings)?;

        Ok(Arc::new(Self {
            room_manager,
            room_events,
            rt,
        }))
    }

    /// Show the local camera/microphone preview.
    pub fn preview(&self) -> Result<Vec<Track>, RoomcallError> {
        self.guarded("preview", || {
            self.rt.block_on(async {
                let tracks = self
                    .room_manager
                    .start_preview()
                    .await
                    .map_err(RoomcallError::from)?;
                Ok::<_, RoomcallError>(tracks.iter().cloned().map(Track::from).collect())
            })
        })
    }

    pub fn join_room(&self, room_name: String) -> Result<(), RoomcallError> {
        self.guarded("join_room", || {
            self.rt
                .block_on(self.room_manager.join_room(&room_name))
                .map_err(RoomcallError::from)
        })
    }

    pub fn leave_room(&self) -> Result<(), RoomcallError> {
        self.rt
            .block_on(self.room_manager.leave_room())
            .map_err(RoomcallError::from)
    }

    /// Call when the host view is being destroyed.
    pub fn unload(&self) {
        self.room_manager.unload();
    }

    /// Feed an event raised by the native SDK into the active room.
    pub fn deliver_room_event(&self, event: RoomEvent) {
        self.room_events.deliver(event.into());
    }

    pub fn status(&self) -> SessionStatus {
        self.room_manager.status().into()
    }

    pub fn visibility(&self) -> Visibility {
        self.room_manager.visibility().into()
    }

    pub fn identity(&self) -> Option<String> {
        self.room_manager.identity()
    }

    pub fn activity_log(&self) -> Vec<ActivityEntry> {
        self.room_manager
            .activity_log()
            .into_iter()
            .map(ActivityEntry::from)
            .collect()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.rt
            .block_on(self.room_manager.participants())
            .into_iter()
            .map(Participant::from)
            .collect()
    }

    pub fn add_listener(&self, listener: Box<dyn RoomcallEventListener>) {
        let bridge = Arc::new(BridgeListener {
            ffi_listener: listener,
        });
        self.room_manager.add_listener(bridge);
    }

    pub fn get_settings(&self) -> Settings {
        self.room_manager.settings().get().into()
    }

    /// Persist a new backend URL. Used for credentials on the next launch.
    pub fn set_backend_url(&self, url: String) -> Result<(), RoomcallError> {
        core_::HttpTokenTransport::new(&url)?;
        self.room_manager.settings().set_backend_url(url);
        Ok(())
    }

    pub fn set_sdk_log_level(&self, level: SdkLogLevel) {
        self.room_manager.settings().set_sdk_log_level(level.into());
    }
}

impl RoomcallClient {
    /// Keep panics from unwinding across the FFI boundary.
    fn guarded<T>(
        &self,
        op: &str,
        f: impl FnOnce() -> Result<T, RoomcallError>,
    ) -> Result<T, RoomcallError> {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(panic_info) => {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::error!("{op}() panicked: {msg}");
                Err(RoomcallError::Internal {
                    msg: format!("panic in {op}: {msg}"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_ffi_errors() {
        assert!(matches!(
            RoomcallError::from(core_::RoomcallError::MissingRoomName),
            RoomcallError::MissingRoomName
        ));
        match RoomcallError::from(core_::RoomcallError::Connection("network error".into())) {
            RoomcallError::Connection { msg } => assert_eq!(msg, "network error"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn room_event_converts_to_core() {
        let participant = Participant {
            sid: "p1".to_string(),
            identity: "bob".to_string(),
            publications: vec![TrackPublication {
                sid: "pub1".to_string(),
                kind: TrackKind::Audio,
                track: Some(Track {
                    sid: "t1".to_string(),
                    kind: TrackKind::Audio,
                    name: "mic".to_string(),
                }),
            }],
        };

        match CoreRoomEvent::from(RoomEvent::ParticipantConnected { participant }) {
            CoreRoomEvent::ParticipantConnected(p) => {
                assert_eq!(p.identity, "bob");
                assert_eq!(p.publications[0].track.as_ref().unwrap().kind, CoreTrackKind::Audio);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            CoreRoomEvent::from(RoomEvent::Disconnected),
            CoreRoomEvent::Disconnected
        ));
    }

    #[test]
    fn connect_options_flatten_tracks() {
        let tracks: Arc<[CoreTrack]> = vec![CoreTrack {
            sid: "t1".to_string(),
            kind: CoreTrackKind::Video,
            name: "camera".to_string(),
        }]
        .into();
        let options = ConnectOptions::from(CoreConnectOptions {
            name: "test-room".to_string(),
            log_level: CoreSdkLogLevel::Debug,
            tracks: Some(tracks),
        });
        assert_eq!(options.name, "test-room");
        assert_eq!(options.log_level, SdkLogLevel::Debug);
        assert_eq!(options.tracks.unwrap()[0].sid, "t1");
    }

    #[test]
    fn status_event_converts() {
        match RoomcallEvent::from(CoreRoomcallEvent::StatusChanged(CoreSessionStatus::InRoom)) {
            RoomcallEvent::StatusChanged { status } => assert_eq!(status, SessionStatus::InRoom),
            other => panic!("unexpected {other:?}"),
        }
    }
}
