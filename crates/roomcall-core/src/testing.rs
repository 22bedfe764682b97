//! In-memory stand-ins for the SDK, platform and backend used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::auth::{Credentials, TokenTransport};
use crate::errors::RoomcallError;
use crate::events::{
    Participant, RoomcallEvent, RoomcallEventListener, Track, TrackKind, TrackPublication,
};
use crate::media::{Container, MediaSurface};
use crate::permissions::{Permission, PermissionGate};
use crate::sdk::{ConnectOptions, RoomEvent, SdkError, SdkRoom, VideoSdk};

pub fn track(sid: &str, kind: TrackKind) -> Track {
    Track {
        sid: sid.to_string(),
        kind,
        name: format!("{kind}-{sid}"),
    }
}

/// Participant publishing one live audio and one live video track.
pub fn participant(sid: &str, identity: &str) -> Participant {
    let audio = track(&format!("{sid}-audio"), TrackKind::Audio);
    let video = track(&format!("{sid}-video"), TrackKind::Video);
    Participant {
        sid: sid.to_string(),
        identity: identity.to_string(),
        publications: [audio, video]
            .into_iter()
            .map(|t| TrackPublication {
                sid: format!("pub-{}", t.sid),
                kind: t.kind,
                track: Some(t),
            })
            .collect(),
    }
}

pub struct ChannelListener {
    tx: UnboundedSender<RoomcallEvent>,
}

impl ChannelListener {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<RoomcallEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl RoomcallEventListener for ChannelListener {
    fn on_event(&self, event: RoomcallEvent) {
        let _ = self.tx.send(event);
    }
}

pub struct FakeTransport {
    response: Result<Credentials, String>,
    calls: AtomicUsize,
}

impl FakeTransport {
    pub fn new(response: Result<Credentials, String>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn alice() -> Self {
        Self::new(Ok(Credentials {
            identity: "alice".to_string(),
            token: "tok123".to_string(),
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenTransport for FakeTransport {
    async fn fetch_credentials(&self) -> Result<Credentials, RoomcallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Suspend like a network round trip would.
        tokio::task::yield_now().await;
        self.response.clone().map_err(RoomcallError::Http)
    }
}

#[derive(Default)]
pub struct FakePermissions {
    pub deny: bool,
    /// Suspend once before answering, like a system dialog.
    pub prompt: bool,
    pub requests: Mutex<Vec<Vec<Permission>>>,
}

#[async_trait]
impl PermissionGate for FakePermissions {
    async fn request(&self, permissions: &[Permission]) -> Result<(), RoomcallError> {
        self.requests.lock().unwrap().push(permissions.to_vec());
        if self.prompt {
            tokio::task::yield_now().await;
        }
        if self.deny {
            Err(RoomcallError::Permission("denied".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Records rendered elements per container.
#[derive(Default)]
pub struct FakeSurface {
    elements: Mutex<HashMap<Container, Vec<Track>>>,
    detached: Mutex<Vec<String>>,
}

impl FakeSurface {
    pub fn rendered(&self, container: Container) -> Vec<Track> {
        self.elements
            .lock()
            .unwrap()
            .get(&container)
            .cloned()
            .unwrap_or_default()
    }

    pub fn detached(&self) -> Vec<String> {
        self.detached.lock().unwrap().clone()
    }
}

impl MediaSurface for FakeSurface {
    fn attach(&self, container: Container, track: &Track) {
        self.elements
            .lock()
            .unwrap()
            .entry(container)
            .or_default()
            .push(track.clone());
    }

    fn detach(&self, track: &Track) -> usize {
        self.detached.lock().unwrap().push(track.sid.clone());
        let mut elements = self.elements.lock().unwrap();
        let mut removed = 0;
        for rendered in elements.values_mut() {
            let before = rendered.len();
            rendered.retain(|t| t.sid != track.sid);
            removed += before - rendered.len();
        }
        removed
    }

    fn has_video(&self, container: Container) -> bool {
        self.elements
            .lock()
            .unwrap()
            .get(&container)
            .is_some_and(|tracks| tracks.iter().any(|t| t.kind == TrackKind::Video))
    }
}

pub struct FakeRoom {
    name: String,
    local: Participant,
    remote: Mutex<Vec<Participant>>,
    events: Mutex<Option<UnboundedSender<RoomEvent>>>,
    disconnects: AtomicUsize,
}

impl FakeRoom {
    /// Simulate the SDK raising an event.
    pub fn raise(&self, event: RoomEvent) {
        match &event {
            RoomEvent::ParticipantConnected(p) => self.remote.lock().unwrap().push(p.clone()),
            RoomEvent::ParticipantDisconnected(p) => {
                self.remote.lock().unwrap().retain(|r| r.sid != p.sid)
            }
            _ => {}
        }
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Drop the event sender without raising `Disconnected`.
    pub fn close_events(&self) {
        self.events.lock().unwrap().take();
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl SdkRoom for FakeRoom {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn local_participant(&self) -> Participant {
        self.local.clone()
    }

    fn participants(&self) -> Vec<Participant> {
        self.remote.lock().unwrap().clone()
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeSdk {
    pub fail_tracks: AtomicBool,
    pub connect_error: Mutex<Option<String>>,
    /// Remote participants already present when connecting.
    pub existing: Mutex<Vec<Participant>>,
    pub track_requests: AtomicUsize,
    pub connects: Mutex<Vec<(String, ConnectOptions)>>,
    pub stopped: Mutex<Vec<String>>,
    pub room: Mutex<Option<Arc<FakeRoom>>>,
}


impl FakeSdk {
    pub fn last_room(&self) -> Arc<FakeRoom> {
        self.room.lock().unwrap().clone().expect("no room connected")
    }

    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoSdk for FakeSdk {
    async fn create_local_tracks(&self) -> Result<Vec<Track>, SdkError> {
        self.track_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_tracks.load(Ordering::SeqCst) {
            return Err(SdkError::new("NotAllowedError"));
        }
        Ok(vec![
            track("local-audio", TrackKind::Audio),
            track("local-video", TrackKind::Video),
        ])
    }

    async fn connect(
        &self,
        token: &str,
        options: ConnectOptions,
    ) -> Result<(Arc<dyn SdkRoom>, UnboundedReceiver<RoomEvent>), SdkError> {
        self.connects
            .lock()
            .unwrap()
            .push((token.to_string(), options.clone()));
        if let Some(message) = self.connect_error.lock().unwrap().clone() {
            return Err(SdkError::new(message));
        }

        let local_tracks: Vec<Track> = match &options.tracks {
            Some(tracks) => tracks.to_vec(),
            None => vec![track("published-video", TrackKind::Video)],
        };
        let local = Participant {
            sid: "local".to_string(),
            identity: "alice".to_string(),
            publications: local_tracks
                .into_iter()
                .map(|t| TrackPublication {
                    sid: format!("pub-{}", t.sid),
                    kind: t.kind,
                    track: Some(t),
                })
                .collect(),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let room = Arc::new(FakeRoom {
            name: options.name.clone(),
            local,
            remote: Mutex::new(self.existing.lock().unwrap().clone()),
            events: Mutex::new(Some(tx)),
            disconnects: AtomicUsize::new(0),
        });
        *self.room.lock().unwrap() = Some(room.clone());
        Ok((room, rx))
    }

    fn stop_track(&self, track: &Track) {
        self.stopped.lock().unwrap().push(track.sid.clone());
    }
}
