use std::sync::Arc;

use tokio::sync::Mutex;

use crate::activity::ActivityLog;
use crate::errors::RoomcallError;
use crate::events::{EventEmitter, RoomcallEvent, Track};
use crate::media::{Container, MediaSurface, attach_tracks};
use crate::permissions::{MEDIA_PERMISSIONS, PermissionGate};
use crate::sdk::VideoSdk;

/// Local camera/microphone preview shown before joining.
///
/// Tracks are acquired once and shared with every later join attempt
/// until the room disconnects and [`PreviewController::release`] runs.
pub struct PreviewController {
    sdk: Arc<dyn VideoSdk>,
    permissions: Arc<dyn PermissionGate>,
    surface: Arc<dyn MediaSurface>,
    activity: ActivityLog,
    emitter: EventEmitter,
    tracks: Mutex<Option<Arc<[Track]>>>,
}

impl PreviewController {
    pub fn new(
        sdk: Arc<dyn VideoSdk>,
        permissions: Arc<dyn PermissionGate>,
        surface: Arc<dyn MediaSurface>,
        activity: ActivityLog,
        emitter: EventEmitter,
    ) -> Self {
        Self {
            sdk,
            permissions,
            surface,
            activity,
            emitter,
            tracks: Mutex::new(None),
        }
    }

    /// Acquire local tracks if needed and render them into `local-media`.
    pub async fn start(&self) -> Result<Arc<[Track]>, RoomcallError> {
        self.permissions.request(&MEDIA_PERMISSIONS).await?;
        let tracks = self.local_tracks().await?;

        if !self.surface.has_video(Container::LocalMedia) {
            attach_tracks(self.surface.as_ref(), &tracks, Container::LocalMedia);
            self.emitter.emit(RoomcallEvent::PreviewStarted(tracks.to_vec()));
        } else {
            tracing::debug!("preview already rendered, skipping attach");
        }

        Ok(tracks)
    }

    /// Tracks acquired by a previous [`start`](Self::start), if any.
    pub async fn cached_tracks(&self) -> Option<Arc<[Track]>> {
        self.tracks.lock().await.clone()
    }

    /// Stop the preview tracks and forget them. Returns how many were stopped.
    pub async fn release(&self) -> usize {
        let Some(tracks) = self.tracks.lock().await.take() else {
            return 0;
        };
        for track in tracks.iter() {
            self.sdk.stop_track(track);
        }
        tracing::info!("stopped {} preview tracks", tracks.len());
        tracks.len()
    }

    async fn local_tracks(&self) -> Result<Arc<[Track]>, RoomcallError> {
        let mut slot = self.tracks.lock().await;
        if let Some(tracks) = slot.as_ref() {
            return Ok(tracks.clone());
        }

        match self.sdk.create_local_tracks().await {
            Ok(tracks) => {
                let tracks: Arc<[Track]> = tracks.into();
                *slot = Some(tracks.clone());
                Ok(tracks)
            }
            Err(e) => {
                tracing::error!("Unable to access local media: {e}");
                self.activity.log("Unable to access Camera and Microphone");
                Err(RoomcallError::Media(e.message))
            }
        }
    }
}
