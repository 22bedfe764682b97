//! Attach and detach track handles to the native rendering surface.

use crate::events::{Participant, Track};

/// Rendering containers exposed by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    LocalMedia,
    RemoteMedia,
}

impl Container {
    pub fn element_id(self) -> &'static str {
        match self {
            Container::LocalMedia => "local-media",
            Container::RemoteMedia => "remote-media",
        }
    }
}

/// Native view hierarchy that renders tracks.
pub trait MediaSurface: Send + Sync {
    /// Render `track` as a new element inside `container`.
    fn attach(&self, container: Container, track: &Track);

    /// Remove every element rendering `track`. Returns how many were removed.
    fn detach(&self, track: &Track) -> usize;

    /// Whether `container` already holds a video element.
    fn has_video(&self, container: Container) -> bool;
}

pub fn attach_tracks(surface: &dyn MediaSurface, tracks: &[Track], container: Container) {
    for track in tracks {
        tracing::debug!(
            "attaching {} track {} to #{}",
            track.kind,
            track.sid,
            container.element_id()
        );
        surface.attach(container, track);
    }
}

pub fn detach_tracks(surface: &dyn MediaSurface, tracks: &[Track]) -> usize {
    tracks.iter().map(|track| surface.detach(track)).sum()
}

/// Tracks of `participant` whose publication has a live underlying track.
pub fn live_tracks(participant: &Participant) -> Vec<Track> {
    participant
        .publications
        .iter()
        .filter_map(|publication| publication.track.clone())
        .collect()
}

pub fn attach_participant_tracks(
    surface: &dyn MediaSurface,
    participant: &Participant,
    container: Container,
) {
    attach_tracks(surface, &live_tracks(participant), container);
}

pub fn detach_participant_tracks(surface: &dyn MediaSurface, participant: &Participant) -> usize {
    detach_tracks(surface, &live_tracks(participant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{TrackKind, TrackPublication};
    use crate::testing::{FakeSurface, participant, track};

    #[test]
    fn container_ids() {
        assert_eq!(Container::LocalMedia.element_id(), "local-media");
        assert_eq!(Container::RemoteMedia.element_id(), "remote-media");
    }

    #[test]
    fn live_tracks_skips_pending_publications() {
        let mut p = participant("p1", "bob");
        p.publications.push(TrackPublication {
            sid: "pending".to_string(),
            kind: TrackKind::Video,
            track: None,
        });

        let tracks = live_tracks(&p);
        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.sid != "pending"));
    }

    #[test]
    fn attach_then_detach_participant() {
        let surface = FakeSurface::default();
        let p = participant("p1", "bob");

        attach_participant_tracks(&surface, &p, Container::RemoteMedia);
        assert_eq!(surface.rendered(Container::RemoteMedia).len(), 2);
        assert!(surface.has_video(Container::RemoteMedia));
        assert!(!surface.has_video(Container::LocalMedia));

        assert_eq!(detach_participant_tracks(&surface, &p), 2);
        assert!(surface.rendered(Container::RemoteMedia).is_empty());
    }

    #[test]
    fn detach_unknown_track_removes_nothing() {
        let surface = FakeSurface::default();
        assert_eq!(detach_tracks(&surface, &[track("nope", TrackKind::Audio)]), 0);
    }
}
