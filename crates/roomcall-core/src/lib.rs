//! Roomcall core business logic.
//!
//! Pure Rust crate with no platform dependencies.
//! Consumed by native UI shells via UniFFI bindings.

pub mod activity;
pub mod auth;
pub mod errors;
pub mod events;
pub mod media;
pub mod participants;
pub mod permissions;
pub mod preview;
pub mod room;
pub mod sdk;
pub mod settings;

#[cfg(test)]
mod testing;

pub use activity::{ActivityEntry, ActivityLog};
pub use auth::{Credentials, HttpTokenTransport, TokenFetcher, TokenTransport};
pub use errors::RoomcallError;
pub use events::{
    Participant, RoomcallEvent, RoomcallEventListener, SessionStatus, Track, TrackKind,
    TrackPublication, Visibility,
};
pub use media::{Container, MediaSurface};
pub use permissions::{GrantAll, MEDIA_PERMISSIONS, Permission, PermissionGate};
pub use preview::PreviewController;
pub use room::{Platform, RoomManager};
pub use sdk::{ConnectOptions, RoomEvent, SdkError, SdkLogLevel, SdkRoom, VideoSdk};
pub use settings::{Settings, SettingsStore};
