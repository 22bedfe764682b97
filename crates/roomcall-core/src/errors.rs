use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoomcallError {
    #[error("room name is required")]
    MissingRoomName,
    #[error("already connected to a room")]
    AlreadyConnected,
    #[error("not connected to a room")]
    NotConnected,
    #[error("permission request failed: {0}")]
    Permission(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("local media unavailable: {0}")]
    Media(String),
    #[error("connection failed: {0}")]
    Connection(String),
}
