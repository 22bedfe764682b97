use async_trait::async_trait;

use crate::errors::RoomcallError;

/// Permissions needed before touching local media.
pub const MEDIA_PERMISSIONS: [Permission; 2] = [Permission::Camera, Permission::RecordAudio];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    RecordAudio,
}

impl Permission {
    /// Identifier understood by the platform permission API.
    pub fn platform_id(self) -> &'static str {
        match self {
            Permission::Camera => "android.permission.CAMERA",
            Permission::RecordAudio => "android.permission.RECORD_AUDIO",
        }
    }
}

/// Runtime permission request.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn request(&self, permissions: &[Permission]) -> Result<(), RoomcallError>;
}

/// Gate for platforms without runtime permissions.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrantAll;

#[async_trait]
impl PermissionGate for GrantAll {
    async fn request(&self, permissions: &[Permission]) -> Result<(), RoomcallError> {
        tracing::debug!("granting {} permissions without prompt", permissions.len());
        Ok(())
    }
}
