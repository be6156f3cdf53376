//! Share record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ShareId;
use crate::item::ItemKind;
use crate::share::permission::PermissionSet;

/// What a share points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    /// A single file.
    File,
    /// A folder.
    Folder,
}

impl From<ItemKind> for ShareType {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::File => Self::File,
            ItemKind::Folder => Self::Folder,
        }
    }
}

/// Lifecycle state of a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    /// The share grants access (subject to expiry).
    Active,
    /// The owner revoked the share. Terminal.
    Revoked,
}

/// Why a share cannot be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareUnusable {
    /// Status is `revoked`.
    Revoked,
    /// `expires_at` is in the past.
    Expired,
}

/// A grant of time-boxed, permission-scoped access to another user's
/// file or folder. Never transfers ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecord {
    /// Unique share identifier.
    pub id: ShareId,
    /// Kind of the shared entity.
    #[serde(rename = "type")]
    pub share_type: ShareType,
    /// Id of the shared file or folder.
    pub original_id: String,
    /// Owner of the shared entity.
    pub original_owner_id: String,
    /// The grantee.
    pub shared_with_user_id: String,
    /// Granted capabilities; never empty.
    pub permissions: PermissionSet,
    /// When access ends; `None` means never.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Lifecycle state.
    pub status: ShareStatus,
    /// Entity name at share time.
    pub original_name: String,
    /// Entity logical path at share time.
    pub original_path: String,
    /// File MIME type at share time (files only).
    #[serde(default)]
    pub original_mime_type: Option<String>,
    /// File size at share time (files only).
    #[serde(default)]
    pub original_size: Option<u64>,
    /// Storage key at share time.
    #[serde(rename = "originalS3Key")]
    pub original_s3_key: String,
    /// Optional note from the owner to the grantee.
    #[serde(default)]
    pub message: Option<String>,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
    /// When permissions or status last changed.
    pub updated_at: DateTime<Utc>,
    /// When the share was revoked.
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ShareRecord {
    /// Whether the share has passed its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    /// Whether the share is active.
    pub fn is_active(&self) -> bool {
        self.status == ShareStatus::Active
    }

    /// Check usability at `now`: revocation wins over expiry.
    pub fn usability_at(&self, now: DateTime<Utc>) -> Result<(), ShareUnusable> {
        if !self.is_active() {
            return Err(ShareUnusable::Revoked);
        }
        if self.is_expired_at(now) {
            return Err(ShareUnusable::Expired);
        }
        Ok(())
    }

    /// Whether the share can be used at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.usability_at(now).is_ok()
    }
}
