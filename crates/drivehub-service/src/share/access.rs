//! Share access control: resolves a grantee's share into the live entity.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::ContentDisposition;
use drivehub_entity::{
    DriveItem, File, FileId, Folder, FolderId, ParentRef, SharePermission, ShareId, ShareRecord,
    ShareType, ShareUnusable,
};

use crate::context::RequestContext;
use crate::stores::{DriveStores, require_user};
use crate::tree::file::signed_link;
use crate::tree::listing;

/// What a grantee gets when opening a share.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SharedContent {
    /// A shared file with a short-lived download URL.
    File {
        /// The owner's current file record.
        file: File,
        /// Signed URL for the owner's storage key.
        download_url: String,
        /// URL lifetime in seconds.
        expires_in: u64,
    },
    /// A shared folder with its direct contents.
    Folder {
        /// The owner's current folder record.
        folder: Folder,
        /// Folders then files directly inside.
        contents: Vec<DriveItem>,
    },
}

/// Validates share access and fetches the shared entity.
#[derive(Debug, Clone)]
pub struct AccessService {
    stores: Arc<DriveStores>,
}

impl AccessService {
    /// Creates a new access service.
    pub fn new(stores: Arc<DriveStores>) -> Self {
        Self { stores }
    }

    /// Opens a share on behalf of its grantee.
    pub async fn resolve_shared_content(
        &self,
        ctx: &RequestContext,
        share_id: &ShareId,
    ) -> AppResult<SharedContent> {
        let user_id = require_user(ctx)?;
        let share = self
            .stores
            .shares
            .find_by_id(share_id)
            .await
            .map_err(|e| e.into_unavailable("Failed to load share"))?
            .ok_or_else(|| AppError::not_found(format!("Share {share_id} not found")))?;

        check_access(&share, user_id, ctx)?;
        debug!(user_id = %user_id, share_id = %share.id, "Share access granted");

        let owner_id = share.original_owner_id.as_str();
        match share.share_type {
            ShareType::File => {
                let file = match FileId::parse(&share.original_id) {
                    Ok(id) => self.stores.owned_file(owner_id, &id).await?,
                    Err(_) => None,
                }
                .ok_or_else(|| gone_original(&share))?;
                let disposition = ContentDisposition::Attachment(file.name.clone());
                let link = signed_link(&self.stores, file, disposition).await?;
                Ok(SharedContent::File {
                    file: link.file,
                    download_url: link.url,
                    expires_in: link.expires_in,
                })
            }
            ShareType::Folder => {
                let folder = match FolderId::parse(&share.original_id) {
                    Ok(id) => self.stores.owned_folder(owner_id, &id).await?,
                    Err(_) => None,
                }
                .ok_or_else(|| gone_original(&share))?;
                let contents = listing::sorted_children(
                    &self.stores,
                    owner_id,
                    &folder.namespace_id,
                    &ParentRef::Folder(folder.id.clone()),
                )
                .await?;
                Ok(SharedContent::Folder { folder, contents })
            }
        }
    }
}

/// Grantee, then status, then expiry, then read permission.
fn check_access(share: &ShareRecord, user_id: &str, ctx: &RequestContext) -> AppResult<()> {
    if share.shared_with_user_id != user_id {
        return Err(AppError::authorization("This share was not granted to you"));
    }
    match share.usability_at(ctx.request_time) {
        Ok(()) => {}
        Err(ShareUnusable::Revoked) => {
            return Err(AppError::gone(format!("Share {} has been revoked", share.id)));
        }
        Err(ShareUnusable::Expired) => {
            return Err(AppError::gone(format!("Share {} has expired", share.id)));
        }
    }
    if !share.permissions.allows(SharePermission::Read) {
        return Err(AppError::authorization("Share does not grant read access"));
    }
    Ok(())
}

fn gone_original(share: &ShareRecord) -> AppError {
    AppError::not_found(format!(
        "Shared {} '{}' no longer exists",
        match share.share_type {
            ShareType::File => "file",
            ShareType::Folder => "folder",
        },
        share.original_name
    ))
}
