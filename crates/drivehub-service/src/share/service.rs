//! Share CRUD service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, json};
use tracing::info;

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::types::{PageRequest, PageResponse};
use drivehub_entity::{
    FileId, FolderId, PermissionSet, ShareId, ShareRecord, ShareStatus, ShareType,
};

use crate::context::RequestContext;
use crate::stores::{DriveStores, require_user};

/// Request to share a file or folder with another user.
#[derive(Debug, Clone)]
pub struct NewShare {
    /// The grantee.
    pub shared_with_user_id: String,
    /// Granted permissions; must not be empty.
    pub permissions: PermissionSet,
    /// When the grant stops working, if ever.
    pub expires_at: Option<DateTime<Utc>>,
    /// Note shown to the grantee.
    pub message: Option<String>,
}

/// Descriptive fields copied from the shared entity.
struct Snapshot {
    share_type: ShareType,
    original_id: String,
    name: String,
    path: String,
    mime_type: Option<String>,
    size: Option<u64>,
    storage_key: String,
}

/// Manages share creation, listing, and revocation.
#[derive(Debug, Clone)]
pub struct ShareService {
    stores: Arc<DriveStores>,
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(stores: Arc<DriveStores>) -> Self {
        Self { stores }
    }

    /// Shares a file the caller owns.
    pub async fn share_file(
        &self,
        ctx: &RequestContext,
        file_id: &FileId,
        req: NewShare,
    ) -> AppResult<ShareRecord> {
        let owner_id = require_user(ctx)?;
        let grantee = validate_grant(owner_id, &req)?;
        let file = self
            .stores
            .owned_file(owner_id, file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        let snapshot = Snapshot {
            share_type: ShareType::File,
            original_id: file.id.to_string(),
            path: file.logical_path(),
            name: file.name,
            mime_type: Some(file.mime_type),
            size: Some(file.size),
            storage_key: file.storage_key,
        };
        self.create(ctx, owner_id, grantee, req, snapshot).await
    }

    /// Shares a folder the caller owns.
    pub async fn share_folder(
        &self,
        ctx: &RequestContext,
        folder_id: &FolderId,
        req: NewShare,
    ) -> AppResult<ShareRecord> {
        let owner_id = require_user(ctx)?;
        let grantee = validate_grant(owner_id, &req)?;
        let folder = self
            .stores
            .owned_folder(owner_id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        let snapshot = Snapshot {
            share_type: ShareType::Folder,
            original_id: folder.id.to_string(),
            name: folder.name,
            path: folder.path,
            mime_type: None,
            size: None,
            storage_key: folder.storage_key,
        };
        self.create(ctx, owner_id, grantee, req, snapshot).await
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        grantee: String,
        req: NewShare,
        snapshot: Snapshot,
    ) -> AppResult<ShareRecord> {
        let now = ctx.request_time;
        let share = ShareRecord {
            id: ShareId::new(),
            share_type: snapshot.share_type,
            original_id: snapshot.original_id,
            original_owner_id: owner_id.to_string(),
            shared_with_user_id: grantee,
            permissions: req.permissions,
            expires_at: req.expires_at,
            status: ShareStatus::Active,
            original_name: snapshot.name,
            original_path: snapshot.path,
            original_mime_type: snapshot.mime_type,
            original_size: snapshot.size,
            original_s3_key: snapshot.storage_key,
            message: req
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            created_at: now,
            updated_at: now,
            revoked_at: None,
        };

        self.stores
            .shares
            .create(&share)
            .await
            .map_err(|e| e.into_unavailable("Failed to save share"))?;

        info!(
            user_id = %owner_id,
            share_id = %share.id,
            original_id = %share.original_id,
            grantee = %share.shared_with_user_id,
            "Share created"
        );
        Ok(share)
    }

    /// Active, unexpired shares granted to the caller.
    pub async fn shared_with_me(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ShareRecord>> {
        let user_id = require_user(ctx)?;
        let now = ctx.request_time;
        let shares: Vec<ShareRecord> = self
            .stores
            .shares
            .find_by_grantee(user_id)
            .await
            .map_err(|e| e.into_unavailable("Failed to list shares"))?
            .into_iter()
            .filter(|s| s.is_usable_at(now))
            .collect();
        PageResponse::paginate(shares, page)
    }

    /// Active shares the caller created, expired ones included.
    pub async fn shared_by_me(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ShareRecord>> {
        let user_id = require_user(ctx)?;
        let shares: Vec<ShareRecord> = self
            .stores
            .shares
            .find_by_owner(user_id)
            .await
            .map_err(|e| e.into_unavailable("Failed to list shares"))?
            .into_iter()
            .filter(ShareRecord::is_active)
            .collect();
        PageResponse::paginate(shares, page)
    }

    /// A share visible to the caller as its owner or grantee.
    pub async fn get_share(
        &self,
        ctx: &RequestContext,
        id: &ShareId,
    ) -> AppResult<Option<ShareRecord>> {
        let user_id = require_user(ctx)?;
        let share = self.load(id).await?;
        Ok(share.filter(|s| s.original_owner_id == user_id || s.shared_with_user_id == user_id))
    }

    /// Replaces the permissions of an active share.
    pub async fn update_share_permissions(
        &self,
        ctx: &RequestContext,
        id: &ShareId,
        permissions: PermissionSet,
    ) -> AppResult<ShareRecord> {
        let user_id = require_user(ctx)?;
        if permissions.is_empty() {
            return Err(AppError::validation("At least one permission is required"));
        }
        let share = self.require_owned(user_id, id).await?;
        if !share.is_active() {
            return Err(AppError::gone(format!("Share {id} has been revoked")));
        }

        let mut patch = Map::new();
        patch.insert("permissions".into(), json!(permissions));
        patch.insert("updatedAt".into(), json!(ctx.request_time));
        let updated = self
            .stores
            .shares
            .update(id, patch)
            .await
            .map_err(|e| e.into_unavailable("Failed to update share"))?;

        info!(user_id = %user_id, share_id = %id, "Share permissions updated");
        Ok(updated)
    }

    /// Revokes a share. Revoking twice returns the record unchanged.
    pub async fn revoke_share(&self, ctx: &RequestContext, id: &ShareId) -> AppResult<ShareRecord> {
        let user_id = require_user(ctx)?;
        let share = self.require_owned(user_id, id).await?;
        if !share.is_active() {
            return Ok(share);
        }

        let now = ctx.request_time;
        let mut patch = Map::new();
        patch.insert("status".into(), json!(ShareStatus::Revoked));
        patch.insert("revokedAt".into(), json!(now));
        patch.insert("updatedAt".into(), json!(now));
        let revoked = self
            .stores
            .shares
            .update(id, patch)
            .await
            .map_err(|e| e.into_unavailable("Failed to revoke share"))?;

        info!(user_id = %user_id, share_id = %id, "Share revoked");
        Ok(revoked)
    }

    async fn load(&self, id: &ShareId) -> AppResult<Option<ShareRecord>> {
        self.stores
            .shares
            .find_by_id(id)
            .await
            .map_err(|e| e.into_unavailable("Failed to load share"))
    }

    async fn require_owned(&self, user_id: &str, id: &ShareId) -> AppResult<ShareRecord> {
        let share = self
            .load(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Share {id} not found")))?;
        if share.original_owner_id != user_id {
            return Err(AppError::authorization("Only the share owner can modify it"));
        }
        Ok(share)
    }
}

/// Check the grantee and permissions; returns the trimmed grantee.
fn validate_grant(owner_id: &str, req: &NewShare) -> AppResult<String> {
    let grantee = req.shared_with_user_id.trim();
    if grantee.is_empty() {
        return Err(AppError::validation("sharedWithUserId is required"));
    }
    if grantee == owner_id {
        return Err(AppError::validation("Cannot share with yourself"));
    }
    if req.permissions.is_empty() {
        return Err(AppError::validation("At least one permission is required"));
    }
    Ok(grantee.to_string())
}
