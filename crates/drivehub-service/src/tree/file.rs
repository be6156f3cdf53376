//! File upload, lookup, relocation, deletion, and signed links.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::{ContentDisposition, ObjectMetadata, SignedUrlOptions};
use drivehub_core::types::{PageRequest, PageResponse};
use drivehub_entity::file::normalize_tags;
use drivehub_entity::{File, FileId, Namespace, ParentRef};

use crate::context::RequestContext;
use crate::stores::{DriveStores, require_namespace, require_namespace_id, require_user};
use crate::tree::listing;
use crate::tree::outcome::{ConsistencyOutcome, FileDeletion, Relocation};
use crate::tree::relocation::{location_patch, relocate_object};
use crate::tree::validate_name;

/// Input for uploading a file.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Namespace the file is stored in.
    pub namespace: Namespace,
    /// Containing folder, or root.
    pub parent_id: ParentRef,
    /// File name.
    pub name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Declared size in bytes; must match `content`.
    pub size: u64,
    /// File content.
    pub content: Bytes,
    /// Free-form labels.
    pub tags: Vec<String>,
}

/// A time-limited URL for reading a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    /// The signed URL.
    pub url: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
    /// The file it points at.
    pub file: File,
}

/// Manages files.
#[derive(Debug, Clone)]
pub struct FileService {
    stores: Arc<DriveStores>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(stores: Arc<DriveStores>) -> Self {
        Self { stores }
    }

    /// Uploads a file: content first, then the metadata record.
    pub async fn upload_file(&self, ctx: &RequestContext, req: NewFile) -> AppResult<File> {
        let owner_id = require_user(ctx)?;
        let namespace = require_namespace(&req.namespace)?;
        let name = validate_name(&req.name)?;
        let mime_type = req.mime_type.trim().to_ascii_lowercase();
        self.check_upload(&mime_type, req.size, req.content.len())?;

        let parent_path = self
            .stores
            .parent_path(owner_id, &namespace.id, &req.parent_id)
            .await?;
        self.stores
            .ensure_name_free(owner_id, &namespace.id, &req.parent_id, &name, None)
            .await?;

        let storage_key = self
            .stores
            .resolver
            .resolve_file_key(owner_id, &namespace, &parent_path, &name)?;
        let now = Utc::now();
        let file = File {
            id: FileId::new(),
            name,
            parent_id: req.parent_id,
            path: parent_path,
            storage_key,
            mime_type,
            size: req.size,
            namespace_id: namespace.id.clone(),
            namespace_name: namespace.name.clone(),
            owner_id: owner_id.to_string(),
            tags: normalize_tags(req.tags),
            created_at: now,
            updated_at: now,
        };

        let metadata = ObjectMetadata::from([
            ("fileId".to_string(), file.id.to_string()),
            ("ownerId".to_string(), file.owner_id.clone()),
            ("namespaceId".to_string(), file.namespace_id.clone()),
            ("originalName".to_string(), file.name.clone()),
        ]);
        self.stores
            .objects
            .put(
                self.stores.bucket(),
                &file.storage_key,
                req.content,
                &file.mime_type,
                &metadata,
            )
            .await
            .map_err(|e| e.into_unavailable("Failed to store file content"))?;

        if let Err(e) = self.stores.items.save(&file.clone().into()).await {
            if let Err(cleanup) = self
                .stores
                .objects
                .delete(self.stores.bucket(), &file.storage_key)
                .await
            {
                warn!(
                    key = %file.storage_key,
                    error = %cleanup,
                    "Compensating delete failed; object is orphaned"
                );
            }
            return Err(e.into_unavailable("Failed to save file record"));
        }

        info!(
            user_id = %owner_id,
            file_id = %file.id,
            path = %file.logical_path(),
            size = file.size,
            "File uploaded"
        );
        Ok(file)
    }

    fn check_upload(&self, mime_type: &str, size: u64, actual: usize) -> AppResult<()> {
        let config = &self.stores.config;
        if mime_type.is_empty() {
            return Err(AppError::validation("mimeType is required"));
        }
        if !config.allows_mime_type(mime_type) {
            return Err(AppError::validation(format!(
                "MIME type '{mime_type}' is not allowed"
            )));
        }
        if size > config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                config.max_upload_size_bytes
            )));
        }
        if size != actual as u64 {
            return Err(AppError::validation(format!(
                "Declared size {size} does not match content length {actual}"
            )));
        }
        Ok(())
    }

    /// Gets a file owned by the caller.
    pub async fn get_file(&self, ctx: &RequestContext, id: &FileId) -> AppResult<Option<File>> {
        let owner_id = require_user(ctx)?;
        self.stores.owned_file(owner_id, id).await
    }

    /// Lists the files directly under `parent`.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        namespace_id: &str,
        parent: &ParentRef,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let owner_id = require_user(ctx)?;
        let namespace_id = require_namespace_id(namespace_id)?;
        listing::files_page(&self.stores, owner_id, namespace_id, parent, page).await
    }

    /// Reads a file's content.
    pub async fn read_file_content(
        &self,
        ctx: &RequestContext,
        id: &FileId,
    ) -> AppResult<(File, Bytes)> {
        let owner_id = require_user(ctx)?;
        let file = self.require_file(owner_id, id).await?;
        let data = self
            .stores
            .objects
            .get(self.stores.bucket(), &file.storage_key)
            .await
            .map_err(|e| e.into_unavailable("Failed to read file content"))?;
        Ok((file, data))
    }

    /// Renames a file in place.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        id: &FileId,
        new_name: &str,
    ) -> AppResult<Relocation<File>> {
        let owner_id = require_user(ctx)?;
        let name = validate_name(new_name)?;
        let file = self.require_file(owner_id, id).await?;
        let parent = file.parent_id.clone();
        self.relocate(file, name, parent).await
    }

    /// Moves a file under `new_parent`.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        id: &FileId,
        new_parent: &ParentRef,
    ) -> AppResult<Relocation<File>> {
        let owner_id = require_user(ctx)?;
        let file = self.require_file(owner_id, id).await?;
        if &file.parent_id == new_parent {
            let path = file.logical_path();
            return Ok(Relocation {
                entity: file,
                old_path: path.clone(),
                new_path: path,
                descendants_updated: 0,
                outcome: ConsistencyOutcome::clean(),
            });
        }
        let name = file.name.clone();
        self.relocate(file, name, new_parent.clone()).await
    }

    async fn relocate(
        &self,
        file: File,
        name: String,
        parent: ParentRef,
    ) -> AppResult<Relocation<File>> {
        let owner_id = file.owner_id.clone();
        let namespace = file.namespace();
        let parent_path = self
            .stores
            .parent_path(&owner_id, &namespace.id, &parent)
            .await?;
        self.stores
            .ensure_name_free(&owner_id, &namespace.id, &parent, &name, Some(file.id.as_str()))
            .await?;
        let new_key = self
            .stores
            .resolver
            .resolve_file_key(&owner_id, &namespace, &parent_path, &name)?;

        let mut patch = location_patch(&parent_path, &new_key);
        patch.insert("name".into(), json!(name));
        patch.insert("parentId".into(), json!(parent));
        let updated = self
            .stores
            .items
            .update(file.id.as_str(), patch)
            .await
            .map_err(|e| e.into_unavailable("Failed to update file"))?
            .into_file()
            .ok_or_else(|| AppError::internal(format!("Record {} is not a file", file.id)))?;

        let mut outcome = ConsistencyOutcome::clean();
        relocate_object(&self.stores, &file.storage_key, &new_key, &mut outcome).await;

        let old_path = file.logical_path();
        let new_path = updated.logical_path();
        info!(
            user_id = %owner_id,
            file_id = %updated.id,
            old_path = %old_path,
            new_path = %new_path,
            consistent = outcome.is_consistent(),
            "File relocated"
        );
        Ok(Relocation {
            entity: updated,
            old_path,
            new_path,
            descendants_updated: 0,
            outcome,
        })
    }

    /// Deletes a file's content, then its record.
    pub async fn delete_file(&self, ctx: &RequestContext, id: &FileId) -> AppResult<FileDeletion> {
        let owner_id = require_user(ctx)?;
        let file = self.require_file(owner_id, id).await?;
        let mut outcome = ConsistencyOutcome::clean();
        remove_file(&self.stores, &file, &mut outcome).await?;
        info!(
            user_id = %owner_id,
            file_id = %file.id,
            path = %file.logical_path(),
            consistent = outcome.is_consistent(),
            "File deleted"
        );
        Ok(FileDeletion {
            file_id: file.id.clone(),
            path: file.logical_path(),
            outcome,
        })
    }

    /// Signed URL that downloads the file as an attachment.
    pub async fn download_link(
        &self,
        ctx: &RequestContext,
        id: &FileId,
    ) -> AppResult<DownloadLink> {
        let owner_id = require_user(ctx)?;
        let file = self.require_file(owner_id, id).await?;
        let disposition = ContentDisposition::Attachment(file.name.clone());
        signed_link(&self.stores, file, disposition).await
    }

    /// Signed URL that renders the file inline.
    pub async fn preview_link(&self, ctx: &RequestContext, id: &FileId) -> AppResult<DownloadLink> {
        let owner_id = require_user(ctx)?;
        let file = self.require_file(owner_id, id).await?;
        signed_link(&self.stores, file, ContentDisposition::Inline).await
    }

    async fn require_file(&self, owner_id: &str, id: &FileId) -> AppResult<File> {
        self.stores
            .owned_file(owner_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }
}

/// Delete a file's object (tolerated) and then its record.
pub(crate) async fn remove_file(
    stores: &DriveStores,
    file: &File,
    outcome: &mut ConsistencyOutcome,
) -> AppResult<()> {
    if let Err(e) = stores.objects.delete(stores.bucket(), &file.storage_key).await {
        warn!(
            file_id = %file.id,
            key = %file.storage_key,
            error = %e,
            "Failed to delete file content"
        );
        outcome.content_failed(format!(
            "Failed to delete content of '{}': {}",
            file.logical_path(),
            e.message
        ));
    }
    stores
        .items
        .delete(file.id.as_str())
        .await
        .map_err(|e| e.into_unavailable("Failed to delete file record"))
}

/// Issue a signed URL for `file` with the configured lifetime.
pub(crate) async fn signed_link(
    stores: &DriveStores,
    file: File,
    disposition: ContentDisposition,
) -> AppResult<DownloadLink> {
    let expires_in = stores.config.signed_url_expiry_seconds;
    let options = SignedUrlOptions {
        disposition,
        content_type: Some(file.mime_type.clone()),
        expiry_seconds: expires_in,
    };
    let url = stores
        .objects
        .signed_url(stores.bucket(), &file.storage_key, &options)
        .await
        .map_err(|e| e.into_unavailable("Failed to sign URL"))?;
    let expires_at = i64::try_from(expires_in)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| AppError::configuration("signed_url_expiry_seconds is out of range"))?;
    Ok(DownloadLink {
        url,
        expires_in,
        expires_at,
        file,
    })
}
