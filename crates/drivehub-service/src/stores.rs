//! Shared store handles and ownership-scoped lookups used by every service.

use std::sync::Arc;

use drivehub_core::config::{DriveConfig, MetadataConfig};
use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::MetadataStore;
use drivehub_core::traits::storage::ObjectStore;
use drivehub_entity::{DriveItem, File, FileId, Folder, FolderId, Namespace, ParentRef};
use drivehub_metadata::{DriveItemRepository, ShareRepository};

use crate::context::RequestContext;
use crate::path::PathResolver;

/// Store handles plus immutable drive configuration.
///
/// Services hold this behind an `Arc`; nothing in it is mutable, so one
/// instance is shared by every request.
#[derive(Debug, Clone)]
pub struct DriveStores {
    /// File and folder records.
    pub items: DriveItemRepository,
    /// Share records.
    pub shares: ShareRepository,
    /// Content objects.
    pub objects: Arc<dyn ObjectStore>,
    /// Storage key derivation.
    pub resolver: PathResolver,
    /// Drive settings.
    pub config: DriveConfig,
}

impl DriveStores {
    /// Wire the stores for the configured tables and drive root.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        drive: DriveConfig,
        tables: &MetadataConfig,
    ) -> Self {
        let page = drive.scan_page_size;
        Self {
            items: DriveItemRepository::new(metadata.clone(), &tables.files_table, page),
            shares: ShareRepository::new(metadata, &tables.shares_table, page),
            objects,
            resolver: PathResolver::new(&drive.root),
            config: drive,
        }
    }

    /// Bucket holding drive content.
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// A file owned by `owner_id`, or `None` (also when someone else owns it).
    pub async fn owned_file(&self, owner_id: &str, id: &FileId) -> AppResult<Option<File>> {
        let file = self
            .items
            .find_file(id)
            .await
            .map_err(|e| e.into_unavailable("Failed to load file"))?;
        Ok(file.filter(|f| f.owner_id == owner_id))
    }

    /// A folder owned by `owner_id`, or `None` (also when someone else owns it).
    pub async fn owned_folder(&self, owner_id: &str, id: &FolderId) -> AppResult<Option<Folder>> {
        let folder = self
            .items
            .find_folder(id)
            .await
            .map_err(|e| e.into_unavailable("Failed to load folder"))?;
        Ok(folder.filter(|f| f.owner_id == owner_id))
    }

    /// Resolve `parent` to the logical path new children get under it.
    ///
    /// Non-root parents must be folders owned by `owner_id` in `namespace_id`.
    pub async fn parent_path(
        &self,
        owner_id: &str,
        namespace_id: &str,
        parent: &ParentRef,
    ) -> AppResult<String> {
        match parent {
            ParentRef::Root => Ok(String::new()),
            ParentRef::Folder(id) => self
                .owned_folder(owner_id, id)
                .await?
                .filter(|f| f.namespace_id == namespace_id)
                .map(|f| f.path)
                .ok_or_else(|| AppError::not_found(format!("Parent folder {id} not found"))),
        }
    }

    /// Fail when `parent` already holds an entry called `name`.
    pub async fn ensure_name_free(
        &self,
        owner_id: &str,
        namespace_id: &str,
        parent: &ParentRef,
        name: &str,
        ignore_id: Option<&str>,
    ) -> AppResult<()> {
        let siblings = self
            .items
            .find_children(owner_id, namespace_id, parent)
            .await
            .map_err(|e| e.into_unavailable("Failed to list siblings"))?;
        let taken = siblings
            .iter()
            .any(|item| item.name() == name && Some(item.id()) != ignore_id);
        if taken {
            return Err(AppError::validation(format!(
                "An item named '{name}' already exists in this folder"
            )));
        }
        Ok(())
    }

    /// Every record `owner_id` owns in `namespace_id`.
    pub async fn scoped_items(
        &self,
        owner_id: &str,
        namespace_id: &str,
    ) -> AppResult<Vec<DriveItem>> {
        self.items
            .find_scoped(owner_id, namespace_id)
            .await
            .map_err(|e| e.into_unavailable("Failed to scan drive records"))
    }
}

/// Reject requests without a caller identity.
pub(crate) fn require_user(ctx: &RequestContext) -> AppResult<&str> {
    let user_id = ctx.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("ownerId is required"));
    }
    Ok(user_id)
}

/// Reject incomplete namespaces before any I/O; returns the trimmed value.
pub(crate) fn require_namespace(namespace: &Namespace) -> AppResult<Namespace> {
    if namespace.id.trim().is_empty() {
        return Err(AppError::validation("namespace.id is required"));
    }
    if namespace.name.trim().is_empty() {
        return Err(AppError::validation("namespace.name is required"));
    }
    Ok(Namespace::new(namespace.id.trim(), namespace.name.trim()))
}

/// Reject a missing namespace filter.
pub(crate) fn require_namespace_id(namespace_id: &str) -> AppResult<&str> {
    let namespace_id = namespace_id.trim();
    if namespace_id.is_empty() {
        return Err(AppError::validation("namespaceId is required"));
    }
    Ok(namespace_id)
}
