//! The drive facade: one entry point composing every drive operation.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use drivehub_core::config::AppConfig;
use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::MetadataStore;
use drivehub_core::traits::storage::ObjectStore;
use drivehub_core::types::{PageRequest, PageResponse};
use drivehub_entity::{
    DriveItem, File, FileId, Folder, FolderId, FolderTree, ShareId, ShareRecord,
};

use crate::context::RequestContext;
use crate::facade::bootstrap::{DriveInitialization, initialize_drive_system};
use crate::facade::requests::{
    CreateFolderRequest, ListRequest, MoveRequest, RenameRequest, ShareRequest,
    UpdatePermissionsRequest, UploadFileRequest,
};
use crate::share::{AccessService, ShareService, SharedContent};
use crate::stores::DriveStores;
use crate::tree::{
    DownloadLink, FileDeletion, FileService, FolderDeletion, FolderService, Relocation, TreeService,
};

/// What the routing layer returns after an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// New file id.
    pub file_id: FileId,
    /// Key of the stored content.
    pub storage_key: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type.
    pub mime_type: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&File> for UploadResult {
    fn from(file: &File) -> Self {
        Self {
            file_id: file.id.clone(),
            storage_key: file.storage_key.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
            created_at: file.created_at,
        }
    }
}

/// What the routing layer returns after creating a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCreated {
    /// New folder id.
    pub folder_id: FolderId,
    /// Its logical path.
    pub path: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&Folder> for FolderCreated {
    fn from(folder: &Folder) -> Self {
        Self {
            folder_id: folder.id.clone(),
            path: folder.path.clone(),
            created_at: folder.created_at,
        }
    }
}

/// Composes the tree, sharing, and bootstrap services.
#[derive(Debug, Clone)]
pub struct DriveFacade {
    stores: Arc<DriveStores>,
    files: FileService,
    folders: FolderService,
    tree: TreeService,
    shares: ShareService,
    access: AccessService,
}

impl DriveFacade {
    /// Wire the facade over the two stores.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        config: &AppConfig,
    ) -> Self {
        let stores = DriveStores::new(metadata, objects, config.drive.clone(), &config.metadata);
        Self::from_stores(Arc::new(stores))
    }

    /// Wire the facade over prepared store handles.
    pub fn from_stores(stores: Arc<DriveStores>) -> Self {
        Self {
            files: FileService::new(stores.clone()),
            folders: FolderService::new(stores.clone()),
            tree: TreeService::new(stores.clone()),
            shares: ShareService::new(stores.clone()),
            access: AccessService::new(stores.clone()),
            stores,
        }
    }

    /// Shared store handles.
    pub fn stores(&self) -> &Arc<DriveStores> {
        &self.stores
    }

    /// Writes the drive root markers if missing.
    pub async fn initialize_drive_system(&self) -> AppResult<DriveInitialization> {
        initialize_drive_system(&self.stores).await
    }

    // -- Folders --

    /// Creates a folder.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<FolderCreated> {
        req.validate()?;
        let folder = self.folders.create_folder(ctx, req.into()).await?;
        Ok(FolderCreated::from(&folder))
    }

    /// Gets a folder.
    pub async fn get_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
    ) -> AppResult<Option<Folder>> {
        self.folders.get_folder(ctx, id).await
    }

    /// Lists subfolders.
    pub async fn list_folders(
        &self,
        ctx: &RequestContext,
        req: &ListRequest,
    ) -> AppResult<PageResponse<Folder>> {
        req.validate()?;
        self.folders
            .list_folders(ctx, &req.namespace_id, &req.parent(), &req.page())
            .await
    }

    /// Lists folders then files.
    pub async fn list_folder_contents(
        &self,
        ctx: &RequestContext,
        req: &ListRequest,
    ) -> AppResult<PageResponse<DriveItem>> {
        req.validate()?;
        self.folders
            .list_contents(ctx, &req.namespace_id, &req.parent(), &req.page())
            .await
    }

    /// Renames a folder and its subtree.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
        req: RenameRequest,
    ) -> AppResult<Relocation<Folder>> {
        req.validate()?;
        self.folders.rename_folder(ctx, id, &req.new_name).await
    }

    /// Moves a folder and its subtree.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
        req: &MoveRequest,
    ) -> AppResult<Relocation<Folder>> {
        self.folders.move_folder(ctx, id, &req.destination()).await
    }

    /// Deletes a folder recursively. A blocked delete comes back as a
    /// report with `deleted = false`.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
    ) -> AppResult<FolderDeletion> {
        self.folders.delete_folder(ctx, id).await
    }

    /// Nested folder tree of a namespace.
    pub async fn get_folder_tree(
        &self,
        ctx: &RequestContext,
        namespace_id: &str,
        root: Option<&FolderId>,
    ) -> AppResult<FolderTree> {
        self.tree.get_folder_tree(ctx, namespace_id, root).await
    }

    // -- Files --

    /// Uploads a file.
    pub async fn upload_file(
        &self,
        ctx: &RequestContext,
        req: UploadFileRequest,
    ) -> AppResult<UploadResult> {
        req.validate()?;
        let file = self.files.upload_file(ctx, req.into_new_file()?).await?;
        Ok(UploadResult::from(&file))
    }

    /// Gets a file.
    pub async fn get_file(&self, ctx: &RequestContext, id: &FileId) -> AppResult<Option<File>> {
        self.files.get_file(ctx, id).await
    }

    /// Lists files.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        req: &ListRequest,
    ) -> AppResult<PageResponse<File>> {
        req.validate()?;
        self.files
            .list_files(ctx, &req.namespace_id, &req.parent(), &req.page())
            .await
    }

    /// Reads a file's bytes.
    pub async fn read_file_content(
        &self,
        ctx: &RequestContext,
        id: &FileId,
    ) -> AppResult<(File, Bytes)> {
        self.files.read_file_content(ctx, id).await
    }

    /// Renames a file.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        id: &FileId,
        req: RenameRequest,
    ) -> AppResult<Relocation<File>> {
        req.validate()?;
        self.files.rename_file(ctx, id, &req.new_name).await
    }

    /// Moves a file.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        id: &FileId,
        req: &MoveRequest,
    ) -> AppResult<Relocation<File>> {
        self.files.move_file(ctx, id, &req.destination()).await
    }

    /// Deletes a file.
    pub async fn delete_file(&self, ctx: &RequestContext, id: &FileId) -> AppResult<FileDeletion> {
        self.files.delete_file(ctx, id).await
    }

    /// Signed attachment URL.
    pub async fn generate_download_url(
        &self,
        ctx: &RequestContext,
        id: &FileId,
    ) -> AppResult<DownloadLink> {
        self.files.download_link(ctx, id).await
    }

    /// Signed inline URL.
    pub async fn generate_preview_url(
        &self,
        ctx: &RequestContext,
        id: &FileId,
    ) -> AppResult<DownloadLink> {
        self.files.preview_link(ctx, id).await
    }

    // -- Sharing --

    /// Shares a file.
    pub async fn share_file(
        &self,
        ctx: &RequestContext,
        id: &FileId,
        req: ShareRequest,
    ) -> AppResult<ShareRecord> {
        req.validate()?;
        self.shares.share_file(ctx, id, req.into()).await
    }

    /// Shares a folder.
    pub async fn share_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
        req: ShareRequest,
    ) -> AppResult<ShareRecord> {
        req.validate()?;
        self.shares.share_folder(ctx, id, req.into()).await
    }

    /// Shares granted to the caller.
    pub async fn shared_with_me(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ShareRecord>> {
        self.shares.shared_with_me(ctx, page).await
    }

    /// Shares the caller created.
    pub async fn shared_by_me(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ShareRecord>> {
        self.shares.shared_by_me(ctx, page).await
    }

    /// A share visible to the caller.
    pub async fn get_share(
        &self,
        ctx: &RequestContext,
        id: &ShareId,
    ) -> AppResult<Option<ShareRecord>> {
        self.shares.get_share(ctx, id).await
    }

    /// Replaces a share's permissions.
    pub async fn update_share_permissions(
        &self,
        ctx: &RequestContext,
        id: &ShareId,
        req: UpdatePermissionsRequest,
    ) -> AppResult<ShareRecord> {
        req.validate()?;
        self.shares
            .update_share_permissions(ctx, id, req.permission_set())
            .await
    }

    /// Revokes a share.
    pub async fn revoke_share(&self, ctx: &RequestContext, id: &ShareId) -> AppResult<ShareRecord> {
        self.shares.revoke_share(ctx, id).await
    }

    /// Opens a share as its grantee.
    pub async fn resolve_shared_content(
        &self,
        ctx: &RequestContext,
        id: &ShareId,
    ) -> AppResult<SharedContent> {
        self.access.resolve_shared_content(ctx, id).await
    }
}
