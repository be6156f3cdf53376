//! Folder CRUD, cascading rename/move, and recursive delete.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::ObjectMetadata;
use drivehub_core::types::{PageRequest, PageResponse};
use drivehub_entity::{DriveItem, Folder, FolderId, ItemKind, Namespace, ParentRef};

use crate::context::RequestContext;
use crate::path::{child_path, folder_marker_key};
use crate::stores::{DriveStores, require_namespace, require_namespace_id, require_user};
use crate::tree::file::remove_file;
use crate::tree::listing;
use crate::tree::outcome::{ChildFailure, ConsistencyOutcome, FolderDeletion, Relocation};
use crate::tree::relocation::{location_patch, relocate_descendants, relocate_object};
use crate::tree::validate_name;

/// Content type of folder marker objects.
const MARKER_CONTENT_TYPE: &str = "application/x-directory";

/// Input for creating a folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Namespace the folder is created in.
    pub namespace: Namespace,
    /// Parent folder, or root.
    pub parent_id: ParentRef,
    /// Folder name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Manages folders and their subtrees.
#[derive(Debug, Clone)]
pub struct FolderService {
    stores: Arc<DriveStores>,
}

/// Step of the post-order delete walk.
enum DeleteStep {
    Enter(Folder),
    Exit(Folder),
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(stores: Arc<DriveStores>) -> Self {
        Self { stores }
    }

    /// Creates a folder: marker object first, then the metadata record.
    pub async fn create_folder(&self, ctx: &RequestContext, req: NewFolder) -> AppResult<Folder> {
        let owner_id = require_user(ctx)?;
        let namespace = require_namespace(&req.namespace)?;
        let name = validate_name(&req.name)?;

        let parent_path = self
            .stores
            .parent_path(owner_id, &namespace.id, &req.parent_id)
            .await?;
        self.stores
            .ensure_name_free(owner_id, &namespace.id, &req.parent_id, &name, None)
            .await?;

        let path = child_path(&parent_path, &name);
        let storage_key = self
            .stores
            .resolver
            .resolve_folder_key(owner_id, &namespace, &path)?;
        let now = Utc::now();
        let folder = Folder {
            id: FolderId::new(),
            name,
            parent_id: req.parent_id,
            path,
            storage_key,
            description: req
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            namespace_id: namespace.id.clone(),
            namespace_name: namespace.name.clone(),
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        let marker = folder_marker_key(&folder.storage_key);
        let metadata = ObjectMetadata::from([
            ("folderId".to_string(), folder.id.to_string()),
            ("ownerId".to_string(), folder.owner_id.clone()),
            ("namespaceId".to_string(), folder.namespace_id.clone()),
        ]);
        self.stores
            .objects
            .put(
                self.stores.bucket(),
                &marker,
                Bytes::new(),
                MARKER_CONTENT_TYPE,
                &metadata,
            )
            .await
            .map_err(|e| e.into_unavailable("Failed to write folder marker"))?;

        if let Err(e) = self.stores.items.save(&folder.clone().into()).await {
            if let Err(cleanup) = self.stores.objects.delete(self.stores.bucket(), &marker).await {
                warn!(key = %marker, error = %cleanup, "Failed to remove marker of unsaved folder");
            }
            return Err(e.into_unavailable("Failed to save folder"));
        }

        info!(
            user_id = %owner_id,
            folder_id = %folder.id,
            path = %folder.path,
            namespace_id = %folder.namespace_id,
            "Folder created"
        );
        Ok(folder)
    }

    /// Gets a folder owned by the caller.
    pub async fn get_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
    ) -> AppResult<Option<Folder>> {
        let owner_id = require_user(ctx)?;
        self.stores.owned_folder(owner_id, id).await
    }

    /// Lists the folders directly under `parent`.
    pub async fn list_folders(
        &self,
        ctx: &RequestContext,
        namespace_id: &str,
        parent: &ParentRef,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Folder>> {
        let owner_id = require_user(ctx)?;
        let namespace_id = require_namespace_id(namespace_id)?;
        listing::folders_page(&self.stores, owner_id, namespace_id, parent, page).await
    }

    /// Lists folders then files directly under `parent`.
    pub async fn list_contents(
        &self,
        ctx: &RequestContext,
        namespace_id: &str,
        parent: &ParentRef,
        page: &PageRequest,
    ) -> AppResult<PageResponse<DriveItem>> {
        let owner_id = require_user(ctx)?;
        let namespace_id = require_namespace_id(namespace_id)?;
        listing::contents_page(&self.stores, owner_id, namespace_id, parent, page).await
    }

    /// Renames a folder and relocates its subtree.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
        new_name: &str,
    ) -> AppResult<Relocation<Folder>> {
        let owner_id = require_user(ctx)?;
        let name = validate_name(new_name)?;
        let folder = self.require_folder(owner_id, id).await?;
        let parent = folder.parent_id.clone();
        self.relocate(folder, name, parent).await
    }

    /// Moves a folder under `new_parent` and relocates its subtree.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
        new_parent: &ParentRef,
    ) -> AppResult<Relocation<Folder>> {
        let owner_id = require_user(ctx)?;
        if new_parent.folder_id() == Some(id) {
            return Err(AppError::validation("A folder cannot be moved into itself"));
        }

        let folder = self.require_folder(owner_id, id).await?;
        if &folder.parent_id == new_parent {
            let path = folder.path.clone();
            return Ok(Relocation {
                entity: folder,
                old_path: path.clone(),
                new_path: path,
                descendants_updated: 0,
                outcome: ConsistencyOutcome::clean(),
            });
        }

        if let ParentRef::Folder(dest_id) = new_parent {
            let dest = self
                .stores
                .owned_folder(owner_id, dest_id)
                .await?
                .filter(|d| d.namespace_id == folder.namespace_id)
                .ok_or_else(|| {
                    AppError::not_found(format!("Destination folder {dest_id} not found"))
                })?;
            self.ensure_not_descendant(&folder, &dest).await?;
        }

        let name = folder.name.clone();
        self.relocate(folder, name, new_parent.clone()).await
    }

    /// Fails unless walking up from `dest` reaches root without meeting
    /// `moving`. Any gap in the chain fails the move.
    async fn ensure_not_descendant(&self, moving: &Folder, dest: &Folder) -> AppResult<()> {
        let max_depth = self.stores.config.max_tree_depth;
        let mut current = dest.clone();
        for _ in 0..=max_depth {
            if current.id == moving.id {
                return Err(AppError::validation(format!(
                    "Cannot move '{}' into its own subfolder '{}'",
                    moving.path, dest.path
                )));
            }
            let parent_id = match &current.parent_id {
                ParentRef::Root => return Ok(()),
                ParentRef::Folder(parent_id) => parent_id.clone(),
            };
            let parent = self.stores.items.find_folder(&parent_id).await.map_err(|e| {
                AppError::service_unavailable(format!(
                    "Could not verify ancestors of '{}': {}",
                    dest.path, e.message
                ))
            })?;
            current = parent
                .filter(|p| p.owner_id == moving.owner_id && p.namespace_id == moving.namespace_id)
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "Ancestor chain of '{}' is broken at {parent_id}",
                        dest.path
                    ))
                })?;
        }
        Err(AppError::validation(format!(
            "Ancestor chain of '{}' exceeds {max_depth} levels",
            dest.path
        )))
    }

    async fn require_folder(&self, owner_id: &str, id: &FolderId) -> AppResult<Folder> {
        self.stores
            .owned_folder(owner_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    /// Rewrite the folder record, then relocate its marker and subtree.
    async fn relocate(
        &self,
        folder: Folder,
        name: String,
        parent: ParentRef,
    ) -> AppResult<Relocation<Folder>> {
        let owner_id = folder.owner_id.clone();
        let namespace = folder.namespace();
        let parent_path = self
            .stores
            .parent_path(&owner_id, &namespace.id, &parent)
            .await?;
        self.stores
            .ensure_name_free(&owner_id, &namespace.id, &parent, &name, Some(folder.id.as_str()))
            .await?;

        let new_path = child_path(&parent_path, &name);
        let new_key = self
            .stores
            .resolver
            .resolve_folder_key(&owner_id, &namespace, &new_path)?;

        let mut patch = location_patch(&new_path, &new_key);
        patch.insert("name".into(), json!(name));
        patch.insert("parentId".into(), json!(parent));
        let updated = self
            .stores
            .items
            .update(folder.id.as_str(), patch)
            .await
            .map_err(|e| e.into_unavailable("Failed to update folder"))?
            .into_folder()
            .ok_or_else(|| AppError::internal(format!("Record {} is not a folder", folder.id)))?;

        let mut outcome = ConsistencyOutcome::clean();
        relocate_object(
            &self.stores,
            &folder_marker_key(&folder.storage_key),
            &folder_marker_key(&new_key),
            &mut outcome,
        )
        .await;
        let descendants_updated = if folder.path == new_path {
            0
        } else {
            relocate_descendants(&self.stores, &updated, &folder.path, &mut outcome).await
        };

        info!(
            user_id = %owner_id,
            folder_id = %updated.id,
            old_path = %folder.path,
            new_path = %updated.path,
            descendants = descendants_updated,
            consistent = outcome.is_consistent(),
            "Folder relocated"
        );

        Ok(Relocation {
            entity: updated,
            old_path: folder.path,
            new_path,
            descendants_updated,
            outcome,
        })
    }

    /// Deletes a folder and everything under it, children before parents.
    ///
    /// A member that cannot be deleted blocks every folder above it, so the
    /// report may come back with `deleted = false`; use
    /// [`FolderDeletion::into_result`] to turn that into an error.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        id: &FolderId,
    ) -> AppResult<FolderDeletion> {
        let owner_id = require_user(ctx)?;
        let root = self.require_folder(owner_id, id).await?;
        let scoped = self.stores.scoped_items(owner_id, &root.namespace_id).await?;

        let mut children: HashMap<String, Vec<DriveItem>> = HashMap::new();
        for item in scoped {
            if let Some(parent) = item.parent_id().folder_id() {
                children.entry(parent.to_string()).or_default().push(item);
            }
        }

        let mut report = FolderDeletion {
            folder_id: root.id.clone(),
            path: root.path.clone(),
            deleted: false,
            files_deleted: 0,
            folders_deleted: 0,
            failures: Vec::new(),
            outcome: ConsistencyOutcome::clean(),
        };
        let mut parents: HashMap<String, String> = HashMap::new();
        let mut blocked: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![DeleteStep::Enter(root.clone())];

        while let Some(step) = stack.pop() {
            match step {
                DeleteStep::Enter(folder) => {
                    if !visited.insert(folder.id.to_string()) {
                        continue;
                    }
                    let mut subfolders = Vec::new();
                    for item in children.remove(folder.id.as_str()).unwrap_or_default() {
                        match item {
                            DriveItem::File(file) => {
                                match remove_file(&self.stores, &file, &mut report.outcome).await {
                                    Ok(()) => report.files_deleted += 1,
                                    Err(e) => {
                                        report.failures.push(ChildFailure::new(
                                            file.id.as_str(),
                                            ItemKind::File,
                                            &file.logical_path(),
                                            &e,
                                        ));
                                        block_ancestors(&mut blocked, &parents, folder.id.as_str());
                                    }
                                }
                            }
                            DriveItem::Folder(sub) => subfolders.push(sub),
                        }
                    }
                    stack.push(DeleteStep::Exit(folder.clone()));
                    subfolders.sort_by(|a, b| b.name.cmp(&a.name));
                    for sub in subfolders {
                        parents.insert(sub.id.to_string(), folder.id.to_string());
                        stack.push(DeleteStep::Enter(sub));
                    }
                }
                DeleteStep::Exit(folder) => {
                    if blocked.contains(folder.id.as_str()) {
                        continue;
                    }
                    match self.remove_folder_record(&folder, &mut report.outcome).await {
                        Ok(()) => {
                            report.folders_deleted += 1;
                            if folder.id == root.id {
                                report.deleted = true;
                            }
                        }
                        Err(e) => {
                            report.failures.push(ChildFailure::new(
                                folder.id.as_str(),
                                ItemKind::Folder,
                                &folder.path,
                                &e,
                            ));
                            block_ancestors(&mut blocked, &parents, folder.id.as_str());
                        }
                    }
                }
            }
        }

        if report.deleted {
            info!(
                user_id = %owner_id,
                folder_id = %root.id,
                path = %root.path,
                files = report.files_deleted,
                folders = report.folders_deleted,
                "Folder deleted"
            );
        } else {
            warn!(
                user_id = %owner_id,
                folder_id = %root.id,
                failures = report.failures.len(),
                "Folder delete blocked by failed members"
            );
        }
        Ok(report)
    }

    /// Delete a folder's marker (tolerated) and then its record.
    async fn remove_folder_record(
        &self,
        folder: &Folder,
        outcome: &mut ConsistencyOutcome,
    ) -> AppResult<()> {
        let marker = folder_marker_key(&folder.storage_key);
        if let Err(e) = self.stores.objects.delete(self.stores.bucket(), &marker).await {
            warn!(key = %marker, error = %e, "Failed to delete folder marker");
            outcome.content_failed(format!("Failed to delete marker '{marker}': {}", e.message));
        }
        self.stores
            .items
            .delete(folder.id.as_str())
            .await
            .map_err(|e| e.into_unavailable("Failed to delete folder record"))
    }
}

/// Mark `folder_id` and every ancestor inside the delete subtree as blocked.
fn block_ancestors(
    blocked: &mut HashSet<String>,
    parents: &HashMap<String, String>,
    folder_id: &str,
) {
    let mut current = Some(folder_id.to_string());
    while let Some(id) = current {
        if !blocked.insert(id.clone()) {
            break;
        }
        current = parents.get(&id).cloned();
    }
}
