//! Folder tree building.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_entity::{DriveItem, Folder, FolderId, FolderNode, FolderTree};

use crate::context::RequestContext;
use crate::stores::{DriveStores, require_namespace_id, require_user};

/// Builds nested folder trees.
#[derive(Debug, Clone)]
pub struct TreeService {
    stores: Arc<DriveStores>,
}

/// Flat view of one namespace, indexed by parent.
struct Index {
    folders: HashMap<Option<String>, Vec<Folder>>,
    file_counts: HashMap<Option<String>, u64>,
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(stores: Arc<DriveStores>) -> Self {
        Self { stores }
    }

    /// Builds the folder tree of a namespace, or of the subtree under `root`.
    pub async fn get_folder_tree(
        &self,
        ctx: &RequestContext,
        namespace_id: &str,
        root: Option<&FolderId>,
    ) -> AppResult<FolderTree> {
        let owner_id = require_user(ctx)?;
        let namespace_id = require_namespace_id(namespace_id)?;

        let top = match root {
            Some(id) => {
                let folder = self
                    .stores
                    .owned_folder(owner_id, id)
                    .await?
                    .filter(|f| f.namespace_id == namespace_id)
                    .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
                Some(folder)
            }
            None => None,
        };

        let mut index = Index {
            folders: HashMap::new(),
            file_counts: HashMap::new(),
        };
        for item in self.stores.scoped_items(owner_id, namespace_id).await? {
            let parent = item.parent_id().folder_id().map(|id| id.to_string());
            match item {
                DriveItem::File(_) => *index.file_counts.entry(parent).or_default() += 1,
                DriveItem::Folder(folder) => index.folders.entry(parent).or_default().push(folder),
            }
        }
        for siblings in index.folders.values_mut() {
            siblings.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }

        let max_depth = self.stores.config.max_tree_depth;
        let mut visited = HashSet::new();
        let (roots, root_file_count) = match top {
            Some(folder) => {
                let count = index.count_files(Some(folder.id.as_str()));
                let node = build_node(&index, folder, 0, max_depth, &mut visited);
                (vec![node], count)
            }
            None => {
                let roots = index
                    .children(None)
                    .into_iter()
                    .map(|folder| build_node(&index, folder, 0, max_depth, &mut visited))
                    .collect();
                (roots, index.count_files(None))
            }
        };

        Ok(FolderTree {
            roots,
            root_file_count,
            total_folders: visited.len() as u64,
        })
    }
}

impl Index {
    fn children(&self, parent: Option<&str>) -> Vec<Folder> {
        self.folders
            .get(&parent.map(str::to_string))
            .cloned()
            .unwrap_or_default()
    }

    fn count_files(&self, parent: Option<&str>) -> u64 {
        self.file_counts
            .get(&parent.map(str::to_string))
            .copied()
            .unwrap_or(0)
    }
}

fn build_node(
    index: &Index,
    folder: Folder,
    depth: usize,
    max_depth: usize,
    visited: &mut HashSet<String>,
) -> FolderNode {
    visited.insert(folder.id.to_string());
    let subfolders = index.children(Some(folder.id.as_str()));
    let child_count = subfolders.len() as u64;

    let mut children = Vec::new();
    if depth >= max_depth {
        warn!(folder_id = %folder.id, depth, "Folder tree truncated at maximum depth");
    } else {
        for child in subfolders {
            if !visited.contains(child.id.as_str()) {
                children.push(build_node(index, child, depth + 1, max_depth, visited));
            }
        }
    }

    FolderNode {
        file_count: index.count_files(Some(folder.id.as_str())),
        id: folder.id,
        name: folder.name,
        path: folder.path,
        child_count,
        children,
    }
}
