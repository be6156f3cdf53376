//! Folder tree structures for hierarchical display.

use serde::{Deserialize, Serialize};

use crate::id::FolderId;

/// A node in a folder tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    /// Folder ID.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Full path.
    pub path: String,
    /// Number of child folders.
    pub child_count: u64,
    /// Number of files directly in this folder.
    pub file_count: u64,
    /// Child folder nodes.
    pub children: Vec<FolderNode>,
}

/// A folder tree rooted at root or at a specific folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderTree {
    /// The top node(s) of the tree.
    pub roots: Vec<FolderNode>,
    /// Number of files directly at the tree's top level.
    pub root_file_count: u64,
    /// Total number of folders in the tree.
    pub total_folders: u64,
}

impl FolderTree {
    /// Create an empty folder tree.
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            root_file_count: 0,
            total_folders: 0,
        }
    }
}
