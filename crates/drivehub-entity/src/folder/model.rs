//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{FolderId, ParentRef};
use crate::namespace::Namespace;

/// A folder in the drive hierarchy.
///
/// `path` is the folder's own materialized path: `parent.path/name`, or
/// just `name` at root. Content-wise a folder is only a zero-byte marker
/// object at `{storage_key}/.folder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Parent folder, or root.
    pub parent_id: ParentRef,
    /// Full materialized path (e.g., `Docs/2024`).
    pub path: String,
    /// Key prefix under which the folder's content lives.
    pub storage_key: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Owning namespace id.
    pub namespace_id: String,
    /// Owning namespace display name.
    pub namespace_name: String,
    /// The user who owns the folder.
    pub owner_id: String,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this folder sits directly under root.
    pub fn is_root_level(&self) -> bool {
        self.parent_id.is_root()
    }

    /// The namespace this folder belongs to.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.namespace_id.clone(), self.namespace_name.clone())
    }

    /// Depth in the tree (0 for root-level folders).
    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}
