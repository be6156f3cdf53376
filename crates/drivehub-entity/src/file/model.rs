//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{FileId, ParentRef};
use crate::namespace::Namespace;

/// A file stored in the drive.
///
/// `path` is the logical path of the containing folder and excludes the
/// file's own name; `storage_key` is always derivable from
/// (`owner_id`, namespace, `path`, `name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// Display name (including extension).
    pub name: String,
    /// Containing folder, or root.
    pub parent_id: ParentRef,
    /// Logical path of the containing folder ("" at root).
    pub path: String,
    /// Key of the content object.
    pub storage_key: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Content size in bytes.
    pub size: u64,
    /// Owning namespace id.
    pub namespace_id: String,
    /// Owning namespace display name.
    pub namespace_name: String,
    /// The user who owns the file.
    pub owner_id: String,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Full logical path including the file name.
    pub fn logical_path(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.path, self.name)
        }
    }

    /// The namespace this file belongs to.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.namespace_id.clone(), self.namespace_name.clone())
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Trim, drop empty, and de-duplicate tags while keeping first-seen order.
pub fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
