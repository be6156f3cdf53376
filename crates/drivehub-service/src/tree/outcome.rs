//! Result types for operations that touch both stores.
//!
//! Metadata is authoritative. When the object store diverges during a
//! relocation or delete the operation still succeeds, and the divergence is
//! reported here instead of only in logs.

use serde::{Deserialize, Serialize};

use drivehub_core::error::AppError;
use drivehub_core::types::ApiResponse;
use drivehub_entity::{FileId, FolderId, ItemKind};

/// Whether each store ended up in the intended state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyOutcome {
    /// Every metadata write succeeded.
    pub metadata_ok: bool,
    /// Every content write succeeded.
    pub content_ok: bool,
    /// One line per divergence.
    pub warnings: Vec<String>,
}

impl ConsistencyOutcome {
    /// Both stores fully updated.
    pub fn clean() -> Self {
        Self {
            metadata_ok: true,
            content_ok: true,
            warnings: Vec::new(),
        }
    }

    /// Record a content-store divergence.
    pub fn content_failed(&mut self, warning: impl Into<String>) {
        self.content_ok = false;
        self.warnings.push(warning.into());
    }

    /// Record a metadata-store divergence.
    pub fn metadata_failed(&mut self, warning: impl Into<String>) {
        self.metadata_ok = false;
        self.warnings.push(warning.into());
    }

    /// Fold another outcome into this one.
    pub fn absorb(&mut self, other: ConsistencyOutcome) {
        self.metadata_ok &= other.metadata_ok;
        self.content_ok &= other.content_ok;
        self.warnings.extend(other.warnings);
    }

    /// Whether nothing diverged.
    pub fn is_consistent(&self) -> bool {
        self.metadata_ok && self.content_ok
    }
}

impl Default for ConsistencyOutcome {
    fn default() -> Self {
        Self::clean()
    }
}

/// An entity after a rename or move.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relocation<T> {
    /// The updated entity.
    pub entity: T,
    /// Logical path before the change.
    pub old_path: String,
    /// Logical path after the change.
    pub new_path: String,
    /// Descendant records rewritten (folders only).
    pub descendants_updated: u64,
    /// Store consistency after content relocation.
    pub outcome: ConsistencyOutcome,
}

/// Result of deleting a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeletion {
    /// The deleted file.
    pub file_id: FileId,
    /// Its logical path.
    pub path: String,
    /// Store consistency after the delete.
    pub outcome: ConsistencyOutcome,
}

/// One subtree member that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildFailure {
    /// Record id.
    pub id: String,
    /// File or folder.
    pub kind: ItemKind,
    /// Logical path.
    pub path: String,
    /// Error taxonomy code.
    pub error_code: String,
    /// Error message.
    pub message: String,
}

impl ChildFailure {
    pub(crate) fn new(id: &str, kind: ItemKind, path: &str, err: &AppError) -> Self {
        Self {
            id: id.to_string(),
            kind,
            path: path.to_string(),
            error_code: err.kind.to_string(),
            message: err.message.clone(),
        }
    }
}

/// Result of a recursive folder delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDeletion {
    /// The folder that was targeted.
    pub folder_id: FolderId,
    /// Its logical path.
    pub path: String,
    /// Whether the folder record itself was removed.
    pub deleted: bool,
    /// File records removed.
    pub files_deleted: u64,
    /// Folder records removed, including the target when `deleted`.
    pub folders_deleted: u64,
    /// Members that blocked the delete.
    pub failures: Vec<ChildFailure>,
    /// Store consistency for the members that were removed.
    pub outcome: ConsistencyOutcome,
}

impl FolderDeletion {
    /// Turn a blocked delete into an aggregate error naming the failed children.
    pub fn into_result(self) -> Result<Self, AppError> {
        if self.deleted {
            return Ok(self);
        }
        let names: Vec<&str> = self.failures.iter().map(|f| f.path.as_str()).collect();
        Err(AppError::service_unavailable(format!(
            "Folder '{}' was not deleted; {} member(s) failed: {}",
            self.path,
            self.failures.len(),
            names.join(", ")
        )))
    }

    /// Envelope for the routing layer; failures travel in `details`.
    pub fn into_response(self) -> ApiResponse<FolderDeletion> {
        let failures = serde_json::json!({ "failures": &self.failures });
        match self.clone().into_result() {
            Ok(report) => ApiResponse::ok(report).with_details(failures),
            Err(err) => {
                let mut response = ApiResponse::error(&err).with_details(failures);
                response.data = Some(self);
                response
            }
        }
    }
}
