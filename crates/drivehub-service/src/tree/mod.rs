//! Drive tree management: the sole writer of path/storage-key pairs.

pub mod file;
pub mod folder;
pub mod listing;
pub mod outcome;
pub mod relocation;
pub mod view;

pub use file::{DownloadLink, FileService, NewFile};
pub use folder::{FolderService, NewFolder};
pub use outcome::{ChildFailure, ConsistencyOutcome, FileDeletion, FolderDeletion, Relocation};
pub use view::TreeService;

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;

use crate::path::FOLDER_MARKER;

/// Longest accepted entity name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Trim and check a file or folder name.
pub(crate) fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if name.contains('/') {
        return Err(AppError::validation("Name cannot contain '/'"));
    }
    if name == "." || name == ".." || name == FOLDER_MARKER {
        return Err(AppError::validation(format!("'{name}' is a reserved name")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Name exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    Ok(name.to_string())
}
