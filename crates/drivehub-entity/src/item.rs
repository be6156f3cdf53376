//! The record shape stored in the files table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::file::File;
use crate::folder::Folder;
use crate::id::ParentRef;

/// Which kind of drive entity a record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A file with content.
    File,
    /// A folder.
    Folder,
}

impl ItemKind {
    /// Return the kind as stored in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file or folder record, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DriveItem {
    /// A file record.
    File(File),
    /// A folder record.
    Folder(Folder),
}

impl DriveItem {
    /// The record's kind.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::File(_) => ItemKind::File,
            Self::Folder(_) => ItemKind::Folder,
        }
    }

    /// The record's id as stored.
    pub fn id(&self) -> &str {
        match self {
            Self::File(f) => f.id.as_str(),
            Self::Folder(f) => f.id.as_str(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => &f.name,
            Self::Folder(f) => &f.name,
        }
    }

    /// Parent reference.
    pub fn parent_id(&self) -> &ParentRef {
        match self {
            Self::File(f) => &f.parent_id,
            Self::Folder(f) => &f.parent_id,
        }
    }

    /// Owning user.
    pub fn owner_id(&self) -> &str {
        match self {
            Self::File(f) => &f.owner_id,
            Self::Folder(f) => &f.owner_id,
        }
    }

    /// Owning namespace id.
    pub fn namespace_id(&self) -> &str {
        match self {
            Self::File(f) => &f.namespace_id,
            Self::Folder(f) => &f.namespace_id,
        }
    }

    /// Stored logical path (folder path for files, own path for folders).
    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.path,
            Self::Folder(f) => &f.path,
        }
    }

    /// Stored storage key.
    pub fn storage_key(&self) -> &str {
        match self {
            Self::File(f) => &f.storage_key,
            Self::Folder(f) => &f.storage_key,
        }
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::File(f) => f.created_at,
            Self::Folder(f) => f.created_at,
        }
    }

    /// Whether `owner_id` owns this record inside `namespace_id`.
    pub fn is_scoped_to(&self, owner_id: &str, namespace_id: &str) -> bool {
        self.owner_id() == owner_id && self.namespace_id() == namespace_id
    }

    /// Borrow as a file.
    pub fn as_file(&self) -> Option<&File> {
        match self {
            Self::File(f) => Some(f),
            Self::Folder(_) => None,
        }
    }

    /// Borrow as a folder.
    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::File(_) => None,
        }
    }

    /// Convert into a file.
    pub fn into_file(self) -> Option<File> {
        match self {
            Self::File(f) => Some(f),
            Self::Folder(_) => None,
        }
    }

    /// Convert into a folder.
    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::File(_) => None,
        }
    }
}

impl From<File> for DriveItem {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

impl From<Folder> for DriveItem {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}
