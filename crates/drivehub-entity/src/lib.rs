//! # drivehub-entity
//!
//! Domain entity models for DriveHub. Every struct in this crate is either
//! a record persisted in a metadata table (files, folders, shares) or a
//! domain value object. Records serialize with camelCase field names, the
//! shape consumed by the routing layer.

pub mod file;
pub mod folder;
pub mod id;
pub mod item;
pub mod namespace;
pub mod share;

pub use file::File;
pub use folder::{Folder, FolderNode, FolderTree};
pub use id::{FileId, FolderId, IdError, ParentRef, ShareId};
pub use item::{DriveItem, ItemKind};
pub use namespace::Namespace;
pub use share::{
    PermissionSet, SharePermission, ShareRecord, ShareStatus, ShareType, ShareUnusable,
};
