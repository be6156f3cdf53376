//! # drivehub-service
//!
//! Drive business logic for DriveHub. The tree services are the only
//! writers of path/storage-key pairs; the sharing services grant and
//! resolve access to those entities; the facade composes both for the
//! routing layer.
//!
//! Services follow constructor injection: every dependency arrives at
//! construction time as an `Arc` handle inside [`DriveStores`].

pub mod context;
pub mod facade;
pub mod path;
pub mod share;
pub mod stores;
pub mod tree;

pub use context::RequestContext;
pub use facade::{DriveFacade, DriveInitialization, FolderCreated, UploadResult};
pub use path::PathResolver;
pub use share::{AccessService, NewShare, ShareService, SharedContent};
pub use stores::DriveStores;
pub use tree::{
    ChildFailure, ConsistencyOutcome, DownloadLink, FileDeletion, FileService, FolderDeletion,
    FolderService, NewFile, NewFolder, Relocation, TreeService,
};
