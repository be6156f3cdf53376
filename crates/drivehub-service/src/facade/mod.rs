//! Routing-facing surface: validated requests in, contract views out.

pub mod bootstrap;
pub mod drive;
pub mod requests;

pub use bootstrap::{DRIVE_MARKER, DriveInitialization, initialize_drive_system};
pub use drive::{DriveFacade, FolderCreated, UploadResult};
pub use requests::{
    CreateFolderRequest, ListRequest, MoveRequest, NamespaceInput, RenameRequest, ShareRequest,
    UpdatePermissionsRequest, UploadContent, UploadFileRequest, page_request,
};
