//! Share domain entities.

pub mod model;
pub mod permission;

pub use model::{ShareRecord, ShareStatus, ShareType, ShareUnusable};
pub use permission::{PermissionSet, SharePermission};
