//! Share management: grants, listings, revocation, and grantee access.

pub mod access;
pub mod service;

pub use access::{AccessService, SharedContent};
pub use service::{NewShare, ShareService};
