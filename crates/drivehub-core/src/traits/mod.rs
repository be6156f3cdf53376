//! Core traits defined in `drivehub-core` and implemented by other crates.

pub mod metadata;
pub mod storage;

pub use metadata::{MetadataStore, ScanPage};
pub use storage::{ContentDisposition, ObjectMetadata, ObjectStore, SignedUrlOptions};
