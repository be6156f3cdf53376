//! # drivehub-storage
//!
//! Object store implementations for DriveHub content: an in-memory map,
//! the local filesystem, and S3-compatible object storage.

pub mod builder;
pub mod providers;
pub mod signing;

pub use builder::build_object_store;
pub use providers::{LocalObjectStore, MemoryObjectStore};
