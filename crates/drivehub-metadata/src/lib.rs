//! # drivehub-metadata
//!
//! Metadata store backends (in-memory and PostgreSQL JSONB) implementing
//! [`drivehub_core::traits::MetadataStore`], plus typed repositories for the
//! drive tables built on top of that generic record interface.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod provider;
pub mod repositories;

pub use memory::MemoryMetadataStore;
pub use provider::connect_metadata_store;
pub use repositories::{DriveItemRepository, ShareRepository};
