//! Construct the configured object store.

use std::sync::Arc;

use tracing::info;

use drivehub_core::config::{ObjectStoreKind, StorageConfig};
use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::ObjectStore;

use crate::providers::{LocalObjectStore, MemoryObjectStore};

/// Build the object store selected by `config.provider`.
pub async fn build_object_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.provider {
        ObjectStoreKind::Memory => {
            info!("Using in-memory object store");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
        ObjectStoreKind::Local => {
            info!(root = %config.local.root_path, "Using local filesystem object store");
            Ok(Arc::new(LocalObjectStore::new(&config.local).await?))
        }
        #[cfg(feature = "s3")]
        ObjectStoreKind::S3 => Ok(Arc::new(
            crate::providers::S3ObjectStore::new(&config.s3).await?,
        )),
        #[cfg(not(feature = "s3"))]
        ObjectStoreKind::S3 => Err(drivehub_core::error::AppError::configuration(
            "storage.provider = \"s3\" requires the `s3` feature",
        )),
    }
}
