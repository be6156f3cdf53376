//! Construct the configured metadata store.

use std::sync::Arc;

use tracing::info;

use drivehub_core::config::{MetadataConfig, MetadataProviderKind};
use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::MetadataStore;

use crate::memory::MemoryMetadataStore;

/// Build the metadata store selected by `config.provider`.
///
/// The PostgreSQL backend connects and creates its schema before returning.
pub async fn connect_metadata_store(config: &MetadataConfig) -> AppResult<Arc<dyn MetadataStore>> {
    match config.provider {
        MetadataProviderKind::Memory => {
            info!("Using in-memory metadata store");
            Ok(Arc::new(MemoryMetadataStore::new()))
        }
        #[cfg(feature = "postgres")]
        MetadataProviderKind::Postgres => {
            use crate::postgres::{DatabasePool, PgMetadataStore};

            let pool = DatabasePool::connect(&config.database).await?;
            let store = PgMetadataStore::new(&pool);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        MetadataProviderKind::Postgres => Err(drivehub_core::error::AppError::configuration(
            "metadata.provider = \"postgres\" requires the `postgres` feature",
        )),
    }
}
