//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default so an empty file yields a
//! working in-memory setup.

pub mod drive;
pub mod logging;
pub mod metadata;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::drive::DriveConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::metadata::{DatabaseConfig, MetadataConfig, MetadataProviderKind};
pub use self::storage::{LocalStorageConfig, ObjectStoreKind, S3StorageConfig, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Drive behaviour: key layout, upload limits, signed URL expiry.
    #[serde(default)]
    pub drive: DriveConfig,
    /// Metadata store settings.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Object store settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `{dir}/default` with an environment-specific overlay
    /// `{dir}/{env}` and environment variables prefixed with `DRIVEHUB__`.
    pub fn load(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DRIVEHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations the drive cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.drive.root.trim_matches('/').is_empty() {
            return Err(AppError::configuration("drive.root must not be empty"));
        }
        if self.drive.bucket.trim().is_empty() {
            return Err(AppError::configuration("drive.bucket must not be empty"));
        }
        if self.drive.max_upload_size_bytes == 0 {
            return Err(AppError::configuration(
                "drive.max_upload_size_bytes must be positive",
            ));
        }
        if self.drive.max_tree_depth == 0 {
            return Err(AppError::configuration(
                "drive.max_tree_depth must be positive",
            ));
        }
        if self.metadata.files_table == self.metadata.shares_table {
            return Err(AppError::configuration(
                "metadata.files_table and metadata.shares_table must differ",
            ));
        }
        Ok(())
    }
}
