//! DriveHub Server: virtual drive subsystem.
//!
//! Main entry point that wires the metadata store, the object store, and
//! the drive facade together, bootstraps the drive root, and then waits
//! for shutdown.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use drivehub_core::config::{AppConfig, LogFormat};
use drivehub_core::error::AppError;
use drivehub_metadata::connect_metadata_store;
use drivehub_service::DriveFacade;
use drivehub_storage::build_object_store;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let dir = std::env::var("DRIVEHUB_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("DRIVEHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DriveHub v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!(provider = ?config.metadata.provider, "Connecting metadata store...");
    let metadata = connect_metadata_store(&config.metadata).await?;

    tracing::info!(provider = ?config.storage.provider, "Initializing object store...");
    let objects = build_object_store(&config.storage).await?;

    match metadata.health_check().await {
        Ok(true) => tracing::info!("Metadata store healthy"),
        Ok(false) => tracing::warn!("Metadata store reported unhealthy"),
        Err(e) => tracing::warn!(error = %e, "Metadata store health check failed"),
    }
    match objects.health_check().await {
        Ok(true) => tracing::info!(provider = objects.provider_type(), "Object store healthy"),
        Ok(false) => {
            tracing::warn!(provider = objects.provider_type(), "Object store reported unhealthy")
        }
        Err(e) => tracing::warn!(
            provider = objects.provider_type(),
            error = %e,
            "Object store health check failed"
        ),
    }

    let facade = Arc::new(DriveFacade::new(metadata, objects, &config));
    let init = facade.initialize_drive_system().await?;
    tracing::info!(
        root = %config.drive.root,
        bucket = %config.drive.bucket,
        created = ?init.created,
        existing = ?init.existing,
        "Drive ready"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;
    tracing::info!("Shutdown signal received, stopping");
    Ok(())
}
