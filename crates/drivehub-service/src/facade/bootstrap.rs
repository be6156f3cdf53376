//! Drive root bootstrap.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::ObjectMetadata;

use crate::path::{FOLDER_MARKER, child_path};
use crate::stores::DriveStores;

/// Marker placed at the drive root.
pub const DRIVE_MARKER: &str = ".drive";

/// Which bootstrap markers were written and which were already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveInitialization {
    /// Markers written by this call.
    pub created: Vec<String>,
    /// Markers that already existed.
    pub existing: Vec<String>,
}

/// Ensure the drive root and namespaces markers exist. Safe to call on
/// every boot.
pub async fn initialize_drive_system(stores: &DriveStores) -> AppResult<DriveInitialization> {
    let markers = [
        child_path(stores.resolver.root(), DRIVE_MARKER),
        child_path(&stores.resolver.namespaces_prefix(), FOLDER_MARKER),
    ];

    let bucket = stores.bucket();
    let mut report = DriveInitialization::default();
    for key in markers {
        let present = stores
            .objects
            .exists(bucket, &key)
            .await
            .map_err(|e| e.into_unavailable("Failed to check drive marker"))?;
        if present {
            report.existing.push(key);
            continue;
        }
        stores
            .objects
            .put(
                bucket,
                &key,
                Bytes::new(),
                "application/x-directory",
                &ObjectMetadata::new(),
            )
            .await
            .map_err(|e| e.into_unavailable("Failed to write drive marker"))?;
        report.created.push(key);
    }

    info!(
        bucket,
        created = report.created.len(),
        existing = report.existing.len(),
        "Drive system initialized"
    );
    Ok(report)
}
