//! Drive behaviour configuration.

use serde::{Deserialize, Serialize};

/// Settings that shape storage keys, upload validation, and URL issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Top-level prefix of every storage key (the drive root).
    #[serde(default = "default_root")]
    pub root: String,
    /// Bucket that holds drive content.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Maximum upload size in bytes (default 100 MiB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// MIME types accepted by uploads.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
    /// Lifetime of download and preview URLs in seconds.
    #[serde(default = "default_signed_url_expiry")]
    pub signed_url_expiry_seconds: u64,
    /// Upper bound on ancestor walks when checking folder moves.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,
    /// Page size used when scanning the metadata tables.
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
}

impl DriveConfig {
    /// Whether uploads of the given MIME type are accepted.
    pub fn allows_mime_type(&self, mime_type: &str) -> bool {
        let wanted = mime_type.trim().to_ascii_lowercase();
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&wanted))
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            bucket: default_bucket(),
            max_upload_size_bytes: default_max_upload(),
            allowed_mime_types: default_allowed_mime_types(),
            signed_url_expiry_seconds: default_signed_url_expiry(),
            max_tree_depth: default_max_tree_depth(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

fn default_root() -> String {
    "drive".to_string()
}

fn default_bucket() -> String {
    "drivehub-content".to_string()
}

fn default_max_upload() -> u64 {
    104_857_600 // 100 MiB
}

fn default_allowed_mime_types() -> Vec<String> {
    [
        "text/plain",
        "text/csv",
        "text/markdown",
        "text/html",
        "application/json",
        "application/pdf",
        "application/zip",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "image/png",
        "image/jpeg",
        "image/gif",
        "image/webp",
        "image/svg+xml",
        "audio/mpeg",
        "audio/wav",
        "video/mp4",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_signed_url_expiry() -> u64 {
    3600
}

fn default_max_tree_depth() -> usize {
    64
}

fn default_scan_page_size() -> usize {
    500
}
