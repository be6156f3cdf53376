//! Object store configuration.

use serde::{Deserialize, Serialize};

/// Which object store holds drive content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreKind {
    /// Process-local map; contents are lost on restart.
    #[default]
    Memory,
    /// Local filesystem directory.
    Local,
    /// S3-compatible object storage.
    S3,
}

/// Top-level object store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub provider: ObjectStoreKind,
    /// Local filesystem store configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible store configuration.
    #[serde(default)]
    pub s3: S3StorageConfig,
}

/// Local filesystem object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root directory; each bucket is a sub-directory.
    #[serde(default = "default_local_root")]
    pub root_path: String,
    /// Base URL under which signed download links are served.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// HMAC secret used to sign download tokens.
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
            public_base_url: default_public_base_url(),
            signing_secret: default_signing_secret(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// S3 endpoint URL (for non-AWS services like MinIO). Empty uses AWS.
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key ID. Empty uses the default credential chain.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Use path-style addressing (required by most S3-compatible servers).
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            access_key: String::new(),
            secret_key: String::new(),
            force_path_style: false,
        }
    }
}

fn default_local_root() -> String {
    "./data/objects".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/objects".to_string()
}

fn default_signing_secret() -> String {
    "change-me".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}
