//! Object store trait for pluggable content backends.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// User-defined metadata attached to a stored object.
pub type ObjectMetadata = HashMap<String, String>;

/// How a browser should treat a downloaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "filename")]
pub enum ContentDisposition {
    /// Render in place (previews).
    Inline,
    /// Save as a file with the given name.
    Attachment(String),
}

impl ContentDisposition {
    /// Render the `Content-Disposition` header value.
    pub fn header_value(&self) -> String {
        match self {
            Self::Inline => "inline".to_string(),
            Self::Attachment(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                format!("attachment; filename=\"{escaped}\"")
            }
        }
    }
}

/// Options for issuing a time-limited object URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrlOptions {
    /// Content disposition the URL should force.
    pub disposition: ContentDisposition,
    /// Content type the URL should force, if any.
    pub content_type: Option<String>,
    /// URL lifetime in seconds.
    pub expiry_seconds: u64,
}

/// Trait for object (blob) storage backends.
///
/// Keys are opaque slash-delimited strings; no directory semantics are
/// implied. Implementations exist for an in-memory map, the local
/// filesystem, and S3 in `drivehub-storage`.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write an object, replacing any existing object at `key`.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> AppResult<()>;

    /// Read an object into memory. Fails with `NotFound` if absent.
    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes>;

    /// Issue a time-limited URL for reading an object.
    async fn signed_url(&self, bucket: &str, key: &str, options: &SignedUrlOptions)
    -> AppResult<String>;

    /// Copy an object within a bucket. `metadata`, when given, replaces the
    /// source object's metadata on the copy.
    async fn copy(
        &self,
        bucket: &str,
        src_key: &str,
        dst_key: &str,
        metadata: Option<&ObjectMetadata>,
    ) -> AppResult<()>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> AppResult<()>;

    /// List every key that starts with `prefix`, sorted.
    async fn list_by_prefix(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>>;

    /// Delete a batch of objects and return how many were removed.
    async fn delete_many(&self, bucket: &str, keys: &[String]) -> AppResult<u64>;

    /// Check whether an object exists.
    async fn exists(&self, bucket: &str, key: &str) -> AppResult<bool>;
}
