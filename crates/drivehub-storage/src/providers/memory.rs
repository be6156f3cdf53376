//! In-memory object store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::{
    ContentDisposition, ObjectMetadata, ObjectStore, SignedUrlOptions,
};

use crate::signing::encode_key_path;

/// An object held by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    /// Object content.
    pub data: Bytes,
    /// Content type recorded at write time.
    pub content_type: String,
    /// User metadata.
    pub metadata: ObjectMetadata,
}

/// Object store that keeps every bucket in a process-local ordered map.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: DashMap<String, BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect a stored object.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets.get(bucket).and_then(|b| b.get(key).cloned())
    }

    /// Every key in a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> AppResult<()> {
        debug!(bucket, key, bytes = data.len(), "Put object");
        self.buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes> {
        self.object(bucket, key)
            .map(|o| o.data)
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        options: &SignedUrlOptions,
    ) -> AppResult<String> {
        let expires = Utc::now().timestamp() + options.expiry_seconds as i64;
        let disposition = match &options.disposition {
            ContentDisposition::Inline => "inline",
            ContentDisposition::Attachment(_) => "attachment",
        };
        Ok(format!(
            "memory://{bucket}/{}?disposition={disposition}&expires={expires}",
            encode_key_path(key)
        ))
    }

    async fn copy(
        &self,
        bucket: &str,
        src_key: &str,
        dst_key: &str,
        metadata: Option<&ObjectMetadata>,
    ) -> AppResult<()> {
        let mut object = self
            .object(bucket, src_key)
            .ok_or_else(|| AppError::not_found(format!("Object not found: {src_key}")))?;
        if let Some(metadata) = metadata {
            object.metadata = metadata.clone();
        }
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(dst_key.to_string(), object);
        debug!(bucket, src_key, dst_key, "Copied object");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> AppResult<()> {
        if let Some(mut objects) = self.buckets.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list_by_prefix(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>> {
        Ok(self
            .buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .range(prefix.to_string()..)
                    .take_while(|(key, _)| key.starts_with(prefix))
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> AppResult<u64> {
        let Some(mut objects) = self.buckets.get_mut(bucket) else {
            return Ok(0);
        };
        Ok(keys
            .iter()
            .filter(|key| objects.remove(key.as_str()).is_some())
            .count() as u64)
    }

    async fn exists(&self, bucket: &str, key: &str) -> AppResult<bool> {
        Ok(self
            .buckets
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key)))
    }
}
