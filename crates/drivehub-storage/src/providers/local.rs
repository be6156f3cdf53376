//! Local filesystem object store.
//!
//! Objects live at `{root}/{bucket}/{key}`. Content type and user metadata
//! are kept in a JSON sidecar under `{root}/.meta/{bucket}/{key}.json` so
//! that bucket listings only ever see object files.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use drivehub_core::config::LocalStorageConfig;
use drivehub_core::error::{AppError, ErrorKind};
use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::{ObjectMetadata, ObjectStore, SignedUrlOptions};

use crate::signing::{ObjectUrlClaims, UrlSigner, encode_key_path};

const SIDECAR_DIR: &str = ".meta";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sidecar {
    content_type: String,
    #[serde(default)]
    metadata: ObjectMetadata,
}

/// Local filesystem object store.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
    signer: UrlSigner,
}

impl LocalObjectStore {
    /// Create a store rooted at `config.root_path`, creating the directory.
    pub async fn new(config: &LocalStorageConfig) -> AppResult<Self> {
        let root = PathBuf::from(&config.root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            signer: UrlSigner::new(&config.signing_secret),
        })
    }

    /// Verify a token from a URL issued by [`ObjectStore::signed_url`].
    pub fn verify_token(&self, token: &str) -> AppResult<ObjectUrlClaims> {
        self.signer.verify(token)
    }

    fn bucket_dir(&self, bucket: &str) -> AppResult<PathBuf> {
        if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(['/', '\\']) {
            return Err(AppError::validation(format!("Invalid bucket name: {bucket}")));
        }
        Ok(self.root.join(bucket))
    }

    /// Resolve a key below the bucket directory, rejecting traversal.
    fn object_path(&self, bucket: &str, key: &str) -> AppResult<PathBuf> {
        let relative = checked_key(key)?;
        Ok(self.bucket_dir(bucket)?.join(relative))
    }

    fn sidecar_path(&self, bucket: &str, key: &str) -> AppResult<PathBuf> {
        self.bucket_dir(bucket)?;
        let relative = checked_key(key)?;
        let mut path = self.root.join(SIDECAR_DIR).join(bucket).join(relative);
        let file_name = format!(
            "{}.json",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        path.set_file_name(file_name);
        Ok(path)
    }

    async fn read_sidecar(&self, bucket: &str, key: &str) -> AppResult<Sidecar> {
        let path = self.sidecar_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Sidecar::default()),
            Err(e) => Err(storage_error(format!("Failed to read metadata for {key}"), e)),
        }
    }

    async fn write_sidecar(&self, bucket: &str, key: &str, sidecar: &Sidecar) -> AppResult<()> {
        let path = self.sidecar_path(bucket, key)?;
        ensure_parent(&path).await?;
        fs::write(&path, serde_json::to_vec(sidecar)?)
            .await
            .map_err(|e| storage_error(format!("Failed to write metadata for {key}"), e))
    }

    /// Remove now-empty directories from `start` up to (excluding) `stop`.
    async fn prune_empty_dirs(&self, start: Option<&Path>, stop: &Path) {
        let mut current = start.map(Path::to_path_buf);
        while let Some(dir) = current {
            if dir == stop || !dir.starts_with(stop) {
                break;
            }
            if fs::remove_dir(&dir).await.is_err() {
                break;
            }
            current = dir.parent().map(Path::to_path_buf);
        }
    }
}

fn checked_key(key: &str) -> AppResult<PathBuf> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::validation("Object key must not be empty"));
    }
    let path = PathBuf::from(trimmed);
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(AppError::validation(format!("Invalid object key: {key}")));
    }
    Ok(path)
}

fn storage_error(message: String, err: std::io::Error) -> AppError {
    AppError::with_source(ErrorKind::Storage, message, err)
}

fn not_found_or(key: &str, context: &str, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Object not found: {key}"))
    } else {
        storage_error(format!("{context}: {key}"), err)
    }
}

async fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            storage_error(
                format!("Failed to create parent directory: {}", parent.display()),
                e,
            )
        })?;
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> AppResult<()> {
        let path = self.object_path(bucket, key)?;
        ensure_parent(&path).await?;
        fs::write(&path, &data)
            .await
            .map_err(|e| storage_error(format!("Failed to write object: {key}"), e))?;
        self.write_sidecar(
            bucket,
            key,
            &Sidecar {
                content_type: content_type.to_string(),
                metadata: metadata.clone(),
            },
        )
        .await?;

        debug!(bucket, key, bytes = data.len(), "Wrote object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes> {
        let path = self.object_path(bucket, key)?;
        let data = fs::read(&path)
            .await
            .map_err(|e| not_found_or(key, "Failed to read object", e))?;
        Ok(Bytes::from(data))
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        options: &SignedUrlOptions,
    ) -> AppResult<String> {
        self.object_path(bucket, key)?;
        let token = self.signer.sign(bucket, key, options)?;
        Ok(format!(
            "{}/{bucket}/{}?token={token}",
            self.public_base_url,
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
        let src = self.object_path(bucket, src_key)?;
        let dst = self.object_path(bucket, dst_key)?;
        ensure_parent(&dst).await?;
        fs::copy(&src, &dst)
            .await
            .map_err(|e| not_found_or(src_key, "Failed to copy object", e))?;

        let mut sidecar = self.read_sidecar(bucket, src_key).await?;
        if let Some(metadata) = metadata {
            sidecar.metadata = metadata.clone();
        }
        self.write_sidecar(bucket, dst_key, &sidecar).await?;

        debug!(bucket, src_key, dst_key, "Copied object");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> AppResult<()> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(storage_error(format!("Failed to delete object: {key}"), e)),
        }

        let sidecar = self.sidecar_path(bucket, key)?;
        if let Err(e) = fs::remove_file(&sidecar).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(bucket, key, error = %e, "Failed to remove object metadata");
            }
        }

        let bucket_dir = self.bucket_dir(bucket)?;
        self.prune_empty_dirs(path.parent(), &bucket_dir).await;
        let sidecar_root = self.root.join(SIDECAR_DIR).join(bucket);
        self.prune_empty_dirs(sidecar.parent(), &sidecar_root).await;
        Ok(())
    }

    async fn list_by_prefix(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>> {
        let bucket_dir = self.bucket_dir(bucket)?;

        // Start at the deepest directory fully named by the prefix.
        let start_rel = match prefix.rfind('/') {
            Some(pos) => &prefix[..pos],
            None => "",
        };
        let start = if start_rel.is_empty() {
            bucket_dir.clone()
        } else {
            bucket_dir.join(checked_key(start_rel)?)
        };

        let mut keys = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(storage_error(
                        format!("Failed to list directory: {}", dir.display()),
                        e,
                    ));
                }
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| storage_error("Failed to read directory entry".to_string(), e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| storage_error("Failed to read entry type".to_string(), e))?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> AppResult<u64> {
        let mut deleted = 0u64;
        for key in keys {
            if self.exists(bucket, key).await? {
                self.delete(bucket, key).await?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, bucket: &str, key: &str) -> AppResult<bool> {
        let path = self.object_path(bucket, key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(format!("Failed to stat object: {key}"), e)),
        }
    }
}
