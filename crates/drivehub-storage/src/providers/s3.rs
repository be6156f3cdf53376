//! S3-compatible object store (requires the `s3` feature).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, MetadataDirective, ObjectIdentifier};
use bytes::Bytes;
use tracing::{debug, info, warn};

use drivehub_core::config::S3StorageConfig;
use drivehub_core::error::{AppError, ErrorKind};
use drivehub_core::result::AppResult;
use drivehub_core::traits::storage::{ObjectMetadata, ObjectStore, SignedUrlOptions};

use crate::signing::encode_key_path;

/// Maximum keys accepted by one `DeleteObjects` call.
const DELETE_BATCH: usize = 1000;

/// S3-compatible object store.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from configuration.
    ///
    /// Empty `access_key` falls back to the default AWS credential chain;
    /// empty `endpoint` targets AWS itself.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            "Initializing S3 object store"
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "drivehub",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(config.endpoint.clone());
        }

        Ok(Self::from_client(Client::from_conf(builder.build())))
    }

    /// Wrap an already-configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn s3_error(context: String, err: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::with_source(ErrorKind::Storage, format!("{context}: {err}"), err)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self.client.list_buckets().send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = %e, "S3 health check failed");
                Ok(false)
            }
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> AppResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .set_metadata(Some(metadata.clone()))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| s3_error(format!("Failed to put object {key}"), e))?;

        debug!(bucket, key, bytes = size, "Put object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    s3_error(format!("Failed to get object {key}"), e)
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| s3_error(format!("Failed to read object body {key}"), e))?;
        Ok(body.into_bytes())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        options: &SignedUrlOptions,
    ) -> AppResult<String> {
        let presign = PresigningConfig::expires_in(Duration::from_secs(options.expiry_seconds))
            .map_err(|e| s3_error("Invalid presign expiry".to_string(), e))?;

        let mut request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .response_content_disposition(options.disposition.header_value());
        if let Some(content_type) = &options.content_type {
            request = request.response_content_type(content_type);
        }

        let presigned = request
            .presigned(presign)
            .await
            .map_err(|e| s3_error(format!("Failed to presign {key}"), e))?;
        Ok(presigned.uri().to_string())
    }

    async fn copy(
        &self,
        bucket: &str,
        src_key: &str,
        dst_key: &str,
        metadata: Option<&ObjectMetadata>,
    ) -> AppResult<()> {
        let mut request = self
            .client
            .copy_object()
            .bucket(bucket)
            .key(dst_key)
            .copy_source(format!("{bucket}/{}", encode_key_path(src_key)));

        if let Some(metadata) = metadata {
            // REPLACE drops every stored header, so carry the content type over.
            let head = self
                .client
                .head_object()
                .bucket(bucket)
                .key(src_key)
                .send()
                .await
                .map_err(|e| {
                    if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                        AppError::not_found(format!("Object not found: {src_key}"))
                    } else {
                        s3_error(format!("Failed to stat object {src_key}"), e)
                    }
                })?;
            request = request
                .metadata_directive(MetadataDirective::Replace)
                .set_metadata(Some(metadata.clone()))
                .set_content_type(head.content_type().map(str::to_string));
        }

        request.send().await.map_err(|e| {
            if e.raw_response().is_some_and(|r| r.status().as_u16() == 404) {
                AppError::not_found(format!("Object not found: {src_key}"))
            } else {
                s3_error(format!("Failed to copy {src_key} -> {dst_key}"), e)
            }
        })?;

        debug!(bucket, src_key, dst_key, "Copied object");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error(format!("Failed to delete object {key}"), e))?;
        Ok(())
    }

    async fn list_by_prefix(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| s3_error(format!("Failed to list prefix {prefix}"), e))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> AppResult<u64> {
        let mut deleted = 0u64;
        for chunk in keys.chunks(DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| s3_error("Failed to build delete request".to_string(), e))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| s3_error("Failed to build delete request".to_string(), e))?;

            let output = self
                .client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| s3_error("Failed to delete objects".to_string(), e))?;

            let failed = output.errors().len();
            for error in output.errors() {
                warn!(
                    bucket,
                    key = error.key().unwrap_or_default(),
                    code = error.code().unwrap_or_default(),
                    "Batch delete left object behind"
                );
            }
            deleted += (chunk.len() - failed) as u64;
        }
        Ok(deleted)
    }

    async fn exists(&self, bucket: &str, key: &str) -> AppResult<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(s3_error(format!("Failed to stat object {key}"), e)),
        }
    }
}
