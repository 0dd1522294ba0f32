// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Blob store backed by the `object_store` crate
//!
//! Each bucket gets its own `ObjectStore` instance, created on first use and
//! cached. A bucket written as `name/prefix/` addresses bucket `name` with
//! every key placed under `prefix/`.

use async_trait::async_trait;
use bda_common::{BdaError, Result, StoreBackend, StoreConfig};
use bytes::Bytes;
use dashmap::DashMap;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::path::PathBuf;
use std::sync::Arc;

use crate::BlobStore;

#[derive(Debug, Clone)]
enum Backend {
    Local(PathBuf),
    Memory,
    S3 {
        region: Option<String>,
        endpoint: Option<String>,
    },
}

#[derive(Debug)]
pub struct ObjectStoreBlobStore {
    backend: Backend,
    buckets: DashMap<String, Arc<dyn ObjectStore>>,
}

impl ObjectStoreBlobStore {
    /// Buckets are directories under `root`
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::with_backend(Backend::Local(root.into()))
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Backend::Memory)
    }

    /// Amazon S3; credentials come from the standard AWS environment variables
    pub fn s3(region: Option<String>, endpoint: Option<String>) -> Self {
        Self::with_backend(Backend::S3 { region, endpoint })
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        match config.backend {
            StoreBackend::Local => Self::local(config.root.clone()),
            StoreBackend::Memory => Self::in_memory(),
            StoreBackend::S3 => Self::s3(config.region.clone(), config.endpoint.clone()),
        }
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            buckets: DashMap::new(),
        }
    }

    async fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let cached = self.buckets.get(bucket).map(|store| store.value().clone());
        if let Some(store) = cached {
            return Ok(store);
        }

        let store: Arc<dyn ObjectStore> = match &self.backend {
            Backend::Local(root) => {
                let dir = root.join(bucket);
                tokio::fs::create_dir_all(&dir).await?;
                Arc::new(LocalFileSystem::new_with_prefix(&dir).map_err(store_error)?)
            }
            Backend::Memory => Arc::new(InMemory::new()),
            Backend::S3 { region, endpoint } => {
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint).with_allow_http(true);
                }
                Arc::new(builder.build().map_err(store_error)?)
            }
        };

        log::debug!("Opened blob store bucket {} ({:?})", bucket, self.backend);

        // Another task may have raced us here; keep whichever landed first
        let entry = self.buckets.entry(bucket.to_string()).or_insert(store);
        Ok(entry.value().clone())
    }

    async fn resolve(&self, bucket: &str, key: &str) -> Result<(Arc<dyn ObjectStore>, ObjectPath)> {
        let (name, prefix) = split_bucket(bucket)?;
        let full_key = format!("{}{}", prefix, key);
        let path = ObjectPath::parse(&full_key)
            .map_err(|e| BdaError::InvalidArgument(format!("invalid key {}: {}", key, e)))?;
        if path.as_ref().is_empty() {
            return Err(BdaError::InvalidArgument("blob key cannot be empty".to_string()));
        }
        Ok((self.store_for(name).await?, path))
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let (store, path) = self.resolve(bucket, key).await?;

        let result = store.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => BdaError::BlobNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => store_error(other),
        })?;

        let bytes = result.bytes().await.map_err(store_error)?;
        log::debug!("Read {} bytes from {}/{}", bytes.len(), bucket, key);
        Ok(bytes)
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<()> {
        let (store, path) = self.resolve(bucket, key).await?;
        let size = body.len();

        store
            .put(&path, PutPayload::from(body))
            .await
            .map_err(store_error)?;

        log::debug!("Wrote {} bytes to {}/{}", size, bucket, key);
        Ok(())
    }
}

/// `"data/cart/"` -> `("data", "cart/")`
fn split_bucket(bucket: &str) -> Result<(&str, String)> {
    let trimmed = bucket.trim_matches('/');
    if trimmed.is_empty() {
        return Err(BdaError::InvalidArgument("bucket cannot be empty".to_string()));
    }
    if trimmed.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(BdaError::InvalidArgument(format!(
            "bucket {} cannot contain '.' or '..' segments",
            bucket
        )));
    }

    match trimmed.split_once('/') {
        Some((name, rest)) => Ok((name, format!("{}/", rest.trim_end_matches('/')))),
        None => Ok((trimmed, String::new())),
    }
}

fn store_error(e: object_store::Error) -> BdaError {
    BdaError::BlobStore(e.to_string())
}
