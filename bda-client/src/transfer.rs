// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! File and string transfer helpers on top of any [`BlobStore`]

use bda_common::{BdaError, Result};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

use crate::BlobStore;

/// Check that an object is readable and return its size in bytes
pub async fn open_object(store: &dyn BlobStore, bucket: &str, key: &str) -> Result<usize> {
    let body = store.get(bucket, key).await?;
    log::info!("Opened {}/{} ({} bytes)", bucket, key, body.len());
    Ok(body.len())
}

/// Download an object into a local file.
///
/// Without a destination the key itself is used as the file path.
pub async fn download_to_file(
    store: &dyn BlobStore,
    bucket: &str,
    key: &str,
    destination: Option<&Path>,
) -> Result<PathBuf> {
    let destination = match destination {
        Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
        _ => PathBuf::from(key),
    };

    let body = store.get(bucket, key).await?;

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&destination, &body).await?;

    log::info!(
        "Downloaded {}/{} to {} ({} bytes)",
        bucket,
        key,
        destination.display(),
        body.len()
    );
    Ok(destination)
}

/// Upload a local file; the object key is the path as given.
///
/// `.` segments are dropped, so `./data.csv` is stored as `data.csv`.
pub async fn upload_file(store: &dyn BlobStore, bucket: &str, path: &Path) -> Result<String> {
    let key = object_key(path)?;

    let body = tokio::fs::read(path).await?;
    let size = body.len();
    store.put(bucket, &key, Bytes::from(body)).await?;

    log::info!("Uploaded {} to {}/{} ({} bytes)", path.display(), bucket, key, size);
    Ok(key)
}

/// Object key for a local path. Parent segments are rejected since they
/// have no meaning inside a bucket.
fn object_key(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                BdaError::InvalidArgument(format!("path {} is not valid UTF-8", path.display()))
            })?),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(BdaError::InvalidArgument(format!(
                    "path {} escapes its directory; upload it without '..'",
                    path.display()
                )))
            }
        }
    }

    if parts.is_empty() {
        return Err(BdaError::InvalidArgument(format!(
            "path {} does not name a file",
            path.display()
        )));
    }

    let key = parts.join("/");
    if path.has_root() {
        Ok(format!("/{}", key))
    } else {
        Ok(key)
    }
}

pub async fn upload_string(store: &dyn BlobStore, bucket: &str, key: &str, body: &str) -> Result<()> {
    store
        .put(bucket, key, Bytes::copy_from_slice(body.as_bytes()))
        .await?;
    log::info!("Uploaded {} bytes to {}/{}", body.len(), bucket, key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectStoreBlobStore;

    #[tokio::test]
    async fn test_upload_string_then_open() {
        let store = ObjectStoreBlobStore::in_memory();
        upload_string(&store, "tokopedia/cart/", "test.txt", "ini percobaan upload")
            .await
            .unwrap();

        let size = open_object(&store, "tokopedia/cart/", "test.txt").await.unwrap();
        assert_eq!(size, "ini percobaan upload".len());
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.csv");
        std::fs::write(&source, "id,total\n1,10\n").unwrap();

        let store = ObjectStoreBlobStore::in_memory();
        let key = upload_file(&store, "results", &source).await.unwrap();
        assert_eq!(key, source.to_str().unwrap());

        let destination = dir.path().join("out").join("copy.csv");
        let written = download_to_file(&store, "results", &key, Some(&destination))
            .await
            .unwrap();

        assert_eq!(written, destination);
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "id,total\n1,10\n");
    }

    #[tokio::test]
    async fn test_download_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStoreBlobStore::in_memory();
        let destination = dir.path().join("missing.txt");

        let err = download_to_file(&store, "results", "missing.txt", Some(&destination))
            .await
            .unwrap_err();

        assert!(matches!(err, BdaError::BlobNotFound { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn test_object_key_normalization() {
        assert_eq!(object_key(Path::new("./data.csv")).unwrap(), "data.csv");
        assert_eq!(object_key(Path::new("reports/./q1.csv")).unwrap(), "reports/q1.csv");
        assert_eq!(object_key(Path::new("/srv/out.csv")).unwrap(), "/srv/out.csv");
        assert!(matches!(
            object_key(Path::new("../secret.csv")),
            Err(BdaError::InvalidArgument(_))
        ));
        assert!(object_key(Path::new(".")).is_err());
    }

    #[tokio::test]
    async fn test_upload_current_dir_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), "id\n7\n").unwrap();

        // The key is relative, so the file has to be found from the working dir
        std::env::set_current_dir(dir.path()).unwrap();

        let store = ObjectStoreBlobStore::in_memory();
        let key = upload_file(&store, "results", Path::new("./data.csv"))
            .await
            .unwrap();

        assert_eq!(key, "data.csv");
        let body = store.get("results", "data.csv").await.unwrap();
        assert_eq!(&body[..], b"id\n7\n");
    }

    #[tokio::test]
    async fn test_upload_parent_path_rejected() {
        let store = ObjectStoreBlobStore::in_memory();
        let err = upload_file(&store, "results", Path::new("../data.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, BdaError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let store = ObjectStoreBlobStore::in_memory();
        let err = upload_file(&store, "results", Path::new("/definitely/not/here.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, BdaError::Io(_)));
    }
}
