//! Local filesystem implementation of `ObjectStore`.
//! A bucket is a directory under the configured root; an object is a file
//! named by its key. Keys never contain path separators here; they are
//! `{user}-{post}-00{ext}` strings derived upstream.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use domains::{ObjectStore, PipelineError, PipelineResult};

pub struct LocalObjectStore {
    /// Root directory for all buckets (e.g., "./data/objects")
    root_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root_path.join(bucket).join(key)
    }

    fn storage_err(action: &str, path: &Path, err: std::io::Error) -> PipelineError {
        PipelineError::Storage(format!("{action} {}: {err}", path.display()))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> PipelineResult<()> {
        let path = self.object_path(bucket, key);
        let parent = self.root_path.join(bucket);
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| Self::storage_err("create bucket dir", &parent, e))?;
        fs::write(&path, &bytes)
            .await
            .map_err(|e| Self::storage_err("write", &path, e))
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> PipelineResult<()> {
        let path = self.object_path(bucket, key);
        fs::remove_file(&path)
            .await
            .map_err(|e| Self::storage_err("remove", &path, e))
    }

    async fn bucket_exists(&self, bucket: &str) -> PipelineResult<bool> {
        Ok(fs::metadata(self.root_path.join(bucket))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn make_bucket(&self, bucket: &str) -> PipelineResult<()> {
        let path = self.root_path.join(bucket);
        fs::create_dir_all(&path)
            .await
            .map_err(|e| Self::storage_err("create bucket", &path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_read_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf());

        assert!(!store.bucket_exists("attachments").await.unwrap());
        store.make_bucket("attachments").await.unwrap();
        assert!(store.bucket_exists("attachments").await.unwrap());

        store
            .put_object("attachments", "a-b-00.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        let on_disk = dir.path().join("attachments").join("a-b-00.jpg");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"jpeg");

        store.remove_object("attachments", "a-b-00.jpg").await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn removing_a_missing_object_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf());
        let err = store.remove_object("attachments", "gone.jpg").await.unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
    }
}
