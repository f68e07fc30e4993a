//! Content-addressed blob storage
//!
//! Stores attachment payloads using the SHA-256 hash as key.
//! Files are organized in a two-level directory structure so no single
//! directory grows unbounded.
//!
//! Example: hash "abcd1234..." is stored at "blobs/ab/cd/abcd1234..."

use crate::error::{AppError, Result};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Content-addressed blob store
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a new blob store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the blob store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Blob store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Write data to the store, returns its SHA-256 hash.
    ///
    /// Writing the same bytes twice is a cheap no-op returning the
    /// existing hash. Empty payloads are valid.
    pub async fn write(&self, data: &[u8]) -> Result<String> {
        let hash = calculate_hash(data);

        if self.exists(&hash).await? {
            tracing::debug!("Blob already exists: {}", hash);
            return Ok(hash);
        }

        let path = self.get_path(&hash);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to temp file first, then rename (atomic on the same fs)
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(temp_path, &path).await?;

        tracing::debug!("Wrote blob: {} ({} bytes)", hash, data.len());

        Ok(hash)
    }

    /// Read data from the store
    pub async fn read(&self, hash: &str) -> Result<Vec<u8>> {
        let path = self.get_path(hash);

        if !path.exists() {
            return Err(AppError::BlobStore(format!("Blob not found: {}", hash)));
        }

        let mut file = fs::File::open(&path).await?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;

        Ok(data)
    }

    /// Check if a blob exists
    pub async fn exists(&self, hash: &str) -> Result<bool> {
        Ok(self.get_path(hash).exists())
    }

    /// Delete a blob (deleting an absent hash is not an error)
    pub async fn delete(&self, hash: &str) -> Result<()> {
        let path = self.get_path(hash);

        if !path.exists() {
            return Ok(());
        }

        fs::remove_file(&path).await?;

        tracing::debug!("Deleted blob: {}", hash);

        Ok(())
    }

    /// Get file path for a hash
    fn get_path(&self, hash: &str) -> PathBuf {
        // Hashes shorter than the fan-out prefix land directly under root
        if hash.len() < 4 {
            return self.root.join(hash);
        }
        self.root.join(&hash[0..2]).join(&hash[2..4]).join(hash)
    }
}

/// SHA-256 hash of data as lowercase hex
pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (BlobStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path().join("blobs"));
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (store, _temp) = create_test_store().await;

        let data = b"attachment payload";
        let hash = store.write(data).await.unwrap();
        assert_eq!(hash.len(), 64);

        let read_data = store.read(&hash).await.unwrap();
        assert_eq!(read_data, data);
    }

    #[tokio::test]
    async fn test_empty_payload_roundtrip() {
        let (store, _temp) = create_test_store().await;

        let hash = store.write(b"").await.unwrap();
        let read_data = store.read(&hash).await.unwrap();
        assert!(read_data.is_empty());
    }

    #[tokio::test]
    async fn test_content_addressing_is_idempotent() {
        let (store, _temp) = create_test_store().await;

        let hash1 = store.write(b"same bytes").await.unwrap();
        let hash2 = store.write(b"same bytes").await.unwrap();
        assert_eq!(hash1, hash2);
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let (store, _temp) = create_test_store().await;

        let hash = store.write(b"to delete").await.unwrap();
        store.delete(&hash).await.unwrap();
        assert!(!store.exists(&hash).await.unwrap());

        // Second delete is a no-op
        store.delete(&hash).await.unwrap();
    }

    #[tokio::test]
    async fn test_two_level_directory_structure() {
        let (store, _temp) = create_test_store().await;

        let hash = store.write(b"fanout").await.unwrap();
        let path = store.get_path(&hash);

        let parent = path.parent().unwrap();
        let grandparent = parent.parent().unwrap();

        assert_eq!(parent.file_name().unwrap(), &hash[2..4]);
        assert_eq!(grandparent.file_name().unwrap(), &hash[0..2]);
    }
}
