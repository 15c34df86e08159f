//! Content-addressed publication store
//!
//! `ContentStore` is the seam to the storage network: `put` is
//! content-addressed (identical bytes always return the same address and
//! are never stored twice), `pin` marks an address as required-to-retain.
//!
//! `DiskStore` is the local backend: SHA-256 addressed objects with
//! 2-character sharding, atomic tmp+rename writes, integrity verification
//! on read, and marker-file pins that protect objects from `gc`.

use crate::{Error, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store data, returning its content address. Idempotent.
    async fn put(&self, data: &[u8]) -> Result<String>;

    /// Fetch data by content address.
    async fn get(&self, address: &str) -> Result<Vec<u8>>;

    /// Mark an address as required-to-retain.
    async fn pin(&self, address: &str) -> Result<()>;
}

/// Public gateway URL for a content address.
pub fn gateway_url(base: &str, address: &str) -> String {
    format!("{}/ipfs/{}", base.trim_end_matches('/'), address)
}

/// Local content-addressed store
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("objects")).await?;
        fs::create_dir_all(root.join("pins")).await?;
        fs::create_dir_all(root.join("tmp")).await?;

        info!("Opened disk store at {:?}", root);
        Ok(Self { root })
    }

    /// Compute the content address of data
    pub fn address_of(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn object_path(&self, address: &str) -> PathBuf {
        // First 2 chars as subdirectory for sharding
        let (prefix, _) = address.split_at(2.min(address.len()));
        self.root.join("objects").join(prefix).join(address)
    }

    fn pin_path(&self, address: &str) -> PathBuf {
        self.root.join("pins").join(address)
    }

    pub async fn has(&self, address: &str) -> bool {
        self.object_path(address).exists()
    }

    pub async fn is_pinned(&self, address: &str) -> bool {
        self.pin_path(address).exists()
    }

    /// Delete every object without a pin marker. Returns (kept, deleted).
    pub async fn gc(&self) -> Result<(usize, usize)> {
        let mut kept = 0;
        let mut deleted = 0;

        for entry in walkdir::WalkDir::new(self.root.join("objects"))
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(address) = entry.file_name().to_str() else {
                continue;
            };
            if self.is_pinned(address).await {
                kept += 1;
            } else if let Err(e) = fs::remove_file(entry.path()).await {
                warn!(address, error = %e, "failed to delete unpinned object");
            } else {
                deleted += 1;
            }
        }

        info!(kept, deleted, "store gc complete");
        Ok((kept, deleted))
    }
}

#[async_trait]
impl ContentStore for DiskStore {
    async fn put(&self, data: &[u8]) -> Result<String> {
        let address = Self::address_of(data);

        if self.has(&address).await {
            debug!(address, "object already stored");
            return Ok(address);
        }

        let path = self.object_path(&address);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically via temp file
        let tmp_path = self.root.join("tmp").join(format!("{}.tmp", address));
        fs::write(&tmp_path, data).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!(address, bytes = data.len(), "stored object");
        Ok(address)
    }

    async fn get(&self, address: &str) -> Result<Vec<u8>> {
        let path = self.object_path(address);
        if !path.exists() {
            return Err(Error::NotFound {
                kind: "object".to_string(),
                id: address.to_string(),
            });
        }

        let data = fs::read(&path).await?;

        let actual = Self::address_of(&data);
        if actual != address {
            return Err(Error::IntegrityError(format!(
                "address mismatch: expected {}, got {}",
                address, actual
            )));
        }
        Ok(data)
    }

    async fn pin(&self, address: &str) -> Result<()> {
        if !self.has(address).await {
            return Err(Error::NotFound {
                kind: "object".to_string(),
                id: address.to_string(),
            });
        }
        fs::write(self.pin_path(address), b"").await?;
        debug!(address, "pinned object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::open(tmp.path()).await.unwrap();

        let data = b"[Interface]\nPrivateKey = ...";
        let address = store.put(data).await.unwrap();

        assert!(store.has(&address).await);
        assert_eq!(store.get(&address).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::open(tmp.path()).await.unwrap();

        let data = b"duplicate data";
        let first = store.put(data).await.unwrap();
        let second = store.put(data).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::open(tmp.path()).await.unwrap();

        let address = DiskStore::address_of(b"never stored");
        assert!(matches!(
            store.get(&address).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_integrity_check() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::open(tmp.path()).await.unwrap();

        let address = store.put(b"test data").await.unwrap();

        // Corrupt the object on disk
        fs::write(store.object_path(&address), b"corrupted").await.unwrap();
        assert!(matches!(
            store.get(&address).await,
            Err(Error::IntegrityError(_))
        ));
    }

    #[tokio::test]
    async fn test_pin_requires_object() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::open(tmp.path()).await.unwrap();

        let missing = DiskStore::address_of(b"missing");
        assert!(store.pin(&missing).await.is_err());

        let address = store.put(b"kept").await.unwrap();
        store.pin(&address).await.unwrap();
        assert!(store.is_pinned(&address).await);
    }

    #[tokio::test]
    async fn test_gc_retains_pinned_only() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::open(tmp.path()).await.unwrap();

        let pinned = store.put(b"pinned content").await.unwrap();
        store.pin(&pinned).await.unwrap();
        let unpinned = store.put(b"transient content").await.unwrap();

        let (kept, deleted) = store.gc().await.unwrap();
        assert_eq!((kept, deleted), (1, 1));
        assert!(store.has(&pinned).await);
        assert!(!store.has(&unpinned).await);
    }

    #[test]
    fn test_gateway_url() {
        assert_eq!(
            gateway_url("http://localhost:8081/", "Qmabc"),
            "http://localhost:8081/ipfs/Qmabc"
        );
        assert_eq!(
            gateway_url("https://gw.example.net", "Qmabc"),
            "https://gw.example.net/ipfs/Qmabc"
        );
    }
}
