//! Directory-backed thumbnail cache with atomic writes
//!
//! The cache is a flat key→(content, metadata) store under a single
//! configurable directory. Each entry is one content file named by the hex
//! content key plus an optional metadata sidecar holding the HTTP validators
//! and source URL. Entries are created on first fetch and replaced whole;
//! a reader never observes a partially written entry (temp file + rename).
//!
//! There is no eviction: thumbnails remain forever and the store grows
//! monotonically. Writers to the same key are serialized through a per-key
//! async lock; distinct keys read and write concurrently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::app::key::ContentKey;
use crate::app::models::{EntryMeta, Validators};
use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

/// Configuration for the cache store
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Cache directory (OS-specific default if None)
    pub cache_root: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { cache_root: None }
    }
}

/// Aggregate statistics over the cache directory
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of content entries
    pub entry_count: usize,
    /// Total size of content files in bytes
    pub total_bytes: u64,
}

/// Directory-backed key→(bytes, validators) store
#[derive(Debug)]
pub struct CacheStore {
    cache_root: PathBuf,
    /// Per-key write locks; concurrent writers to one key must not
    /// interleave bytes from two responses
    write_locks: Mutex<HashMap<ContentKey, Arc<Mutex<()>>>>,
}

impl CacheStore {
    /// Create a cache store, creating the directory if necessary
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        let cache_root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::default_cache_dir()?,
        };

        if !cache_root.exists() {
            fs::create_dir_all(&cache_root).await.map_err(|e| {
                error!("failed to create cache directory: {}", e);
                CacheError::DirectoryNotAccessible {
                    path: cache_root.clone(),
                }
            })?;
            debug!("created cache directory: {}", cache_root.display());
        }

        info!("cache store at {}", cache_root.display());

        Ok(Self {
            cache_root,
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    /// The cache root directory
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    fn default_cache_dir() -> CacheResult<PathBuf> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from("system cache directory"),
            })?
            .join("wallsync-thumbs");
        Ok(dir)
    }

    /// Path of the content file for a key
    pub fn content_path(&self, key: &ContentKey) -> PathBuf {
        self.cache_root.join(key.content_file_name())
    }

    fn meta_path(&self, key: &ContentKey) -> PathBuf {
        self.cache_root.join(key.meta_file_name())
    }

    /// Check whether an entry exists for the key
    pub fn exists(&self, key: &ContentKey) -> bool {
        self.content_path(key).exists()
    }

    /// Read an entry's bytes and validators
    ///
    /// Fails with `CacheError::NotFound` when no entry exists for the key.
    /// A missing or unreadable sidecar degrades to empty validators rather
    /// than failing the read.
    pub async fn read(&self, key: &ContentKey) -> CacheResult<(Vec<u8>, Validators)> {
        let path = self.content_path(key);
        if !path.exists() {
            return Err(CacheError::NotFound {
                key: key.to_hex(),
            });
        }

        let bytes = fs::read(&path).await?;
        let validators = self.validators_for(key).await;
        Ok((bytes, validators))
    }

    /// Validators stored for a key, or empty when absent
    pub async fn validators_for(&self, key: &ContentKey) -> Validators {
        match self.read_meta(key).await {
            Ok(Some(meta)) => meta.validators,
            Ok(None) => Validators::default(),
            Err(e) => {
                debug!("unreadable metadata sidecar for {}: {}", key, e);
                Validators::default()
            }
        }
    }

    async fn read_meta(&self, key: &ContentKey) -> CacheResult<Option<EntryMeta>> {
        let path = self.meta_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path).await?;
        let meta: EntryMeta = serde_json::from_slice(&raw)?;
        Ok(Some(meta))
    }

    /// Write an entry, fully replacing any prior content and metadata
    ///
    /// The content file is written to a temp path and renamed into place so
    /// concurrent readers never observe a torn entry; the sidecar follows.
    /// Writers to the same key are serialized, last writer wins.
    pub async fn write(
        &self,
        key: &ContentKey,
        bytes: &[u8],
        validators: &Validators,
        source_url: &str,
    ) -> CacheResult<()> {
        let lock = self.lock_for(key).await;
        let _guard = lock.lock().await;

        let final_path = self.content_path(key);
        let temp_path = self
            .cache_root
            .join(format!("{}{}", key.content_file_name(), files::TEMP_FILE_SUFFIX));

        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &final_path).await.map_err(|_| {
            CacheError::AtomicOperationFailed {
                temp_path: temp_path.clone(),
                final_path: final_path.clone(),
            }
        })?;

        let meta = EntryMeta {
            validators: validators.clone(),
            source_url: source_url.to_string(),
            fetched_at: Utc::now(),
        };
        let meta_final = self.meta_path(key);
        let meta_temp = self
            .cache_root
            .join(format!("{}{}", key.meta_file_name(), files::TEMP_FILE_SUFFIX));
        fs::write(&meta_temp, serde_json::to_vec_pretty(&meta)?).await?;
        fs::rename(&meta_temp, &meta_final)
            .await
            .map_err(|_| CacheError::AtomicOperationFailed {
                temp_path: meta_temp,
                final_path: meta_final,
            })?;

        debug!("cached {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn lock_for(&self, key: &ContentKey) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks.entry(*key).or_default().clone()
    }

    /// Entry count and total content size
    pub async fn stats(&self) -> CacheResult<CacheStats> {
        let mut stats = CacheStats::default();
        let mut entries = fs::read_dir(&self.cache_root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(files::CONTENT_FILE_SUFFIX)
                && !name.ends_with(files::META_FILE_SUFFIX)
            {
                stats.entry_count += 1;
                stats.total_bytes += entry.metadata().await?.len();
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, CacheStore) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(CacheConfig {
            cache_root: Some(dir.path().to_path_buf()),
        })
        .await
        .unwrap();
        (dir, store)
    }

    fn validators() -> Validators {
        Validators {
            etag: Some("\"abc123\"".to_string()),
            last_modified: Some("Wed, 21 Oct 2015 07:28:00 GMT".to_string()),
        }
    }

    /// Round-trip: write then read returns identical bytes and validators
    #[tokio::test]
    async fn test_write_read_round_trip() {
        let (_dir, store) = store().await;
        let key = ContentKey::from_identifier("Nature/sunset.jpg");

        store
            .write(&key, b"thumbnail-bytes", &validators(), "https://example.test/p")
            .await
            .unwrap();

        let (bytes, v) = store.read(&key).await.unwrap();
        assert_eq!(bytes, b"thumbnail-bytes");
        assert_eq!(v, validators());
    }

    #[tokio::test]
    async fn test_read_miss_is_not_found() {
        let (_dir, store) = store().await;
        let key = ContentKey::from_identifier("missing.jpg");

        match store.read(&key).await {
            Err(CacheError::NotFound { .. }) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_replaces_prior_entry() {
        let (_dir, store) = store().await;
        let key = ContentKey::from_identifier("a.jpg");

        store
            .write(&key, b"old", &Validators::default(), "https://example.test/a")
            .await
            .unwrap();
        store
            .write(&key, b"new", &validators(), "https://example.test/a")
            .await
            .unwrap();

        let (bytes, v) = store.read(&key).await.unwrap();
        assert_eq!(bytes, b"new");
        assert_eq!(v.etag.as_deref(), Some("\"abc123\""));
    }

    #[tokio::test]
    async fn test_validators_empty_without_sidecar() {
        let (dir, store) = store().await;
        let key = ContentKey::from_identifier("bare.jpg");

        // Content file without a sidecar, as an older cache may contain
        tokio::fs::write(dir.path().join(key.content_file_name()), b"x")
            .await
            .unwrap();

        assert!(store.exists(&key));
        assert!(store.validators_for(&key).await.is_empty());
        let (_, v) = store.read(&key).await.unwrap();
        assert!(v.is_empty());
    }

    #[tokio::test]
    async fn test_no_temp_files_remain_after_write() {
        let (dir, store) = store().await;
        let key = ContentKey::from_identifier("clean.jpg");
        store
            .write(&key, b"bytes", &Validators::default(), "https://example.test")
            .await
            .unwrap();

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(e) = entries.next_entry().await.unwrap() {
            names.push(e.file_name().to_string_lossy().to_string());
        }
        assert!(names.iter().all(|n| !n.ends_with(files::TEMP_FILE_SUFFIX)));
        assert_eq!(names.len(), 2); // content + sidecar
    }

    #[tokio::test]
    async fn test_concurrent_writers_to_one_key_do_not_tear() {
        let (_dir, store) = store().await;
        let store = Arc::new(store);
        let key = ContentKey::from_identifier("contended.jpg");

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let payload = vec![i; 4096];
                store
                    .write(&key, &payload, &Validators::default(), "https://example.test")
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Last writer wins; whichever it was, the entry is uniform
        let (bytes, _) = store.read(&key).await.unwrap();
        assert_eq!(bytes.len(), 4096);
        assert!(bytes.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_stats_counts_content_files_only() {
        let (_dir, store) = store().await;
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            let key = ContentKey::from_identifier(name);
            store
                .write(&key, b"12345", &Validators::default(), "https://example.test")
                .await
                .unwrap();
        }

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.total_bytes, 15);
    }
}
