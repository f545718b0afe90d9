//! Content-addressed embedding cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::EmbeddingBatch;
use crate::error::Result;
use crate::provider::EmbeddingProvider;

/// Cache entry for one embedded batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content hash of the batch that produced these vectors.
    pub key: String,

    /// The embedding batch, index-aligned with the hashed contents.
    pub batch: EmbeddingBatch,
}

/// Cache for embedding batches to avoid redundant provider calls.
///
/// Keys are derived from batch content, so two batches with identical
/// contents in identical order hit the same entry. Entries are never
/// invalidated; they live for the process lifetime unless the backing
/// store is cleared externally.
///
/// Clones share the underlying store; concurrent access is synchronized
/// through the inner lock.
#[derive(Clone)]
pub struct EmbeddingCache {
    /// In-memory cache.
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Path for persistent cache storage.
    cache_path: Option<PathBuf>,
}

impl EmbeddingCache {
    /// Create a new in-memory cache.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            cache_path: None,
        }
    }

    /// Create a cache backed by a JSON file.
    ///
    /// An unreadable or corrupted file is treated as an empty cache, not an
    /// error; the next `put` rewrites it.
    pub async fn with_persistence(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let cache = Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            cache_path: Some(path.clone()),
        };

        if path.exists() {
            cache.load().await;
        }

        cache
    }

    /// Derive the cache key for a batch of document contents.
    ///
    /// SHA-256 over the contents in order, each framed by its byte length
    /// so that content, order, and count all change the key.
    pub fn content_key<S: AsRef<str>>(contents: &[S]) -> String {
        let mut hasher = Sha256::new();
        for content in contents {
            let bytes = content.as_ref().as_bytes();
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Get a batch from the cache. Returns `None` on miss, never errors.
    pub async fn get(&self, key: &str) -> Option<EmbeddingBatch> {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| e.batch.clone())
    }

    /// Put a batch in the cache, overwriting any entry for the same key.
    pub async fn put(&self, key: &str, batch: EmbeddingBatch) -> Result<()> {
        let entry = CacheEntry {
            key: key.to_string(),
            batch,
        };

        let mut entries = self.entries.write().await;
        entries.insert(entry.key.clone(), entry);
        debug!("Cached embedding batch for key {key}");

        if self.cache_path.is_some() {
            drop(entries); // Release lock before I/O
            self.save().await?;
        }

        Ok(())
    }

    /// Check if a key is cached.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Get the number of cached batches.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared embedding cache");
    }

    /// Save cache to disk.
    async fn save(&self) -> Result<()> {
        if let Some(ref path) = self.cache_path {
            let entries = self.entries.read().await;
            let values: Vec<&CacheEntry> = entries.values().collect();
            let content = serde_json::to_string(&values)?;

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }

            fs::write(path, content).await?;
            debug!("Saved {} cache entries to disk", values.len());
        }
        Ok(())
    }

    /// Load cache from disk, downgrading corruption to a fresh cache.
    async fn load(&self) {
        let Some(ref path) = self.cache_path else {
            return;
        };

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Unreadable embedding cache at {}: {e}", path.display());
                return;
            }
        };

        let parsed: Vec<CacheEntry> = match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Corrupted embedding cache at {}: {e}", path.display());
                return;
            }
        };

        let mut entries = self.entries.write().await;
        for entry in parsed {
            entries.insert(entry.key.clone(), entry);
        }

        info!("Loaded {} cache entries from disk", entries.len());
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// A wrapper that adds content-addressed caching to an embedding provider.
///
/// The cache is consulted before every provider call; on a hit the cached
/// batch is returned unchanged, on a miss the computed batch is stored
/// under the batch's content hash before being returned.
pub struct CachedEmbedder<P> {
    provider: P,
    cache: EmbeddingCache,
}

impl<P> CachedEmbedder<P>
where
    P: EmbeddingProvider,
{
    /// Create a new cached embedder.
    pub fn new(provider: P, cache: EmbeddingCache) -> Self {
        Self { provider, cache }
    }

    /// Embed a batch of texts, using the cache when possible.
    pub async fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<EmbeddingBatch> {
        let key = EmbeddingCache::content_key(texts);

        if let Some(batch) = self.cache.get(&key).await {
            debug!("Cache hit for batch of {} texts", texts.len());
            return Ok(batch);
        }

        let texts: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();
        let batch = self.provider.embed_batch(&texts).await?;
        self.cache.put(&key, batch.clone()).await?;

        Ok(batch)
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}
