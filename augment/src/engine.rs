//! Augmented search engine implementation.

use serde_json::json;
use tracing::{debug, info};

use ragcore_embeddings::cache::CachedEmbedder;
use ragcore_embeddings::error::EmbeddingError;
use ragcore_embeddings::{EmbeddingCache, EmbeddingProvider, FlatIndex, SearchHit};

use crate::config::{AugmentConfig, build_provider};
use crate::error::{AugmentError, Result};
use crate::source::DocumentSource;
use crate::trace::SearchTrace;

/// Augmented search engine.
///
/// Composes a cache-checked embedding provider with a flat vector index:
/// `search` embeds the candidate documents, rebuilds the index over them,
/// embeds the query, and maps the nearest-neighbor hits back to the
/// documents. Each engine exclusively owns its cache and index.
pub struct AugmentedSearch {
    /// Cache-checked embedding provider.
    embedder: CachedEmbedder<Box<dyn EmbeddingProvider>>,

    /// Vector index; `search` fails until one is attached.
    index: Option<FlatIndex>,

    /// Instance-level default result count.
    top_k: Option<usize>,

    /// Diagnostic trace written during each search.
    trace: SearchTrace,
}

impl AugmentedSearch {
    /// Create a builder around the given provider.
    pub fn builder(provider: Box<dyn EmbeddingProvider>) -> AugmentedSearchBuilder {
        AugmentedSearchBuilder::new(provider)
    }

    /// Create an engine from configuration.
    pub async fn from_config(config: AugmentConfig) -> Result<Self> {
        let provider = build_provider(&config.embedding)?;

        let cache = match &config.cache.path {
            Some(path) => EmbeddingCache::with_persistence(path).await,
            None => EmbeddingCache::new(),
        };

        info!("Initialized augmented search with {} provider", provider.name());

        Ok(Self {
            embedder: CachedEmbedder::new(provider, cache),
            index: Some(FlatIndex::new()),
            top_k: config.top_k,
            trace: SearchTrace::new(),
        })
    }

    /// Attach a vector index, replacing any existing one.
    pub fn set_index(&mut self, index: FlatIndex) {
        self.index = Some(index);
    }

    /// Get a handle to the diagnostic trace.
    pub fn trace(&self) -> SearchTrace {
        self.trace.clone()
    }

    /// Get the underlying embedding cache.
    pub fn cache(&self) -> &EmbeddingCache {
        self.embedder.cache()
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.embedder.provider()
    }

    /// Search `documents` for the closest matches to `query`.
    ///
    /// Runs strictly in sequence: embed the documents (cache-checked),
    /// rebuild the index over them, embed the query (cache-checked),
    /// search, then map hit indices back into `documents` preserving the
    /// distance order. Any step failure aborts the whole call.
    pub async fn search(
        &mut self,
        query: &str,
        documents: &[String],
        top_k: Option<usize>,
    ) -> Result<Vec<String>> {
        if self.index.is_none() {
            return Err(AugmentError::NotConfigured);
        }

        let top_k = self.resolve_top_k(top_k);
        debug!("Searching {} documents (top_k: {top_k})", documents.len());

        let document_batch = self.embedder.embed_batch(documents).await?;

        let index = self.index.as_mut().ok_or(AugmentError::NotConfigured)?;
        index.build(document_batch)?;

        let query_texts = [query.to_string()];
        let query_batch = self.embedder.embed_batch(&query_texts).await?;
        let query_embedding = query_batch.into_iter().next().ok_or_else(|| {
            AugmentError::Embedding(EmbeddingError::EmptyResponse(
                "no embedding returned for query".to_string(),
            ))
        })?;

        let hits = index.search(&query_embedding, top_k)?;

        self.trace
            .record(
                "search_params",
                json!({ "top_k": top_k, "query_embedding": query_embedding }),
            )
            .await;
        self.trace
            .record(
                "distances",
                json!(hits.iter().map(|hit| hit.distance).collect::<Vec<f32>>()),
            )
            .await;
        self.trace
            .record(
                "indices",
                json!(hits.iter().map(|hit| hit.index).collect::<Vec<usize>>()),
            )
            .await;

        let results = select_in_range(&hits, documents);
        info!("Search returned {} of {} documents", results.len(), documents.len());

        Ok(results)
    }

    /// Fetch candidates from a source, then search them.
    pub async fn search_source(
        &mut self,
        query: &str,
        source: &dyn DocumentSource,
        top_k: Option<usize>,
    ) -> Result<Vec<String>> {
        let documents = source.fetch().await?;
        self.search(query, &documents, top_k).await
    }

    /// Get engine statistics.
    pub async fn stats(&self) -> EngineStats {
        EngineStats {
            cached_batches: self.embedder.cache().len().await,
            indexed_vectors: self.index.as_ref().map_or(0, FlatIndex::len),
        }
    }

    /// Resolve the effective result count: explicit argument, then the
    /// instance default, then the provider default, floored at one.
    /// A zero is treated as unset at every level.
    fn resolve_top_k(&self, explicit: Option<usize>) -> usize {
        explicit
            .filter(|k| *k > 0)
            .or_else(|| self.top_k.filter(|k| *k > 0))
            .unwrap_or_else(|| self.embedder.provider().default_top_k())
            .max(1)
    }
}

/// Map hits back to their documents, dropping any out-of-range position.
///
/// A flat index only reports positions inside the batch it was built from,
/// but other index implementations use sentinel positions for "no match";
/// those are dropped silently, never surfaced as an error.
fn select_in_range(hits: &[SearchHit], documents: &[String]) -> Vec<String> {
    hits.iter()
        .filter(|hit| hit.index < documents.len())
        .map(|hit| documents[hit.index].clone())
        .collect()
}

/// Builder for the augmented search engine.
pub struct AugmentedSearchBuilder {
    provider: Box<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    index: Option<FlatIndex>,
    top_k: Option<usize>,
    trace: Option<SearchTrace>,
}

impl AugmentedSearchBuilder {
    /// Create a builder with an in-memory cache and a fresh index.
    pub fn new(provider: Box<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(),
            index: Some(FlatIndex::new()),
            top_k: None,
            trace: None,
        }
    }

    /// Use the given cache (e.g. one with persistence).
    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = cache;
        self
    }

    /// Use the given index instead of a fresh one.
    pub fn with_index(mut self, index: FlatIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Leave the engine without an index; `set_index` must be called
    /// before the first search.
    pub fn without_index(mut self) -> Self {
        self.index = None;
        self
    }

    /// Set the instance-level default result count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Share a caller-held trace for post-hoc inspection.
    pub fn with_trace(mut self, trace: SearchTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Build the engine.
    pub fn build(self) -> AugmentedSearch {
        AugmentedSearch {
            embedder: CachedEmbedder::new(self.provider, self.cache),
            index: self.index,
            top_k: self.top_k,
            trace: self.trace.unwrap_or_default(),
        }
    }
}

/// Statistics about the engine.
#[derive(Debug, Clone)]
pub struct EngineStats {
    /// Number of embedding batches held by the cache.
    pub cached_batches: usize,

    /// Number of vectors in the live index.
    pub indexed_vectors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use ragcore_embeddings::EmbeddingBatch;

    struct FixedProvider;

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn default_model(&self) -> &str {
            "fixed-1"
        }

        fn default_dimension(&self) -> usize {
            1
        }

        fn default_top_k(&self) -> usize {
            4
        }

        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> ragcore_embeddings::Result<EmbeddingBatch> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn engine() -> AugmentedSearch {
        AugmentedSearch::builder(Box::new(FixedProvider)).build()
    }

    #[test]
    fn test_resolve_top_k_explicit_wins() {
        let engine = AugmentedSearch::builder(Box::new(FixedProvider))
            .with_top_k(7)
            .build();
        assert_eq!(engine.resolve_top_k(Some(2)), 2);
    }

    #[test]
    fn test_resolve_top_k_falls_back_to_instance_default() {
        let engine = AugmentedSearch::builder(Box::new(FixedProvider))
            .with_top_k(7)
            .build();
        assert_eq!(engine.resolve_top_k(None), 7);
    }

    #[test]
    fn test_resolve_top_k_falls_back_to_provider_default() {
        assert_eq!(engine().resolve_top_k(None), 4);
    }

    #[test]
    fn test_resolve_top_k_treats_zero_as_unset() {
        let engine = AugmentedSearch::builder(Box::new(FixedProvider))
            .with_top_k(0)
            .build();
        assert_eq!(engine.resolve_top_k(Some(0)), 4);
    }

    #[test]
    fn test_select_in_range_drops_stray_positions() {
        let documents = vec!["a".to_string(), "b".to_string()];
        let hits = vec![
            SearchHit {
                distance: 0.1,
                index: 1,
            },
            SearchHit {
                distance: 0.2,
                index: 5,
            },
            SearchHit {
                distance: 0.3,
                index: 0,
            },
        ];

        let results = select_in_range(&hits, &documents);
        assert_eq!(results, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_search_without_index_fails() {
        let mut engine = AugmentedSearch::builder(Box::new(FixedProvider))
            .without_index()
            .build();

        let result = engine
            .search("query", &["doc".to_string()], Some(1))
            .await;
        assert!(matches!(result, Err(AugmentError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_set_index_makes_engine_searchable() {
        let mut engine = AugmentedSearch::builder(Box::new(FixedProvider))
            .without_index()
            .build();
        engine.set_index(FlatIndex::new());

        let results = engine
            .search("abc", &["abc".to_string(), "longer doc".to_string()], Some(1))
            .await
            .unwrap();
        assert_eq!(results, vec!["abc".to_string()]);
    }
}
