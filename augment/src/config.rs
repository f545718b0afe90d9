//! Configuration for the augmented search engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ragcore_embeddings::{CohereEmbeddings, EmbeddingProvider, OpenAiEmbeddings};

use crate::error::{AugmentError, Result};

/// Configuration for the augmented search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentConfig {
    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// Default number of results when a call does not specify one.
    /// Falls back to the provider default when unset.
    pub top_k: Option<usize>,

    /// Cache configuration.
    pub cache: CacheConfig,
}

impl AugmentConfig {
    /// Create a configuration for the given provider settings.
    pub fn new(embedding: EmbeddingConfig) -> Self {
        Self {
            embedding,
            top_k: None,
            cache: CacheConfig::default(),
        }
    }

    /// Set the instance-level default top-k.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the cache configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which provider to use.
    pub provider: EmbeddingProviderKind,

    /// API key for the provider.
    pub api_key: Option<String>,

    /// Model to use; provider default when unset.
    pub model: Option<String>,

    /// Base URL override for self-hosted or compatible endpoints.
    pub base_url: Option<String>,
}

impl EmbeddingConfig {
    /// Create a configuration for the given provider kind.
    pub fn new(provider: EmbeddingProviderKind) -> Self {
        Self {
            provider,
            api_key: None,
            model: None,
            base_url: None,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// OpenAI embeddings API (and compatible endpoints).
    OpenAi,
    /// Cohere embeddings API.
    Cohere,
}

/// Configuration for the embedding cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path for persistent storage; in-memory only when unset.
    pub path: Option<PathBuf>,
}

/// Build a provider from configuration.
///
/// Credentials are validated here, not deferred to the first call.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| AugmentError::Config("embedding API key is required".to_string()))?;

    let provider: Box<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::OpenAi => {
            let mut provider = OpenAiEmbeddings::new(api_key)?;
            if let Some(model) = config.model.clone() {
                provider = provider.with_model(model);
            }
            if let Some(url) = config.base_url.clone() {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
        EmbeddingProviderKind::Cohere => {
            let mut provider = CohereEmbeddings::new(api_key)?;
            if let Some(model) = config.model.clone() {
                provider = provider.with_model(model);
            }
            if let Some(url) = config.base_url.clone() {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
    };

    Ok(provider)
}
