//! # Augmented Search
//!
//! This crate provides the orchestration layer for augmented retrieval:
//! it embeds a candidate document batch, builds a flat vector index over
//! it, embeds the query, and returns the closest documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Augmented Search Engine                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  DocumentSource ──► AugmentedSearch ──► ranked documents        │
//! │                          │                                      │
//! │            ┌─────────────┼─────────────┐                        │
//! │            ▼             ▼             ▼                        │
//! │     CachedEmbedder   FlatIndex    SearchTrace                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ragcore_augment::{AugmentConfig, AugmentedSearch};
//!
//! let mut engine = AugmentedSearch::from_config(config).await?;
//! let matches = engine.search("Which animal is fastest?", &documents, None).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod source;
pub mod trace;

pub use config::{AugmentConfig, CacheConfig, EmbeddingConfig, EmbeddingProviderKind, build_provider};
pub use engine::{AugmentedSearch, EngineStats};
pub use error::{AugmentError, Result};
pub use source::{DocumentSource, StringSource, TextFileSource};
pub use trace::SearchTrace;

// Re-export from dependencies for convenience
pub use ragcore_embeddings::{EmbeddingCache, EmbeddingProvider, FlatIndex, SearchHit};
