//! # Embeddings
//!
//! This crate provides cached embedding generation and flat vector
//! similarity search for the augmented retrieval system.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text batches to dense vectors
//! - **Content-Addressed Caching**: Skip provider calls for identical content
//! - **Flat Similarity Search**: Exact nearest-neighbor lookup over a batch
//! - **Multiple Providers**: OpenAI-compatible and Cohere endpoints
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Embeddings System                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► CachedEmbedder ──► EmbeddingBatch        │
//! │       │                     │                  │                │
//! │       ▼                     ▼                  ▼                │
//! │  OpenAI/Cohere        EmbeddingCache       FlatIndex            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod distance;
pub mod error;
pub mod index;
pub mod provider;

pub use cache::{CachedEmbedder, EmbeddingCache};
pub use distance::{cosine_similarity, normalize, squared_euclidean};
pub use error::{EmbeddingError, Result};
pub use index::{FlatIndex, SearchHit};
pub use provider::{CohereEmbeddings, EmbeddingProvider, OpenAiEmbeddings};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// An ordered batch of embeddings, row *i* corresponding to input *i*.
pub type EmbeddingBatch = Vec<Embedding>;
