//! Flat similarity index over a batch of embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::squared_euclidean;
use crate::error::{EmbeddingError, Result};
use crate::{Embedding, EmbeddingBatch};

/// A single nearest-neighbor hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Squared Euclidean distance from the query.
    pub distance: f32,

    /// Position of the matched vector in the indexed batch.
    pub index: usize,
}

/// A flat similarity index.
///
/// Every query is compared against every stored vector; there is no
/// approximate structure. `build` replaces the stored batch wholesale, so
/// exactly one batch is live at a time.
#[derive(Debug, Default)]
pub struct FlatIndex {
    /// Indexed vectors; `None` until the first `build`.
    vectors: Option<EmbeddingBatch>,

    /// Dimensionality shared by all indexed vectors.
    dimension: usize,
}

impl FlatIndex {
    /// Create an empty, unbuilt index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents with a fresh batch.
    ///
    /// All vectors in the batch must share one dimensionality; the first
    /// vector sets it.
    pub fn build(&mut self, batch: EmbeddingBatch) -> Result<()> {
        let dimension = batch.first().map_or(0, Vec::len);
        for vector in &batch {
            if vector.len() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }

        debug!("Built flat index over {} vectors", batch.len());
        self.vectors = Some(batch);
        self.dimension = dimension;
        Ok(())
    }

    /// Whether `build` has been called.
    pub fn is_built(&self) -> bool {
        self.vectors.is_some()
    }

    /// Get the number of indexed vectors.
    pub fn len(&self) -> usize {
        self.vectors.as_ref().map_or(0, Vec::len)
    }

    /// Check if the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the dimensionality of the indexed vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Search for the `top_k` nearest vectors by squared Euclidean distance.
    ///
    /// Results are sorted ascending by distance, ties broken by ascending
    /// index. A `top_k` larger than the corpus returns the whole corpus.
    pub fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchHit>> {
        let vectors = self.vectors.as_ref().ok_or(EmbeddingError::NotBuilt)?;

        if !vectors.is_empty() && query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<(OrderedFloat<f32>, usize)> = Vec::with_capacity(vectors.len());
        for (index, vector) in vectors.iter().enumerate() {
            let distance = squared_euclidean(query, vector)?;
            hits.push((OrderedFloat(distance), index));
        }

        // Tuple order: distance first, then original index for stable ties.
        hits.sort();

        Ok(hits
            .into_iter()
            .take(top_k)
            .map(|(distance, index)| SearchHit {
                distance: distance.0,
                index,
            })
            .collect())
    }
}
