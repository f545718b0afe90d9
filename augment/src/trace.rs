//! Diagnostic trace side-channel for search calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

/// Shared map of diagnostic values recorded during search calls.
///
/// The engine writes the query embedding, resolved parameters, and raw
/// distances/indices here; callers hold a clone and inspect entries after
/// the call. This is a side channel for post-hoc inspection, not part of
/// the search return contract.
#[derive(Clone, Default)]
pub struct SearchTrace {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl SearchTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value under the given key, overwriting any previous one.
    pub async fn record(&self, key: impl Into<String>, value: Value) {
        self.entries.write().await.insert(key.into(), value);
    }

    /// Get a recorded value by key.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    /// Take a snapshot of all recorded values.
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.read().await.clone()
    }

    /// Check whether anything has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clear all recorded values.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
