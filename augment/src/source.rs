//! Document sources for candidate batches.
//!
//! A source materializes the ordered candidate documents a search call
//! runs over. How the text was originally produced is the source's
//! concern; the engine only sees the resulting strings.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{AugmentError, Result};

/// A source of candidate documents.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Materialize the ordered candidate documents.
    async fn fetch(&self) -> Result<Vec<String>>;
}

/// A source backed by in-memory strings.
pub struct StringSource {
    documents: Vec<String>,
}

impl StringSource {
    /// Create a source over the given documents.
    pub fn new(documents: Vec<String>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentSource for StringSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        Ok(self.documents.clone())
    }
}

/// A source that reads a UTF-8 text file and splits it into paragraphs.
///
/// Paragraphs are separated by blank lines; surrounding whitespace is
/// trimmed and empty paragraphs dropped.
pub struct TextFileSource {
    path: PathBuf,
}

impl TextFileSource {
    /// Create a source over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn split_paragraphs(text: &str) -> Vec<String> {
        text.split("\n\n")
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl DocumentSource for TextFileSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        let text = fs::read_to_string(&self.path).await.map_err(|e| {
            AugmentError::Source(format!("failed to read {}: {e}", self.path.display()))
        })?;

        Ok(Self::split_paragraphs(&text))
    }
}
