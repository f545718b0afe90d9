//! Embedding providers.
//!
//! Supports multiple interchangeable providers behind one trait; the
//! orchestrator is indifferent to which variant is plugged in.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::EmbeddingBatch;
use crate::error::{EmbeddingError, Result};

/// Trait for embedding providers.
///
/// A provider maps a batch of texts to an index-aligned batch of
/// fixed-dimension vectors: one vector per input, all of equal length.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Get the default result count for searches over this provider.
    fn default_top_k(&self) -> usize;

    /// Generate embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

#[async_trait]
impl<P> EmbeddingProvider for Box<P>
where
    P: EmbeddingProvider + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn default_model(&self) -> &str {
        (**self).default_model()
    }

    fn default_dimension(&self) -> usize {
        (**self).default_dimension()
    }

    fn default_top_k(&self) -> usize {
        (**self).default_top_k()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        (**self).embed_batch(texts).await
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Check that a provider response lines up with its input batch.
fn validate_batch(expected_len: usize, batch: &EmbeddingBatch) -> Result<()> {
    if batch.len() != expected_len {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {expected_len} embeddings, got {}",
            batch.len()
        )));
    }

    let dimension = batch.first().map_or(0, Vec::len);
    if expected_len > 0 && dimension == 0 {
        return Err(EmbeddingError::EmptyResponse(
            "provider returned zero-length vectors".to_string(),
        ));
    }

    for vector in batch {
        if vector.len() != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
    }

    Ok(())
}

/// OpenAI embedding provider.
///
/// Also covers self-hosted endpoints that speak the OpenAI embeddings
/// schema; point `with_base_url` at them.
pub struct OpenAiEmbeddings {
    /// API key.
    api_key: String,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model identifier.
    model: String,
}

impl OpenAiEmbeddings {
    /// Create a new OpenAI provider.
    ///
    /// The API key is validated here; a blank key fails immediately rather
    /// than on first use.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "text-embedding-3-small".to_string(),
        })
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn default_dimension(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }

    fn default_top_k(&self) -> usize {
        2
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Generating {} embeddings with model: {}",
            texts.len(),
            self.model
        );

        let body = serde_json::json!({
            "input": texts,
            "model": self.model
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let mut result: OpenAiEmbeddingResponse = response.json().await?;

        if result.data.is_empty() {
            return Err(EmbeddingError::EmptyResponse(
                "no embeddings in response".to_string(),
            ));
        }

        // The API does not guarantee row order; realign by index.
        result.data.sort_by_key(|item| item.index);
        let batch: EmbeddingBatch = result.data.into_iter().map(|item| item.embedding).collect();

        validate_batch(texts.len(), &batch)?;
        info!("Generated {} embeddings", batch.len());

        Ok(batch)
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Cohere embedding provider.
pub struct CohereEmbeddings {
    /// API key.
    api_key: String,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model identifier.
    model: String,

    /// Input type hint sent with every request.
    input_type: String,
}

impl CohereEmbeddings {
    /// Create a new Cohere provider.
    ///
    /// The API key is validated here; a blank key fails immediately rather
    /// than on first use.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::NotConfigured(
                "Cohere API key is required".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            base_url: "https://api.cohere.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "embed-english-v3.0".to_string(),
            input_type: "search_document".to_string(),
        })
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the input type hint (e.g. `search_document`, `search_query`).
    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = input_type.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for CohereEmbeddings {
    fn name(&self) -> &str {
        "cohere"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn default_dimension(&self) -> usize {
        match self.model.as_str() {
            "embed-english-v3.0" => 1024,
            "embed-english-light-v3.0" => 384,
            "embed-multilingual-v3.0" => 1024,
            _ => 1024,
        }
    }

    fn default_top_k(&self) -> usize {
        3
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Generating {} embeddings with model: {}",
            texts.len(),
            self.model
        );

        let body = serde_json::json!({
            "texts": texts,
            "model": self.model,
            "input_type": self.input_type
        });

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: CohereEmbeddingResponse = response.json().await?;

        if result.embeddings.is_empty() {
            return Err(EmbeddingError::EmptyResponse(
                "no embeddings in response".to_string(),
            ));
        }

        validate_batch(texts.len(), &result.embeddings)?;
        info!("Generated {} embeddings", result.embeddings.len());

        Ok(result.embeddings)
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Cohere API response format.
#[derive(Debug, Deserialize)]
struct CohereEmbeddingResponse {
    embeddings: EmbeddingBatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_blank_api_key_rejected_at_construction() {
        assert!(matches!(
            OpenAiEmbeddings::new("  "),
            Err(EmbeddingError::NotConfigured(_))
        ));
        assert!(matches!(
            CohereEmbeddings::new(""),
            Err(EmbeddingError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_openai_default_dimensions() {
        let provider = OpenAiEmbeddings::new("key")
            .unwrap()
            .with_model("text-embedding-3-large");
        assert_eq!(provider.default_dimension(), 3072);
    }

    #[test]
    fn test_validate_batch_rejects_length_mismatch() {
        let batch = vec![vec![1.0, 2.0]];
        assert!(matches!(
            validate_batch(2, &batch),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_validate_batch_rejects_ragged_rows() {
        let batch = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            validate_batch(2, &batch),
            Err(EmbeddingError::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_openai_embed_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-3-small"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "model": "text-embedding-3-small",
                "data": [
                    { "object": "embedding", "index": 1, "embedding": [3.0, 4.0] },
                    { "object": "embedding", "index": 0, "embedding": [1.0, 2.0] }
                ]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddings::new("test-key")
            .unwrap()
            .with_base_url(server.uri());

        let batch = provider
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        // Rows come back realigned by index despite the shuffled response.
        assert_eq!(batch, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[tokio::test]
    async fn test_openai_empty_data_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "model": "text-embedding-3-small",
                "data": []
            })))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddings::new("test-key")
            .unwrap()
            .with_base_url(server.uri());

        let result = provider.embed_batch(&["text".to_string()]).await;
        assert!(matches!(result, Err(EmbeddingError::EmptyResponse(_))));
    }

    #[tokio::test]
    async fn test_openai_api_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddings::new("bad-key")
            .unwrap()
            .with_base_url(server.uri());

        let result = provider.embed_batch(&["text".to_string()]).await;
        assert!(matches!(result, Err(EmbeddingError::ApiRequest(_))));
    }

    #[tokio::test]
    async fn test_cohere_embed_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_partial_json(serde_json::json!({
                "input_type": "search_document"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 2.0], [3.0, 4.0]]
            })))
            .mount(&server)
            .await;

        let provider = CohereEmbeddings::new("test-key")
            .unwrap()
            .with_base_url(server.uri());

        let batch = provider
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(batch, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[tokio::test]
    async fn test_boxed_provider_delegates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "model": "text-embedding-3-small",
                "data": [{ "object": "embedding", "index": 0, "embedding": [1.0] }]
            })))
            .mount(&server)
            .await;

        let provider: Box<dyn EmbeddingProvider> = Box::new(
            OpenAiEmbeddings::new("test-key")
                .unwrap()
                .with_base_url(server.uri()),
        );

        assert_eq!(provider.name(), "openai");
        let batch = provider.embed_batch(&["text".to_string()]).await.unwrap();
        assert_eq!(batch.len(), 1);
    }
}
