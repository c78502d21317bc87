use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::EmbeddingService;
use crate::domain::{
    DomainError, EmbeddingConfig, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_MAX_BATCH_SIZE,
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const EMBEDDINGS_PATH: &str = "/v1/embeddings";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Embeddings from the OpenAI `/v1/embeddings` endpoint, or any server that
/// speaks the same protocol.
///
/// A whole batch is sent as one request. Items in the response are put back
/// in input order using their `index` field.
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    api_key: String,
    url: String,
    config: EmbeddingConfig,
}

impl OpenAiEmbedding {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        config: EmbeddingConfig,
    ) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{EMBEDDINGS_PATH}", base.trim_end_matches('/'));
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            url,
            config,
        }
    }

    /// `OPENAI_API_KEY` is required. `OPENAI_BASE_URL`,
    /// `OPENAI_EMBEDDING_MODEL` and `VECTOR_DIMENSION` override the defaults.
    pub fn from_env() -> Result<Self, DomainError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| DomainError::validation("OPENAI_API_KEY is not set"))?;
        let base = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
        let model = std::env::var("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());
        let dimensions = match std::env::var("VECTOR_DIMENSION") {
            Ok(raw) => raw.parse().map_err(|_| {
                DomainError::validation(format!("VECTOR_DIMENSION is not a number: {}", raw))
            })?,
            Err(_) => DEFAULT_EMBEDDING_DIMENSIONS,
        };

        Ok(Self::new(
            api_key,
            base,
            EmbeddingConfig::new(model, dimensions, DEFAULT_MAX_BATCH_SIZE),
        ))
    }
}

/// Reorders response items by `index` and checks every input got exactly one.
fn into_positional(expected: usize, mut items: Vec<EmbeddingItem>) -> Result<Vec<Vec<f32>>, DomainError> {
    if items.len() != expected {
        return Err(DomainError::provider(format!(
            "Embedding provider returned {} vectors for {} inputs",
            items.len(),
            expected
        )));
    }

    items.sort_by_key(|item| item.index);
    for (position, item) in items.iter().enumerate() {
        if item.index != position {
            return Err(DomainError::provider(format!(
                "Embedding provider response is missing index {}",
                position
            )));
        }
    }

    Ok(items.into_iter().map(|item| item.embedding).collect())
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::provider("Embedding provider returned no vector"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.config.model_name(),
            input: texts,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::provider(format!("OpenAiEmbedding: request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAiEmbedding: API returned {status}: {body}");
            return Err(DomainError::provider(format!(
                "OpenAiEmbedding: API returned {status}"
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            DomainError::provider(format!("OpenAiEmbedding: failed to parse response: {e}"))
        })?;

        let vectors = into_positional(texts.len(), parsed.data)?;
        debug!(
            "Embedded {} texts with {}",
            vectors.len(),
            self.config.model_name()
        );
        Ok(vectors)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: usize, value: f32) -> EmbeddingItem {
        EmbeddingItem {
            index,
            embedding: vec![value],
        }
    }

    #[test]
    fn test_response_items_are_reordered_by_index() {
        let vectors = into_positional(3, vec![item(2, 0.2), item(0, 0.0), item(1, 0.1)]).unwrap();

        assert_eq!(vectors, vec![vec![0.0], vec![0.1], vec![0.2]]);
    }

    #[test]
    fn test_wrong_count_is_provider_error() {
        let err = into_positional(2, vec![item(0, 0.0)]).unwrap_err();

        assert!(err.is_provider());
    }

    #[test]
    fn test_duplicate_index_is_provider_error() {
        let err = into_positional(2, vec![item(0, 0.0), item(0, 0.5)]).unwrap_err();

        assert!(err.is_provider());
    }

    #[test]
    fn test_response_parses_openai_shape() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.5,-0.5]}],"model":"text-embedding-3-small"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.data[0].embedding, vec![0.5, -0.5]);
    }
}
