use async_trait::async_trait;

use crate::domain::{DomainError, EmbeddingConfig};

/// Turns text into fixed-length vectors through an embedding model.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// One provider round trip for the whole batch. The output is positional:
    /// `result[i]` is the embedding of `texts[i]`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    fn config(&self) -> &EmbeddingConfig;

    fn validate(&self, vector: &[f32]) -> bool {
        self.config().validate(vector)
    }
}
