use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

/// Deterministic offline embeddings: each text seeds its own unit vector.
///
/// Identical texts embed identically; unrelated texts land close to
/// orthogonal once the dimension is large enough.
pub struct MockEmbedding {
    config: EmbeddingConfig,
    output_dimensions: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(384)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), dimensions, 512),
            output_dimensions: dimensions,
        }
    }

    /// Emit vectors of `dimensions` values while still advertising the
    /// configured dimension, the way a misconfigured provider would.
    pub fn with_output_dimensions(mut self, dimensions: usize) -> Self {
        self.output_dimensions = dimensions;
        self
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut vector: Vec<f32> = (0..self.output_dimensions)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.generate_embedding(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let vectors: Vec<Vec<f32>> = texts.iter().map(|t| self.generate_embedding(t)).collect();
        debug!("Generated {} mock embeddings", vectors.len());
        Ok(vectors)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_consistency() {
        let service = MockEmbedding::new();

        let embedding1 = service.embed("hello world").await.unwrap();
        let embedding2 = service.embed("hello world").await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_batch_matches_single_and_keeps_order() {
        let service = MockEmbedding::with_dimensions(64);
        let texts = vec!["b".to_string(), "a".to_string()];

        let batch = service.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], service.embed("b").await.unwrap());
        assert_eq!(batch[1], service.embed("a").await.unwrap());
        assert!(batch.iter().all(|v| service.validate(v)));
    }

    #[tokio::test]
    async fn test_mock_embedding_normalized() {
        let service = MockEmbedding::new();

        let embedding = service.embed("test").await.unwrap();
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

        assert!((magnitude - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_output_dimension_override_fails_validation() {
        let service = MockEmbedding::with_dimensions(8).with_output_dimensions(4);

        let embedding = service.embed("x").await.unwrap();

        assert_eq!(embedding.len(), 4);
        assert!(!service.validate(&embedding));
    }
}
