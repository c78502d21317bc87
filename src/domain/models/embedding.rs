use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 2048;

/// Configuration for the embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    model_name: String,
    dimensions: usize,
    /// Upper bound on inputs per provider request.
    max_batch_size: usize,
}

impl EmbeddingConfig {
    pub fn new(model_name: String, dimensions: usize, max_batch_size: usize) -> Self {
        Self {
            model_name,
            dimensions,
            max_batch_size,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// True iff the vector has exactly the configured dimension and every
    /// component is a finite number.
    pub fn validate(&self, vector: &[f32]) -> bool {
        vector.len() == self.dimensions && vector.iter().all(|v| v.is_finite())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}
