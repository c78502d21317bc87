use serde::{Deserialize, Serialize};

use super::DocumentChunk;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// A chunk paired with its cosine similarity to a query.
///
/// Lives only for the duration of one search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    chunk: DocumentChunk,
    score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: DocumentChunk, score: f32) -> Self {
        Self { chunk, score }
    }

    pub fn chunk(&self) -> &DocumentChunk {
        &self.chunk
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn into_chunk(self) -> DocumentChunk {
        self.chunk
    }

    pub fn display_line(&self) -> String {
        format!("{} (score: {:.3})", self.chunk.location(), self.score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    query: String,
    limit: usize,
    min_score: Option<f32>,
    max_score: Option<f32>,
    document_id: Option<String>,
    hybrid: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_SEARCH_LIMIT,
            min_score: Some(DEFAULT_SIMILARITY_THRESHOLD),
            max_score: None,
            document_id: None,
            hybrid: false,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        // Ensure at least 1 result is requested
        self.limit = limit.max(1);
        self
    }

    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn with_max_score(mut self, score: f32) -> Self {
        self.max_score = Some(score);
        self
    }

    pub fn within_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Require the query text to appear (case-insensitively) in each chunk
    /// before similarity ranking.
    pub fn with_hybrid(mut self, hybrid: bool) -> Self {
        self.hybrid = hybrid;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn min_score(&self) -> Option<f32> {
        self.min_score
    }

    pub fn max_score(&self) -> Option<f32> {
        self.max_score
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn is_hybrid(&self) -> bool {
        self.hybrid
    }

    /// Whether `score` falls inside the configured score window.
    pub fn accepts_score(&self, score: f32) -> bool {
        if !score.is_finite() {
            return false;
        }
        if self.min_score.is_some_and(|min| score < min) {
            return false;
        }
        if self.max_score.is_some_and(|max| score > max) {
            return false;
        }
        true
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("query=\"{}\"", self.query)];
        parts.push(format!("limit={}", self.limit));

        if let Some(score) = self.min_score {
            parts.push(format!("min_score={:.2}", score));
        }
        if let Some(score) = self.max_score {
            parts.push(format!("max_score={:.2}", score));
        }
        if let Some(ref doc) = self.document_id {
            parts.push(format!("document={}", doc));
        }
        if self.hybrid {
            parts.push("hybrid".to_string());
        }

        parts.join(", ")
    }
}
