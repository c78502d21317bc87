use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::current_timestamp;

/// A bounded slice of a document's text: the unit of embedding and retrieval.
///
/// `chunk_index` is assigned once at chunking time and is never renumbered.
/// `embedding` is either absent (never computed or invalidated) or a full
/// vector of the configured dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: String,
    document_id: String,
    user_id: String,
    chunk_index: u32,
    content: String,
    embedding: Option<Vec<f32>>,
    created_at: i64,
}

impl DocumentChunk {
    pub fn new(
        document_id: impl Into<String>,
        user_id: impl Into<String>,
        chunk_index: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            user_id: user_id.into(),
            chunk_index,
            content: content.into(),
            embedding: None,
            created_at: current_timestamp(),
        }
    }

    /// Rebuilds a chunk from persisted columns.
    pub fn reconstitute(
        id: String,
        document_id: String,
        user_id: String,
        chunk_index: u32,
        content: String,
        embedding: Option<Vec<f32>>,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            document_id,
            user_id,
            chunk_index,
            content,
            embedding,
            created_at,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn set_embedding(&mut self, embedding: Vec<f32>) {
        self.embedding = Some(embedding);
    }

    pub fn clear_embedding(&mut self) {
        self.embedding = None;
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// The first `max_chars` characters, with `...` appended when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    pub fn location(&self) -> String {
        format!("{}#{}", self.document_id, self.chunk_index)
    }
}
