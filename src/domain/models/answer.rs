use serde::{Deserialize, Serialize};

use super::DocumentChunk;

pub const SOURCE_PREVIEW_CHARS: usize = 200;

/// Where part of an answer came from. Similarity scores are deliberately
/// not part of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAttribution {
    pub chunk_id: String,
    pub document_id: String,
    pub chunk_index: u32,
    pub content_preview: String,
}

impl SourceAttribution {
    /// The preview is the first 200 characters followed by `...`, always.
    pub fn from_chunk(chunk: &DocumentChunk) -> Self {
        let head: String = chunk.content().chars().take(SOURCE_PREVIEW_CHARS).collect();
        Self {
            chunk_id: chunk.id().to_string(),
            document_id: chunk.document_id().to_string(),
            chunk_index: chunk.chunk_index(),
            content_preview: format!("{head}..."),
        }
    }
}

/// A generated answer plus the chunks it was grounded on, in ranked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub response: String,
    pub sources: Vec<SourceAttribution>,
}

impl RagAnswer {
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}
