use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{ChunkRepository, DocumentRepository};
use crate::domain::{Document, DocumentChunk, DomainError};

#[derive(Default)]
struct State {
    /// Document plus its insertion sequence, used to break `created_at` ties.
    documents: HashMap<String, (u64, Document)>,
    chunks: HashMap<String, DocumentChunk>,
    next_seq: u64,
}

/// Documents and chunks held in process memory.
///
/// Implements both repositories behind one lock so that deleting a document
/// and its chunks is a single step.
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_by_position(mut chunks: Vec<DocumentChunk>) -> Vec<DocumentChunk> {
    chunks.sort_by(|a, b| {
        (a.created_at(), a.document_id(), a.chunk_index()).cmp(&(
            b.created_at(),
            b.document_id(),
            b.chunk_index(),
        ))
    });
    chunks
}

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn save(&self, document: &Document) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state
            .documents
            .insert(document.id().to_string(), (seq, document.clone()));
        Ok(())
    }

    async fn find_by_id(&self, id: &str, user_id: &str) -> Result<Option<Document>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .documents
            .get(id)
            .map(|(_, doc)| doc)
            .filter(|doc| doc.is_owned_by(user_id))
            .cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Document>, DomainError> {
        let state = self.state.lock().await;
        let mut owned: Vec<&(u64, Document)> = state
            .documents
            .values()
            .filter(|(_, doc)| doc.is_owned_by(user_id))
            .collect();
        owned.sort_by(|(seq_a, a), (seq_b, b)| {
            (b.created_at(), seq_b).cmp(&(a.created_at(), seq_a))
        });
        Ok(owned.into_iter().map(|(_, doc)| doc.clone()).collect())
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        let owned = state
            .documents
            .get(id)
            .is_some_and(|(_, doc)| doc.is_owned_by(user_id));
        if !owned {
            return Ok(false);
        }

        state.documents.remove(id);
        let before = state.chunks.len();
        state.chunks.retain(|_, chunk| chunk.document_id() != id);

        debug!(
            "Deleted document {} and {} chunks from memory",
            id,
            before - state.chunks.len()
        );
        Ok(true)
    }
}

#[async_trait]
impl ChunkRepository for InMemoryStore {
    async fn save_batch(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        for chunk in chunks {
            state.chunks.insert(chunk.id().to_string(), chunk.clone());
        }
        debug!("Saved {} chunks to memory", chunks.len());
        Ok(())
    }

    async fn find_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let state = self.state.lock().await;
        let mut chunks: Vec<DocumentChunk> = state
            .chunks
            .values()
            .filter(|c| c.document_id() == document_id && c.is_owned_by(user_id))
            .cloned()
            .collect();
        chunks.sort_by_key(|c| c.chunk_index());
        Ok(chunks)
    }

    async fn find_embedded_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let mut chunks = self.find_by_document(document_id, user_id).await?;
        chunks.retain(|c| c.has_embedding());
        Ok(chunks)
    }

    async fn find_embedded_by_user(&self, user_id: &str) -> Result<Vec<DocumentChunk>, DomainError> {
        let state = self.state.lock().await;
        let chunks = state
            .chunks
            .values()
            .filter(|c| c.is_owned_by(user_id) && c.has_embedding())
            .cloned()
            .collect();
        Ok(sorted_by_position(chunks))
    }

    async fn update_embedding(
        &self,
        chunk_id: &str,
        user_id: &str,
        embedding: &[f32],
    ) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        match state.chunks.get_mut(chunk_id) {
            Some(chunk) if chunk.is_owned_by(user_id) => {
                chunk.set_embedding(embedding.to_vec());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_embeddings_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;
        let mut cleared = 0;
        for chunk in state.chunks.values_mut() {
            if chunk.document_id() == document_id
                && chunk.is_owned_by(user_id)
                && chunk.has_embedding()
            {
                chunk.clear_embedding();
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64, DomainError> {
        let state = self.state.lock().await;
        Ok(state.chunks.values().filter(|c| c.is_owned_by(user_id)).count() as u64)
    }
}
