use async_trait::async_trait;

use crate::domain::{DocumentChunk, DomainError};

/// Persistence for document chunks and their embeddings.
///
/// Every method is scoped by the owning `user_id`; there is no way to read or
/// write another user's chunks through this trait.
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    async fn save_batch(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError>;

    /// All chunks of a document, ordered by `chunk_index`.
    async fn find_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError>;

    /// Chunks of a document that currently carry an embedding, ordered by `chunk_index`.
    async fn find_embedded_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError>;

    /// Every chunk of the user that currently carries an embedding.
    async fn find_embedded_by_user(&self, user_id: &str) -> Result<Vec<DocumentChunk>, DomainError>;

    /// Returns `false` when no chunk with that id belongs to the user.
    async fn update_embedding(
        &self,
        chunk_id: &str,
        user_id: &str,
        embedding: &[f32],
    ) -> Result<bool, DomainError>;

    /// Nulls the embedding of every chunk of the document. Returns how many
    /// chunks had one.
    async fn clear_embeddings_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<u64, DomainError>;

    async fn count_by_user(&self, user_id: &str) -> Result<u64, DomainError>;
}
