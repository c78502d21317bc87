use std::sync::Arc;

use crate::application::{ChunkRepository, DocumentRepository};
use crate::domain::{Document, DocumentChunk, DomainError};

/// Use case for browsing a user's documents and their chunks.
pub struct ListDocumentsUseCase {
    document_repo: Arc<dyn DocumentRepository>,
    chunk_repo: Arc<dyn ChunkRepository>,
}

impl ListDocumentsUseCase {
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        chunk_repo: Arc<dyn ChunkRepository>,
    ) -> Self {
        Self {
            document_repo,
            chunk_repo,
        }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Document>, DomainError> {
        self.document_repo.list_by_user(user_id).await
    }

    pub async fn get(&self, id: &str, user_id: &str) -> Result<Document, DomainError> {
        self.document_repo
            .find_by_id(id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Document not found: {}", id)))
    }

    pub async fn chunks(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        self.get(id, user_id).await?;
        self.chunk_repo.find_by_document(id, user_id).await
    }
}
