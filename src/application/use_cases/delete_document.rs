use std::sync::Arc;

use tracing::info;

use crate::application::DocumentRepository;
use crate::domain::DomainError;

/// Use case for deleting a document together with its chunks.
pub struct DeleteDocumentUseCase {
    document_repo: Arc<dyn DocumentRepository>,
}

impl DeleteDocumentUseCase {
    pub fn new(document_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { document_repo }
    }

    pub async fn execute(&self, id: &str, user_id: &str) -> Result<(), DomainError> {
        let document = self
            .document_repo
            .find_by_id(id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Document not found: {}", id)))?;

        info!("Deleting document: {} ({})", document.original_name(), id);

        if !self.document_repo.delete(id, user_id).await? {
            return Err(DomainError::not_found(format!("Document not found: {}", id)));
        }

        info!("Document deleted successfully");

        Ok(())
    }
}
