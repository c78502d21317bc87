use async_trait::async_trait;

use crate::domain::{Document, DomainError};

/// Persistence for document metadata and text, scoped by owner.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn save(&self, document: &Document) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &str, user_id: &str) -> Result<Option<Document>, DomainError>;

    /// Newest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Document>, DomainError>;

    /// Removes the document and all of its chunks as one atomic unit.
    /// Returns `false` when the user owns no such document.
    async fn delete(&self, id: &str, user_id: &str) -> Result<bool, DomainError>;
}
