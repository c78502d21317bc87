use async_trait::async_trait;

use crate::domain::{ChatRequest, DomainError};

/// An interface for sending chat-style prompts to an LLM and receiving text responses.
///
/// Implementors encapsulate transport, serialization, and vendor-specific API
/// details. The model identifier belongs to the implementor; the request
/// carries the turns and sampling limits.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns the generated text. A provider response without content is an
    /// empty string, not an error.
    async fn complete(&self, request: &ChatRequest) -> Result<String, DomainError>;

    fn model_name(&self) -> &str;
}
