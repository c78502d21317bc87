use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ChatClient;
use crate::domain::{ChatRequest, DomainError};

/// Offline [`ChatClient`] that returns a canned reply and records every request.
pub struct MockChatClient {
    reply: Result<String, String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a provider error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new("This is a mock answer.")
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, DomainError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }
        self.reply.clone().map_err(DomainError::provider)
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}
