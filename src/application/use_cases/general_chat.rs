use std::sync::Arc;

use tracing::debug;

use crate::application::ChatClient;
use crate::domain::{ChatMessage, ChatRequest, DomainError, GenerationConfig};

pub const GENERAL_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide clear, accurate, and helpful responses.";

/// Plain chat with the generation provider, no document retrieval.
pub struct GeneralChatUseCase {
    chat_client: Arc<dyn ChatClient>,
    generation: GenerationConfig,
}

impl GeneralChatUseCase {
    pub fn new(chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            chat_client,
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub async fn respond(&self, message: &str) -> Result<String, DomainError> {
        self.respond_with_system_prompt(message, GENERAL_SYSTEM_PROMPT)
            .await
    }

    /// `history` is sent in order after the default system prompt. The last
    /// turn is expected to be the user's new message.
    pub async fn respond_with_history(
        &self,
        history: &[ChatMessage],
    ) -> Result<String, DomainError> {
        if history.is_empty() {
            return Err(DomainError::validation("Conversation cannot be empty"));
        }

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(GENERAL_SYSTEM_PROMPT));
        messages.extend(history.iter().cloned());
        self.complete(messages).await
    }

    pub async fn respond_with_system_prompt(
        &self,
        message: &str,
        system_prompt: &str,
    ) -> Result<String, DomainError> {
        if message.trim().is_empty() {
            return Err(DomainError::validation("Message cannot be empty"));
        }

        self.complete(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(message),
        ])
        .await
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, DomainError> {
        debug!(
            "General chat with {} turns via {}",
            messages.len(),
            self.chat_client.model_name()
        );
        let request = ChatRequest::new(
            messages,
            self.generation.max_tokens,
            self.generation.temperature,
        );
        self.chat_client.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockChatClient;
    use crate::domain::ChatRole;

    #[tokio::test]
    async fn test_respond_sends_default_system_prompt() {
        let chat = Arc::new(MockChatClient::new("Hello there"));
        let use_case = GeneralChatUseCase::new(chat.clone());

        let reply = use_case.respond("Hi").await.unwrap();

        assert_eq!(reply, "Hello there");
        let request = &chat.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content, GENERAL_SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert_eq!(request.max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_custom_system_prompt_replaces_default() {
        let chat = Arc::new(MockChatClient::new("Arr"));
        let use_case = GeneralChatUseCase::new(chat.clone());

        use_case
            .respond_with_system_prompt("Hi", "Talk like a pirate.")
            .await
            .unwrap();

        let request = &chat.requests()[0];
        assert_eq!(request.messages[0].content, "Talk like a pirate.");
        assert_eq!(request.messages[1].content, "Hi");
    }

    #[tokio::test]
    async fn test_history_follows_system_prompt() {
        let chat = Arc::new(MockChatClient::new("ok"));
        let use_case = GeneralChatUseCase::new(chat.clone());
        let history = vec![
            ChatMessage::user("What is Rust?"),
            ChatMessage::assistant("A systems language."),
            ChatMessage::user("Who made it?"),
        ];

        use_case.respond_with_history(&history).await.unwrap();

        let roles: Vec<ChatRole> = chat.requests()[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_calling_provider() {
        let chat = Arc::new(MockChatClient::new("unused"));
        let use_case = GeneralChatUseCase::new(chat.clone());

        assert!(use_case.respond("  ").await.unwrap_err().is_validation());
        assert!(use_case.respond_with_history(&[]).await.unwrap_err().is_validation());
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let use_case = GeneralChatUseCase::new(Arc::new(MockChatClient::failing("down")));

        assert!(use_case.respond("Hi").await.unwrap_err().is_provider());
    }
}
