use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::application::{ChatClient, VectorStoreUseCase};
use crate::domain::{
    ChatMessage, ChatRequest, DocumentChunk, DomainError, GenerationConfig, RagAnswer,
    SourceAttribution,
};

/// Retrieval-augmented answering: search the user's chunks, build a grounded
/// prompt, make one generation call, attribute sources.
pub struct RagChatUseCase {
    vector_store: Arc<VectorStoreUseCase>,
    chat_client: Arc<dyn ChatClient>,
    generation: GenerationConfig,
}

impl RagChatUseCase {
    pub fn new(vector_store: Arc<VectorStoreUseCase>, chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            vector_store,
            chat_client,
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub async fn answer(&self, query: &str, user_id: &str) -> Result<RagAnswer, DomainError> {
        let limit = self.vector_store.retrieval().limit;
        let chunks = self
            .vector_store
            .search_similar_chunks(query, user_id, limit)
            .await?;

        self.generate(query, &chunks, &[]).await
    }

    /// Like [`answer`](Self::answer), but retrieval only considers one document.
    pub async fn answer_for_document(
        &self,
        query: &str,
        document_id: &str,
        user_id: &str,
    ) -> Result<RagAnswer, DomainError> {
        let limit = self.vector_store.retrieval().limit;
        let chunks = self
            .vector_store
            .search_similar_chunks_in_document(query, document_id, user_id, limit)
            .await?;

        self.generate(query, &chunks, &[]).await
    }

    /// Prior turns are sent between the system prompt and the new query.
    pub async fn answer_with_history(
        &self,
        query: &str,
        user_id: &str,
        history: &[ChatMessage],
    ) -> Result<RagAnswer, DomainError> {
        let limit = self.vector_store.retrieval().limit;
        let chunks = self
            .vector_store
            .search_similar_chunks(query, user_id, limit)
            .await?;

        self.generate(query, &chunks, history).await
    }

    async fn generate(
        &self,
        query: &str,
        chunks: &[DocumentChunk],
        history: &[ChatMessage],
    ) -> Result<RagAnswer, DomainError> {
        info!(
            "Answering with {} retrieved chunks via {}",
            chunks.len(),
            self.chat_client.model_name()
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_prompt(&build_context(chunks))));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(query));

        let request = ChatRequest::new(
            messages,
            self.generation.max_tokens,
            self.generation.temperature,
        );

        let start_time = Instant::now();
        let response = self.chat_client.complete(&request).await?;
        debug!(
            "Generation returned {} chars in {:?}",
            response.len(),
            start_time.elapsed()
        );

        Ok(RagAnswer {
            response,
            sources: chunks.iter().map(SourceAttribution::from_chunk).collect(),
        })
    }
}

/// `[Source N]` blocks in ranked order, separated by a blank line.
pub fn build_context(chunks: &[DocumentChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Source {}]\n{}\n", i + 1, chunk.content()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a helpful AI assistant with access to the following documents:\n\n\
         {context}\n\n\
         Please answer the user's question based on the information provided in the documents above.\n\
         If the answer is not found in the documents, please say so and provide a general response if possible.\n\
         Always cite which source(s) you used for your answer."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ChunkRepository;
    use crate::connector::{InMemoryStore, MockChatClient, MockEmbedding};
    use crate::domain::ChatRole;

    #[test]
    fn test_context_blocks_are_numbered_in_order() {
        let chunks = vec![
            DocumentChunk::new("d", "u", 0, "first"),
            DocumentChunk::new("d", "u", 1, "second"),
        ];

        assert_eq!(
            build_context(&chunks),
            "[Source 1]\nfirst\n\n[Source 2]\nsecond\n"
        );
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_system_prompt_embeds_context() {
        let prompt = system_prompt("[Source 1]\nCats are mammals\n");

        assert!(prompt.contains("[Source 1]\nCats are mammals"));
        assert!(prompt.contains("If the answer is not found in the documents"));
        assert!(prompt.contains("cite which source(s)"));
    }

    fn rag(store: Arc<InMemoryStore>, chat: Arc<MockChatClient>) -> RagChatUseCase {
        let vector_store = Arc::new(VectorStoreUseCase::new(
            store,
            Arc::new(MockEmbedding::with_dimensions(32)),
        ));
        RagChatUseCase::new(vector_store, chat)
    }

    #[tokio::test]
    async fn test_no_chunks_still_calls_model_with_empty_context() {
        let store = Arc::new(InMemoryStore::new());
        let chat = Arc::new(MockChatClient::new("I could not find that in your documents."));
        let rag = rag(store, chat.clone());

        let answer = rag.answer("What is the capital of France?", "alice").await.unwrap();

        assert_eq!(answer.response, "I could not find that in your documents.");
        assert!(!answer.has_sources());

        let requests = chat.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 1000);
        assert!((requests[0].temperature - 0.7).abs() < f32::EPSILON);
        assert!(!requests[0].messages[0].content.contains("[Source"));
    }

    #[tokio::test]
    async fn test_history_sits_between_system_and_query() {
        let store = Arc::new(InMemoryStore::new());
        store
            .save_batch(&[DocumentChunk::new("d", "alice", 0, "notes")])
            .await
            .unwrap();
        let chat = Arc::new(MockChatClient::new("ok"));
        let rag = rag(store, chat.clone());

        let history = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi, ask me about your documents"),
        ];
        rag.answer_with_history("and now?", "alice", &history)
            .await
            .unwrap();

        let request = &chat.requests()[0];
        let roles: Vec<ChatRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
        assert_eq!(request.messages[3].content, "and now?");
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let store = Arc::new(InMemoryStore::new());
        let chat = Arc::new(MockChatClient::failing("upstream 503"));
        let rag = rag(store, chat);

        let err = rag.answer("anything", "alice").await.unwrap_err();

        assert!(err.is_provider());
    }
}
