//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use docchat::{
    ChunkingConfig, DeleteDocumentUseCase, DocumentRepository, ChunkRepository, DomainError,
    EmbeddingConfig, EmbeddingService, IngestDocumentUseCase, InMemoryStore,
    ListDocumentsUseCase, MockChatClient, RagChatUseCase, TextChunker, VectorStoreUseCase,
};

const TOPICS: &[(&str, &[&str])] = &[
    ("pets", &["pet", "pets", "cat", "cats", "dog", "dogs", "kitten", "puppy"]),
    ("sky", &["sky", "blue", "cloud", "clouds", "sun", "weather"]),
    ("food", &["bread", "flour", "oven", "bake", "recipe"]),
];

/// Embeds text as a bag of topics: one dimension per topic, counting the
/// topic words it contains. Text with no topic word embeds as all zeros.
pub struct TopicEmbedding {
    config: EmbeddingConfig,
}

impl TopicEmbedding {
    pub fn new() -> Self {
        Self {
            config: EmbeddingConfig::new("topic-embedding".to_string(), TOPICS.len(), 64),
        }
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; TOPICS.len()];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            for (i, (_, words)) in TOPICS.iter().enumerate() {
                if words.contains(&word.as_str()) {
                    vector[i] += 1.0;
                }
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingService for TopicEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

/// Always fails, as an unreachable provider would.
pub struct FailingEmbedding {
    config: EmbeddingConfig,
}

impl FailingEmbedding {
    pub fn new() -> Self {
        Self {
            config: EmbeddingConfig::new("down".to_string(), TOPICS.len(), 64),
        }
    }
}

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, DomainError> {
        Err(DomainError::provider("embedding provider unavailable"))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        Err(DomainError::provider("embedding provider unavailable"))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

pub const ANIMALS: &str = "Cats are mammals. Dogs are mammals too. The sky is blue.";

/// Use cases wired over one pair of repositories.
pub struct TestApp {
    pub documents: Arc<dyn DocumentRepository>,
    pub chunks: Arc<dyn ChunkRepository>,
    pub vector_store: Arc<VectorStoreUseCase>,
    pub chat: Arc<MockChatClient>,
    pub ingest: IngestDocumentUseCase,
    pub rag: RagChatUseCase,
    pub list: ListDocumentsUseCase,
    pub delete: DeleteDocumentUseCase,
}

impl TestApp {
    pub fn in_memory(max_chunk_size: usize) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::build(
            store.clone(),
            store,
            Arc::new(TopicEmbedding::new()),
            max_chunk_size,
        )
    }

    pub fn build(
        documents: Arc<dyn DocumentRepository>,
        chunks: Arc<dyn ChunkRepository>,
        embedding: Arc<dyn EmbeddingService>,
        max_chunk_size: usize,
    ) -> Self {
        let vector_store = Arc::new(VectorStoreUseCase::new(chunks.clone(), embedding));
        let chat = Arc::new(MockChatClient::new("Cats and dogs are pets [Source 1]."));
        let chunker = TextChunker::new(ChunkingConfig::without_overlap(max_chunk_size))
            .expect("valid chunking config");

        Self {
            ingest: IngestDocumentUseCase::new(
                documents.clone(),
                chunks.clone(),
                vector_store.clone(),
                chunker,
            ),
            rag: RagChatUseCase::new(vector_store.clone(), chat.clone()),
            list: ListDocumentsUseCase::new(documents.clone(), chunks.clone()),
            delete: DeleteDocumentUseCase::new(documents.clone()),
            documents,
            chunks,
            vector_store,
            chat,
        }
    }
}
