pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    build_context, system_prompt, ChatClient, ChunkRepository, DeleteDocumentUseCase,
    DocumentRepository, EmbeddingReport, GeneralChatUseCase, EmbeddingService, IngestDocumentUseCase, IngestReport,
    ListDocumentsUseCase, RagChatUseCase, VectorStoreUseCase,
};

pub use connector::{
    AnthropicClient, ChatProvider, Container, ContainerConfig, DuckdbChunkRepository,
    DuckdbDocumentRepository, InMemoryStore, MockChatClient, MockEmbedding, OpenAiChatClient,
    OpenAiEmbedding,
};

pub use domain::{
    cosine_similarity, most_similar, rank, split_sentences, ChatMessage, ChatRequest, ChatRole,
    ChunkingConfig, Document, DocumentChunk, DomainError, EmbeddingConfig, GenerationConfig,
    IngestConfig, NewDocument, RagAnswer, RetrievalConfig, ScoredChunk, SearchQuery,
    SourceAttribution, TextChunker,
};
