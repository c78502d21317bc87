use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::{ChatClient, ChunkRepository, DocumentRepository, EmbeddingService};
use crate::connector::adapter::{
    AnthropicClient, DuckdbChunkRepository, DuckdbDocumentRepository, InMemoryStore,
    MockChatClient, MockEmbedding, OpenAiChatClient, OpenAiEmbedding,
};
use crate::{
    ChunkingConfig, DeleteDocumentUseCase, GeneralChatUseCase, GenerationConfig, IngestConfig, IngestDocumentUseCase,
    ListDocumentsUseCase, RagChatUseCase, RetrievalConfig, TextChunker, VectorStoreUseCase,
};

pub const DATABASE_FILE: &str = "docchat.duckdb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatProvider {
    #[default]
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub data_dir: String,
    /// Use the deterministic offline embedding and chat providers.
    pub mock_providers: bool,
    pub memory_storage: bool,
    pub chat_provider: ChatProvider,
    /// Dimension for mock embeddings. Remote providers read `VECTOR_DIMENSION` themselves.
    pub mock_dimensions: usize,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub ingest: IngestConfig,
}

impl ContainerConfig {
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            mock_providers: false,
            memory_storage: false,
            chat_provider: ChatProvider::default(),
            mock_dimensions: 384,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            ingest: IngestConfig::default(),
        }
    }

    /// Applies `CHUNK_SIZE`, `CHUNK_OVERLAP`, `MAX_FILE_SIZE`, `OPENAI_MODEL`
    /// and `VECTOR_DIMENSION` when they are set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(size) = env_parse("CHUNK_SIZE")? {
            self.chunking.max_chunk_size = size;
        }
        if let Some(overlap) = env_parse("CHUNK_OVERLAP")? {
            self.chunking.chunk_overlap = overlap;
        }
        if let Some(max_bytes) = env_parse("MAX_FILE_SIZE")? {
            self.ingest.max_document_bytes = max_bytes;
        }
        if let Some(dimensions) = env_parse("VECTOR_DIMENSION")? {
            self.mock_dimensions = dimensions;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.generation.model = model;
        }
        Ok(self)
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(None),
    }
}

/// Builds the providers and persistence once and hands out use cases.
pub struct Container {
    embedding_service: Arc<dyn EmbeddingService>,
    chat_client: Arc<dyn ChatClient>,
    document_repo: Arc<dyn DocumentRepository>,
    chunk_repo: Arc<dyn ChunkRepository>,
    vector_store: Arc<VectorStoreUseCase>,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        config.chunking.validate()?;

        let embedding_service: Arc<dyn EmbeddingService> = if config.mock_providers {
            debug!("Using mock embedding service");
            Arc::new(MockEmbedding::with_dimensions(config.mock_dimensions))
        } else {
            debug!("Using OpenAI embedding service");
            Arc::new(OpenAiEmbedding::from_env()?)
        };

        let chat_client: Arc<dyn ChatClient> = if config.mock_providers {
            debug!("Using mock chat client");
            Arc::new(MockChatClient::default())
        } else {
            match config.chat_provider {
                ChatProvider::OpenAi => Arc::new(OpenAiChatClient::new(
                    std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?,
                    config.generation.model.clone(),
                    std::env::var("OPENAI_BASE_URL")
                        .unwrap_or_else(|_| crate::connector::DEFAULT_OPENAI_BASE_URL.to_string()),
                )),
                ChatProvider::Anthropic => Arc::new(AnthropicClient::from_env()),
            }
        };

        let (document_repo, chunk_repo): (Arc<dyn DocumentRepository>, Arc<dyn ChunkRepository>) =
            if config.memory_storage {
                debug!("Using in-memory document storage");
                let store = Arc::new(InMemoryStore::new());
                (store.clone(), store)
            } else {
                let db_path = PathBuf::from(&config.data_dir).join(DATABASE_FILE);
                debug!("Using DuckDB storage at {:?}", db_path);
                let documents = Arc::new(DuckdbDocumentRepository::new(&db_path)?);
                let chunks =
                    Arc::new(DuckdbChunkRepository::with_connection(documents.shared_connection()).await?);
                (documents, chunks)
            };

        let vector_store = Arc::new(
            VectorStoreUseCase::new(chunk_repo.clone(), embedding_service.clone())
                .with_retrieval(config.retrieval),
        );

        Ok(Self {
            embedding_service,
            chat_client,
            document_repo,
            chunk_repo,
            vector_store,
            config,
        })
    }

    pub fn vector_store(&self) -> Arc<VectorStoreUseCase> {
        self.vector_store.clone()
    }

    pub fn ingest_use_case(&self) -> Result<IngestDocumentUseCase> {
        let chunker = TextChunker::new(self.config.chunking)?;
        Ok(IngestDocumentUseCase::new(
            self.document_repo.clone(),
            self.chunk_repo.clone(),
            self.vector_store.clone(),
            chunker,
        )
        .with_config(self.config.ingest))
    }

    pub fn rag_use_case(&self) -> RagChatUseCase {
        RagChatUseCase::new(self.vector_store.clone(), self.chat_client.clone())
            .with_generation(self.config.generation.clone())
    }

    pub fn general_chat_use_case(&self) -> GeneralChatUseCase {
        GeneralChatUseCase::new(self.chat_client.clone())
            .with_generation(self.config.generation.clone())
    }

    pub fn list_use_case(&self) -> ListDocumentsUseCase {
        ListDocumentsUseCase::new(self.document_repo.clone(), self.chunk_repo.clone())
    }

    pub fn delete_use_case(&self) -> DeleteDocumentUseCase {
        DeleteDocumentUseCase::new(self.document_repo.clone())
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_service.config().model_name()
    }

    pub fn chat_model(&self) -> &str {
        self.chat_client.model_name()
    }
}
