use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::application::{ChunkRepository, DocumentRepository, VectorStoreUseCase};
use crate::domain::{Document, DocumentChunk, DomainError, IngestConfig, NewDocument, TextChunker};

/// What one ingestion produced.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document: Document,
    pub chunks_created: usize,
    pub embedded_chunks: usize,
}

/// Use case for turning uploaded text into a searchable document.
///
/// The document and its chunks are persisted before embeddings are
/// requested. If the provider then fails, the error is returned and the
/// stored rows stay in place without vectors.
pub struct IngestDocumentUseCase {
    document_repo: Arc<dyn DocumentRepository>,
    chunk_repo: Arc<dyn ChunkRepository>,
    vector_store: Arc<VectorStoreUseCase>,
    chunker: TextChunker,
    config: IngestConfig,
}

impl IngestDocumentUseCase {
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        chunk_repo: Arc<dyn ChunkRepository>,
        vector_store: Arc<VectorStoreUseCase>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            document_repo,
            chunk_repo,
            vector_store,
            chunker,
            config: IngestConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn execute(
        &self,
        upload: NewDocument,
        user_id: &str,
    ) -> Result<IngestReport, DomainError> {
        self.validate(&upload)?;

        let start_time = Instant::now();
        info!("Ingesting {} for user {}", upload.filename, user_id);

        let pieces = self.chunker.chunk(&upload.content);
        if pieces.is_empty() {
            warn!("{} produced no chunks", upload.filename);
        }

        let document = Document::new(user_id, upload);
        self.document_repo.save(&document).await?;

        let chunks: Vec<DocumentChunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                DocumentChunk::new(document.id(), user_id, index as u32, content)
            })
            .collect();
        self.chunk_repo.save_batch(&chunks).await?;

        let report = self
            .vector_store
            .generate_embeddings_for_document(document.id(), user_id)
            .await?;

        if !report.is_complete() {
            warn!(
                "Only {}/{} chunks of {} were embedded",
                report.processed_chunks,
                report.total_chunks,
                document.id()
            );
        }

        info!(
            "Ingested {} as {}: {} chunks in {:?}",
            document.summary(),
            document.id(),
            chunks.len(),
            start_time.elapsed()
        );

        Ok(IngestReport {
            chunks_created: chunks.len(),
            embedded_chunks: report.processed_chunks,
            document,
        })
    }

    fn validate(&self, upload: &NewDocument) -> Result<(), DomainError> {
        if upload.filename.trim().is_empty() {
            return Err(DomainError::validation("Document filename cannot be empty"));
        }
        if upload.content.len() > self.config.max_document_bytes {
            return Err(DomainError::validation(format!(
                "{} is {} bytes, above the {} byte limit",
                upload.filename,
                upload.content.len(),
                self.config.max_document_bytes
            )));
        }
        Ok(())
    }
}
