use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::{ChunkRepository, EmbeddingService};
use crate::domain::{
    most_similar, rank, DocumentChunk, DomainError, RetrievalConfig, ScoredChunk, SearchQuery,
};

/// Outcome of embedding one document's chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingReport {
    pub processed_chunks: usize,
    pub total_chunks: usize,
}

impl EmbeddingReport {
    pub fn is_complete(&self) -> bool {
        self.processed_chunks == self.total_chunks
    }
}

/// Embedding generation and similarity search over a user's chunks.
///
/// Every read and write goes through the owner-scoped [`ChunkRepository`],
/// so a search can only ever see chunks belonging to the calling user.
pub struct VectorStoreUseCase {
    chunk_repo: Arc<dyn ChunkRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
    retrieval: RetrievalConfig,
}

impl VectorStoreUseCase {
    pub fn new(
        chunk_repo: Arc<dyn ChunkRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            chunk_repo,
            embedding_service,
            retrieval: RetrievalConfig::default(),
        }
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Embeds every chunk of the document and stores the vectors.
    ///
    /// Texts go to the provider in one `embed_batch` call unless the document
    /// has more chunks than the provider's `max_batch_size`, in which case
    /// they are sent in consecutive slices of that size. The provider response is checked in full before anything is written.
    /// After that, a failed write for one chunk is logged and left out of
    /// `processed_chunks`; the other writes still happen.
    pub async fn generate_embeddings_for_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<EmbeddingReport, DomainError> {
        let chunks = self.chunk_repo.find_by_document(document_id, user_id).await?;
        let total_chunks = chunks.len();

        if chunks.is_empty() {
            info!("Document {} has no chunks to embed", document_id);
            return Ok(EmbeddingReport {
                processed_chunks: 0,
                total_chunks,
            });
        }

        let start_time = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.content().to_string()).collect();
        let batch_size = self.embedding_service.config().max_batch_size().max(1);

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            let embedded = self.embedding_service.embed_batch(batch).await?;
            if embedded.len() != batch.len() {
                return Err(DomainError::provider(format!(
                    "Expected {} embeddings, provider returned {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }

        if let Some(position) = vectors.iter().position(|v| !self.embedding_service.validate(v)) {
            return Err(DomainError::provider(format!(
                "Provider returned an invalid embedding for chunk {} (expected {} finite values, got {})",
                chunks[position].location(),
                self.embedding_service.config().dimensions(),
                vectors[position].len()
            )));
        }

        let mut processed_chunks = 0;
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            match self
                .chunk_repo
                .update_embedding(chunk.id(), user_id, vector)
                .await
            {
                Ok(true) => processed_chunks += 1,
                Ok(false) => warn!("Chunk {} vanished before its embedding was stored", chunk.location()),
                Err(e) => warn!("Failed to store embedding for chunk {}: {}", chunk.location(), e),
            }
        }

        info!(
            "Embedded {}/{} chunks of document {} in {:?}",
            processed_chunks,
            total_chunks,
            document_id,
            start_time.elapsed()
        );

        Ok(EmbeddingReport {
            processed_chunks,
            total_chunks,
        })
    }

    /// Top chunks across all of the user's documents, at or above the
    /// configured similarity threshold.
    pub async fn search_similar_chunks(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let query = self.base_query(query).with_limit(limit);
        Ok(into_chunks(self.search_scored(&query, user_id).await?))
    }

    pub async fn search_similar_chunks_in_document(
        &self,
        query: &str,
        document_id: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let query = self
            .base_query(query)
            .with_limit(limit)
            .within_document(document_id);
        Ok(into_chunks(self.search_scored(&query, user_id).await?))
    }

    /// Chunks scoring within `[min_score, max_score]`. `limit` defaults to
    /// the configured range limit.
    pub async fn search_by_similarity_range(
        &self,
        query: &str,
        user_id: &str,
        min_score: f32,
        max_score: f32,
        limit: Option<usize>,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        if min_score > max_score {
            return Err(DomainError::validation(format!(
                "Invalid similarity range: {} > {}",
                min_score, max_score
            )));
        }

        let query = SearchQuery::new(query)
            .with_min_score(min_score)
            .with_max_score(max_score)
            .with_limit(limit.unwrap_or(self.retrieval.range_limit));
        Ok(into_chunks(self.search_scored(&query, user_id).await?))
    }

    /// The single closest chunk, with no threshold.
    pub async fn find_most_similar_chunk(
        &self,
        query: &str,
        user_id: &str,
    ) -> Result<Option<DocumentChunk>, DomainError> {
        validate_query(query)?;

        let query_embedding = self.embed_query(query).await?;
        let candidates = self.chunk_repo.find_embedded_by_user(user_id).await?;

        let best = most_similar(&query_embedding, candidates);
        if let Some(ref hit) = best {
            debug!("Most similar chunk: {}", hit.display_line());
        }
        Ok(best.map(ScoredChunk::into_chunk))
    }

    /// Semantic search restricted to chunks that literally contain the query.
    pub async fn hybrid_search(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let query = self.base_query(query).with_limit(limit).with_hybrid(true);
        Ok(into_chunks(self.search_scored(&query, user_id).await?))
    }

    /// Embedded chunks of one document, in `chunk_index` order.
    pub async fn get_chunks_with_embeddings(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        self.chunk_repo
            .find_embedded_by_document(document_id, user_id)
            .await
    }

    /// Nulls the embeddings of the document's chunks. Chunks themselves stay.
    pub async fn delete_embeddings_for_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<u64, DomainError> {
        let cleared = self
            .chunk_repo
            .clear_embeddings_by_document(document_id, user_id)
            .await?;
        info!("Cleared {} embeddings of document {}", cleared, document_id);
        Ok(cleared)
    }

    /// Runs `query` for the user and keeps the scores.
    pub async fn search_scored(
        &self,
        query: &SearchQuery,
        user_id: &str,
    ) -> Result<Vec<ScoredChunk>, DomainError> {
        validate_query(query.query())?;
        info!("Searching: {}", query.summary());

        let start_time = Instant::now();
        let query_embedding = self.embed_query(query.query()).await?;

        let candidates = match query.document_id() {
            Some(document_id) => {
                self.chunk_repo
                    .find_embedded_by_document(document_id, user_id)
                    .await?
            }
            None => self.chunk_repo.find_embedded_by_user(user_id).await?,
        };
        let candidate_count = candidates.len();

        let results = rank(&query_embedding, candidates, query);

        info!(
            "Ranked {} candidates into {} results in {:?}",
            candidate_count,
            results.len(),
            start_time.elapsed()
        );
        for result in &results {
            debug!("  {}", result.display_line());
        }

        Ok(results)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        let embedding = self.embedding_service.embed(query).await?;
        if !self.embedding_service.validate(&embedding) {
            return Err(DomainError::provider(format!(
                "Provider returned an invalid query embedding (expected {} finite values, got {})",
                self.embedding_service.config().dimensions(),
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn base_query(&self, query: &str) -> SearchQuery {
        SearchQuery::new(query).with_min_score(self.retrieval.min_score)
    }
}

fn validate_query(query: &str) -> Result<(), DomainError> {
    if query.trim().is_empty() {
        return Err(DomainError::validation("Search query cannot be empty"));
    }
    Ok(())
}

fn into_chunks(results: Vec<ScoredChunk>) -> Vec<DocumentChunk> {
    results.into_iter().map(ScoredChunk::into_chunk).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{InMemoryStore, MockEmbedding};
    use crate::domain::EmbeddingConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedding {
        inner: MockEmbedding,
        config: EmbeddingConfig,
        batch_calls: AtomicUsize,
    }

    impl CountingEmbedding {
        fn new(max_batch_size: usize) -> Self {
            Self {
                inner: MockEmbedding::with_dimensions(8),
                config: EmbeddingConfig::new("counting".to_string(), 8, max_batch_size),
                batch_calls: AtomicUsize::new(0),
            }
        }

        fn batch_calls(&self) -> usize {
            self.batch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingService for CountingEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            self.inner.embed(text).await
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }

        fn config(&self) -> &EmbeddingConfig {
            &self.config
        }
    }

    async fn store_with_chunks(contents: &[&str]) -> (Arc<InMemoryStore>, Vec<DocumentChunk>) {
        let store = Arc::new(InMemoryStore::new());
        let chunks: Vec<DocumentChunk> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| DocumentChunk::new("doc-1", "alice", i as u32, *c))
            .collect();
        store.save_batch(&chunks).await.unwrap();
        (store, chunks)
    }

    fn use_case(store: Arc<InMemoryStore>) -> VectorStoreUseCase {
        VectorStoreUseCase::new(store, Arc::new(MockEmbedding::with_dimensions(32)))
    }

    #[tokio::test]
    async fn test_generate_embeddings_reports_every_chunk() {
        let (store, _) = store_with_chunks(&["alpha", "beta", "gamma"]).await;
        let vector_store = use_case(store.clone());

        let report = vector_store
            .generate_embeddings_for_document("doc-1", "alice")
            .await
            .unwrap();

        assert_eq!(report.processed_chunks, 3);
        assert_eq!(report.total_chunks, 3);
        assert!(report.is_complete());

        let embedded = vector_store
            .get_chunks_with_embeddings("doc-1", "alice")
            .await
            .unwrap();
        let indices: Vec<u32> = embedded.iter().map(|c| c.chunk_index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(embedded.iter().all(|c| c.embedding().map(|e| e.len()) == Some(32)));
    }

    #[tokio::test]
    async fn test_generate_embeddings_for_other_user_touches_nothing() {
        let (store, _) = store_with_chunks(&["alpha"]).await;
        let vector_store = use_case(store.clone());

        let report = vector_store
            .generate_embeddings_for_document("doc-1", "mallory")
            .await
            .unwrap();

        assert_eq!(report.total_chunks, 0);
        assert_eq!(store.find_embedded_by_user("alice").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_exact_text_is_top_hit() {
        let (store, _) = store_with_chunks(&["the quick brown fox", "lorem ipsum", "rust borrow checker"]).await;
        let vector_store = use_case(store);
        vector_store
            .generate_embeddings_for_document("doc-1", "alice")
            .await
            .unwrap();

        let best = vector_store
            .find_most_similar_chunk("lorem ipsum", "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(best.content(), "lorem ipsum");

        let results = vector_store
            .search_similar_chunks("rust borrow checker", "alice", 5)
            .await
            .unwrap();
        assert_eq!(results[0].content(), "rust borrow checker");
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let (store, _) = store_with_chunks(&["alpha"]).await;
        let vector_store = use_case(store);

        let err = vector_store
            .search_similar_chunks("   ", "alice", 5)
            .await
            .unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let (store, _) = store_with_chunks(&["alpha"]).await;
        let vector_store = use_case(store);

        let err = vector_store
            .search_by_similarity_range("alpha", "alice", 0.9, 0.1, None)
            .await
            .unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_delete_embeddings_is_idempotent_and_keeps_chunks() {
        let (store, _) = store_with_chunks(&["alpha", "beta"]).await;
        let vector_store = use_case(store.clone());
        vector_store
            .generate_embeddings_for_document("doc-1", "alice")
            .await
            .unwrap();

        assert_eq!(
            vector_store
                .delete_embeddings_for_document("doc-1", "alice")
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            vector_store
                .delete_embeddings_for_document("doc-1", "alice")
                .await
                .unwrap(),
            0
        );
        assert_eq!(store.find_by_document("doc-1", "alice").await.unwrap().len(), 2);
        assert!(vector_store
            .search_similar_chunks("alpha", "alice", 5)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_wrong_dimension_from_provider_writes_nothing() {
        let (store, _) = store_with_chunks(&["alpha", "beta"]).await;
        let embedding = MockEmbedding::with_dimensions(32).with_output_dimensions(16);
        let vector_store = VectorStoreUseCase::new(store.clone(), Arc::new(embedding));

        let err = vector_store
            .generate_embeddings_for_document("doc-1", "alice")
            .await
            .unwrap_err();

        assert!(err.is_provider());
        assert!(store.find_embedded_by_user("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_dimension_query_embedding_is_a_provider_error() {
        let (store, _) = store_with_chunks(&["alpha", "beta"]).await;
        let embedding = MockEmbedding::with_dimensions(32).with_output_dimensions(16);
        let vector_store = VectorStoreUseCase::new(store, Arc::new(embedding));

        let err = vector_store
            .search_similar_chunks("alpha", "alice", 5)
            .await
            .unwrap_err();
        assert!(err.is_provider());

        let err = vector_store
            .find_most_similar_chunk("alpha", "alice")
            .await
            .unwrap_err();
        assert!(err.is_provider());
    }

    #[tokio::test]
    async fn test_whole_document_goes_out_in_one_batch_call() {
        let (store, _) = store_with_chunks(&["a", "b", "c", "d", "e"]).await;
        let embedding = Arc::new(CountingEmbedding::new(16));
        let vector_store = VectorStoreUseCase::new(store, embedding.clone());

        let report = vector_store
            .generate_embeddings_for_document("doc-1", "alice")
            .await
            .unwrap();

        assert_eq!(report.processed_chunks, 5);
        assert_eq!(embedding.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_batches_are_split_at_provider_limit() {
        let (store, _) = store_with_chunks(&["a", "b", "c", "d", "e"]).await;
        let embedding = Arc::new(CountingEmbedding::new(2));
        let vector_store = VectorStoreUseCase::new(store, embedding.clone());

        let report = vector_store
            .generate_embeddings_for_document("doc-1", "alice")
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(embedding.batch_calls(), 3);
    }
}
