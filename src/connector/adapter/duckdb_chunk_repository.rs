use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use super::duckdb_schema::{initialize_schema, parse_list_text, vector_to_list_literal};
use crate::application::ChunkRepository;
use crate::domain::{DocumentChunk, DomainError};

const CHUNK_COLUMNS: &str = "id, document_id, user_id, chunk_index, content, \
     CAST(embedding AS VARCHAR), created_at";

/// Chunk rows with their embedding in a `FLOAT[]` column.
///
/// Similarity is computed in the application layer, so this adapter only
/// filters by owner and by presence of an embedding.
pub struct DuckdbChunkRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbChunkRepository {
    /// Create a new adapter using an existing shared connection.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        let conn_guard = conn.lock().await;
        initialize_schema(&conn_guard)?;
        drop(conn_guard);

        Ok(Self { conn })
    }

    fn query_chunks(
        conn: &Connection,
        filter: &str,
        order_by: &str,
        args: &[&str],
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let sql = format!(
            "SELECT {} FROM chunks WHERE {} ORDER BY {}",
            CHUNK_COLUMNS, filter, order_by
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare chunk query: {}", e)))?;

        let rows = stmt
            .query_map(duckdb::params_from_iter(args.iter()), Self::read_row)
            .map_err(|e| DomainError::storage(format!("Failed to query chunks: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::storage(format!("Failed to read chunk row: {}", e)))?;

        rows.into_iter().map(Self::into_chunk).collect()
    }

    fn read_row(row: &Row<'_>) -> duckdb::Result<ChunkRow> {
        Ok(ChunkRow {
            id: row.get(0)?,
            document_id: row.get(1)?,
            user_id: row.get(2)?,
            chunk_index: row.get::<_, i64>(3)?,
            content: row.get(4)?,
            embedding: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_chunk(row: ChunkRow) -> Result<DocumentChunk, DomainError> {
        let embedding = row.embedding.as_deref().map(parse_list_text).transpose()?;
        Ok(DocumentChunk::reconstitute(
            row.id,
            row.document_id,
            row.user_id,
            row.chunk_index as u32,
            row.content,
            embedding,
            row.created_at,
        ))
    }
}

struct ChunkRow {
    id: String,
    document_id: String,
    user_id: String,
    chunk_index: i64,
    content: String,
    embedding: Option<String>,
    created_at: i64,
}

#[async_trait]
impl ChunkRepository for DuckdbChunkRepository {
    async fn save_batch(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO chunks \
                     (id, document_id, user_id, chunk_index, content, embedding, created_at) \
                     VALUES (?, ?, ?, ?, ?, NULL, ?)",
                )
                .map_err(|e| DomainError::storage(format!("Failed to prepare chunk insert: {}", e)))?;

            for chunk in chunks {
                stmt.execute(params![
                    chunk.id(),
                    chunk.document_id(),
                    chunk.user_id(),
                    chunk.chunk_index() as i64,
                    chunk.content(),
                    chunk.created_at(),
                ])
                .map_err(|e| {
                    DomainError::storage(format!("Failed to insert chunk {}: {}", chunk.id(), e))
                })?;
            }
        }

        for chunk in chunks {
            if let Some(vector) = chunk.embedding() {
                let sql = format!(
                    "UPDATE chunks SET embedding = {} WHERE id = ?",
                    vector_to_list_literal(vector)
                );
                tx.execute(&sql, params![chunk.id()]).map_err(|e| {
                    DomainError::storage(format!(
                        "Failed to insert embedding for chunk {}: {}",
                        chunk.id(),
                        e
                    ))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Saved {} chunks to DuckDB", chunks.len());
        Ok(())
    }

    async fn find_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let conn = self.conn.lock().await;
        Self::query_chunks(
            &conn,
            "document_id = ? AND user_id = ?",
            "chunk_index",
            &[document_id, user_id],
        )
    }

    async fn find_embedded_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let conn = self.conn.lock().await;
        Self::query_chunks(
            &conn,
            "document_id = ? AND user_id = ? AND embedding IS NOT NULL",
            "chunk_index",
            &[document_id, user_id],
        )
    }

    async fn find_embedded_by_user(&self, user_id: &str) -> Result<Vec<DocumentChunk>, DomainError> {
        let conn = self.conn.lock().await;
        Self::query_chunks(
            &conn,
            "user_id = ? AND embedding IS NOT NULL",
            "created_at, document_id, chunk_index",
            &[user_id],
        )
    }

    async fn update_embedding(
        &self,
        chunk_id: &str,
        user_id: &str,
        embedding: &[f32],
    ) -> Result<bool, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "UPDATE chunks SET embedding = {} WHERE id = ? AND user_id = ?",
            vector_to_list_literal(embedding)
        );
        let updated = conn
            .execute(&sql, params![chunk_id, user_id])
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to update embedding for chunk {}: {}",
                    chunk_id, e
                ))
            })?;
        Ok(updated > 0)
    }

    async fn clear_embeddings_by_document(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let cleared = conn
            .execute(
                "UPDATE chunks SET embedding = NULL \
                 WHERE document_id = ? AND user_id = ? AND embedding IS NOT NULL",
                params![document_id, user_id],
            )
            .map_err(|e| DomainError::storage(format!("Failed to clear embeddings: {}", e)))?;
        Ok(cleared as u64)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM chunks WHERE user_id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count chunks: {}", e)))?;
        Ok(count as u64)
    }
}
