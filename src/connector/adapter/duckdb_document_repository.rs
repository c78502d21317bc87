use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use super::duckdb_schema::initialize_schema;
use crate::application::DocumentRepository;
use crate::domain::{Document, DomainError};

const DOCUMENT_COLUMNS: &str =
    "id, user_id, filename, original_name, file_type, file_size, content, created_at, updated_at";

pub struct DuckdbDocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbDocumentRepository {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Returns a clone of the shared connection Arc.
    /// DuckDB allows one write connection per file, so the chunk repository
    /// is built on this same connection.
    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn row_to_document(row: &Row<'_>) -> duckdb::Result<Document> {
        Ok(Document::reconstitute(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get::<_, i64>(5)? as u64,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
        ))
    }
}

#[async_trait]
impl DocumentRepository for DuckdbDocumentRepository {
    async fn save(&self, document: &Document) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO documents ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                DOCUMENT_COLUMNS
            ),
            params![
                document.id(),
                document.user_id(),
                document.filename(),
                document.original_name(),
                document.file_type(),
                document.file_size() as i64,
                document.content(),
                document.created_at(),
                document.updated_at(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to save document: {}", e)))?;

        debug!("Saved document {} to DuckDB", document.id());
        Ok(())
    }

    async fn find_by_id(&self, id: &str, user_id: &str) -> Result<Option<Document>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM documents WHERE id = ? AND user_id = ?",
                DOCUMENT_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![id, user_id], Self::row_to_document) {
            Ok(document) => Ok(Some(document)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to query document: {}",
                e
            ))),
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Document>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM documents WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
                DOCUMENT_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let documents = stmt
            .query_map(params![user_id], Self::row_to_document)
            .map_err(|e| DomainError::storage(format!("Failed to list documents: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::storage(format!("Failed to read document row: {}", e)))?;

        Ok(documents)
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<bool, DomainError> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let removed_chunks = tx
            .execute(
                "DELETE FROM chunks WHERE document_id = ? AND user_id = ?",
                params![id, user_id],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete chunks: {}", e)))?;

        let removed = tx
            .execute(
                "DELETE FROM documents WHERE id = ? AND user_id = ?",
                params![id, user_id],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete document: {}", e)))?;

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!(
            "Deleted document {} ({} rows) and {} chunks",
            id, removed, removed_chunks
        );
        Ok(removed > 0)
    }
}
