use duckdb::Connection;
use tracing::debug;

use crate::domain::DomainError;

/// Creates the `documents` and `chunks` tables if they are missing.
///
/// Both DuckDB repositories call this on the connection they share, so
/// either one can be constructed first.
pub(crate) fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            original_name TEXT NOT NULL,
            file_type TEXT NOT NULL,
            file_size BIGINT NOT NULL,
            content TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            content TEXT NOT NULL,
            embedding FLOAT[],
            created_at BIGINT NOT NULL
        );
        "#,
    )
    .map_err(|e| DomainError::storage(format!("Failed to initialize schema: {}", e)))?;

    debug!("DuckDB document schema initialized");
    Ok(())
}

/// FLOAT lists cannot be bound as parameters, so vectors are inlined as a
/// typed literal. The values come from the embedding provider, never from
/// user text.
pub(crate) fn vector_to_list_literal(vector: &[f32]) -> String {
    let values = vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]::FLOAT[]", values)
}

/// Parses `CAST(embedding AS VARCHAR)` output, e.g. `[0.25, -1.0]`.
pub(crate) fn parse_list_text(text: &str) -> Result<Vec<f32>, DomainError> {
    serde_json::from_str(text)
        .map_err(|e| DomainError::storage(format!("Malformed stored embedding: {}", e)))
}
