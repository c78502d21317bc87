mod anthropic_client;
mod duckdb_chunk_repository;
mod duckdb_document_repository;
mod duckdb_schema;
mod in_memory_store;
mod mock_chat_client;
mod mock_embedding;
mod openai_chat_client;
mod openai_embedding;

pub use anthropic_client::*;
pub use duckdb_chunk_repository::*;
pub use duckdb_document_repository::*;
pub use in_memory_store::*;
pub use mock_chat_client::*;
pub use mock_embedding::*;
pub use openai_chat_client::*;
pub use openai_embedding::*;
