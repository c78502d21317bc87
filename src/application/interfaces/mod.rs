mod chat_client;
mod chunk_repository;
mod document_repository;
mod embedding_service;

pub use chat_client::*;
pub use chunk_repository::*;
pub use document_repository::*;
pub use embedding_service::*;
