mod delete_document;
mod general_chat;
mod ingest_document;
mod list_documents;
mod rag_chat;
mod vector_store;

pub use delete_document::*;
pub use general_chat::*;
pub use ingest_document::*;
pub use list_documents::*;
pub use rag_chat::*;
pub use vector_store::*;
