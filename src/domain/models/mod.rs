mod answer;
mod chat_message;
mod config;
mod document;
mod document_chunk;
mod embedding;
mod search_result;

pub use answer::*;
pub use chat_message::*;
pub use config::*;
pub use document::*;
pub use document_chunk::*;
pub use embedding::*;
pub use search_result::*;

pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
