//! Pure domain services: chunking and similarity ranking.

mod chunker;
pub mod similarity;

pub use chunker::*;
pub use similarity::{cosine_similarity, most_similar, rank};
