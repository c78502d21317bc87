//! # Application Layer
//!
//! Interfaces at the external seams (embedding, generation, persistence) and
//! the use cases that coordinate them: the vector store, the RAG chat
//! orchestrator, and the document lifecycle.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
