//! # Connector Layer
//!
//! External integrations implementing the application interfaces:
//! - Embedding and chat providers (OpenAI, Anthropic, offline mocks)
//! - Storage (DuckDB on disk, or in process memory)
//! - The [`Container`] that wires them into use cases

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
