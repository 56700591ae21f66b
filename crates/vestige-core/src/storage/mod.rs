//! Storage module (spec §4.1, §6.2)
//!
//! SQLite-based durable entity store: knowledge nodes, embeddings, graph
//! edges, people, and metadata, plus the FTS5 full-text index.

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{sanitize_fts5_query, DatabaseSize, Result, Storage, StorageError};
