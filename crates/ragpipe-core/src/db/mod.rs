//! Snapshot storage
//!
//! A built vector index can be written to SQLite and loaded back, so a
//! corpus is embedded once and queried across runs.

mod schema;
mod snapshot;

pub use schema::Database;
pub use snapshot::{bytes_to_embedding, corpus_fingerprint, embedding_to_bytes, SnapshotInfo};
use std::path::PathBuf;

impl Database {
    /// Get the default snapshot path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("index.sqlite")
    }
}
