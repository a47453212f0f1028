//! Command implementations

pub mod ask;
pub mod chunk;
pub mod index;
mod ingest;
pub mod search;

use ragpipe_core::{Database, VectorIndex};
use std::path::{Path, PathBuf};

/// Snapshot path from the flag, or the default cache location
pub(crate) fn snapshot_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(Database::default_path)
}

/// Open a snapshot and load its index
pub(crate) fn load_snapshot(path: &Path) -> ragpipe_core::Result<VectorIndex> {
    let db = Database::open(path)?;
    db.initialize()?;
    db.load_index()
}
