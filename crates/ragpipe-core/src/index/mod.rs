//! Indexing pipeline
//!
//! Chunking, embedding, and the in-memory vector index.

mod chunker;
mod embedder;
mod vector_index;

pub use chunker::*;
pub use embedder::*;
pub use vector_index::*;
