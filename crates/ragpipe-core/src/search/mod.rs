//! Retrieval
//!
//! Turns a natural-language query into the best-matching chunks of a built
//! index. Ranking itself lives in `index::VectorIndex`.

mod retriever;

pub use crate::index::{RetrievalResult, ScoredChunk};
pub use retriever::{Retriever, DEFAULT_K};
