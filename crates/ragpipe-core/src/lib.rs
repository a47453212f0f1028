//! ragpipe core library
//!
//! Retrieval and question decomposition over a small document corpus.
//!
//! # Features
//! - Sentence and character chunking with overlap
//! - Build-once, query-many exact vector index (L2 or cosine)
//! - Query retrieval through a pluggable embedding gateway
//! - LLM-driven question decomposition and concurrent answering
//! - SQLite snapshots of a built index

pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod llm;
pub mod orchestrator;
pub mod search;

pub use config::{Config, LLMServiceConfig};
pub use db::{Database, SnapshotInfo};
pub use error::{Error, RagError, Result};
pub use index::{
    chunk_documents, BuildOptions, CharacterChunker, Chunk, ChunkingStrategy, DistanceMetric,
    RetrievalResult, ScoredChunk, SentenceChunker, SourceDocument, VectorIndex,
};
pub use llm::{
    ChatMessage, Embedder, Generator, HttpEmbedder, HttpGenerator, LLMClient, LlmPlanner,
    MetricsSnapshot, PassthroughPlanner, Planner, RetryPolicy, VLLMClient,
};
pub use orchestrator::{
    AggregationMode, Orchestrator, OrchestratorOptions, QueryStage, Report, SubAnswer,
};
pub use search::Retriever;

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "ragpipe";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "ragpipe";
