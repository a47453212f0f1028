//! LLM integration
//!
//! Provides traits and implementations for:
//! - Embedding generation via external services (vLLM, OpenAI, etc.)
//! - Text generation through chat-completion endpoints
//! - Question decomposition
//! - Retry with bounded backoff around every gateway call

mod cache;
mod client;
mod http_embedder;
mod http_generator;
mod planner;
mod retry;
mod traits;

pub use cache::{cache_key, ResponseCache};
pub use client::{ChatMessage, LLMClient, MetricsSnapshot, VLLMClient};
pub use http_embedder::HttpEmbedder;
pub use http_generator::HttpGenerator;
pub use planner::{parse_sub_questions, LlmPlanner, PassthroughPlanner, Planner};
pub use retry::{RetryPolicy, MAX_ATTEMPTS_LIMIT};
pub use traits::*;
