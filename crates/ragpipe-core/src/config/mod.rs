//! Configuration management

use crate::error::{RagError, Result};
use crate::index::{
    CharacterChunker, ChunkingStrategy, DistanceMetric, SentenceChunker,
    DEFAULT_CHUNK_OVERLAP_CHARS, DEFAULT_CHUNK_SIZE_CHARS, DEFAULT_SENTENCES_PER_CHUNK,
    DEFAULT_SEPARATOR,
};
use crate::llm::RetryPolicy;
use crate::orchestrator::AggregationMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// How documents are split before embedding
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval and orchestration defaults
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Retry policy around every gateway call
    #[serde(default)]
    pub retry: RetryConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions (planning, answering)
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions declared by the deployment
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for chat completions
    #[serde(default)]
    pub temperature: f32,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("RAGPIPE_LLM_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("RAGPIPE_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("RAGPIPE_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("RAGPIPE_LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok(),
            timeout_secs: default_timeout(),
            temperature: 0.0,
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("RAGPIPE_LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("RAGPIPE_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "text-embedding-ada-002".to_string())
}

fn default_timeout() -> u64 {
    30
}

/// Chunking configuration as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ChunkingConfig {
    Sentence {
        #[serde(default = "default_sentences_per_chunk")]
        sentences_per_chunk: usize,
    },
    Character {
        #[serde(default = "default_separator")]
        separator: String,
        #[serde(default = "default_chunk_size")]
        chunk_size: usize,
        #[serde(default = "default_chunk_overlap")]
        chunk_overlap: usize,
    },
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::Sentence {
            sentences_per_chunk: default_sentences_per_chunk(),
        }
    }
}

impl ChunkingConfig {
    /// Validate and turn into a ready-to-use strategy
    pub fn strategy(&self) -> Result<ChunkingStrategy> {
        match self {
            Self::Sentence {
                sentences_per_chunk,
            } => Ok(ChunkingStrategy::Sentence(SentenceChunker::new(
                *sentences_per_chunk,
            )?)),
            Self::Character {
                separator,
                chunk_size,
                chunk_overlap,
            } => Ok(ChunkingStrategy::Character(CharacterChunker::new(
                separator.clone(),
                *chunk_size,
                *chunk_overlap,
            )?)),
        }
    }
}

fn default_sentences_per_chunk() -> usize {
    DEFAULT_SENTENCES_PER_CHUNK
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE_CHARS
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP_CHARS
}

/// Retrieval and orchestration defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved per (sub-)question
    #[serde(default = "default_k")]
    pub k: usize,

    /// Distance metric fixed for every index built with this config
    #[serde(default)]
    pub metric: DistanceMetric,

    /// Upper bound on sub-questions answered concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// How partial answers are combined
    #[serde(default)]
    pub aggregation: AggregationMode,

    /// Chunks embedded per gateway request while building
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            metric: DistanceMetric::default(),
            max_concurrency: default_max_concurrency(),
            aggregation: AggregationMode::default(),
            embed_batch_size: default_embed_batch_size(),
        }
    }
}

fn default_k() -> usize {
    1
}

fn default_max_concurrency() -> usize {
    4
}

fn default_embed_batch_size() -> usize {
    32
}

/// Retry settings around embedding and generation calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            attempt_timeout_secs: default_timeout(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            Duration::from_secs(self.attempt_timeout_secs),
        )
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    4000
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from an explicit path, falling back to defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Check every section once at startup
    pub fn validate(&self) -> Result<()> {
        self.chunking.strategy()?;
        self.retry.policy()?;
        if self.retrieval.max_concurrency == 0 {
            return Err(RagError::Config(
                "retrieval.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.retrieval.embed_batch_size == 0 {
            return Err(RagError::Config(
                "retrieval.embed_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
