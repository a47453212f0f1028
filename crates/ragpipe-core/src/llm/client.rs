//! HTTP client for external LLM services (OpenAI, vLLM, etc.)

use super::cache::{cache_key, ResponseCache};
use crate::config::LLMServiceConfig;
use crate::error::{RagError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const MAX_COMPLETION_TOKENS: u32 = 1024;

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Generate embeddings for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Declared embedding dimensions (0 if unknown)
    fn embedding_dimensions(&self) -> usize;

    /// Chat model name
    fn model_name(&self) -> &str;

    /// Embedding model name
    fn embedding_model_name(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
struct APIMetrics {
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    cache_hits: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub avg_latency_ms: f64,
}

/// OpenAI-compatible client
pub struct VLLMClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    chat_cache: ResponseCache<String>,
    embedding_cache: ResponseCache<Vec<f32>>,
    metrics: APIMetrics,
}

impl VLLMClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            config,
            chat_cache: ResponseCache::new(),
            embedding_cache: ResponseCache::new(),
            metrics: APIMetrics::default(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LLMServiceConfig::default())
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: self.metrics.cache_hits.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &Req,
        service: &str,
    ) -> Result<Resp> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let result = self.send_json(url, body, service).await;

        if result.is_err() {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.metrics
            .total_latency_ms
            .fetch_add(start.elapsed().as_millis() as u64, Ordering::Relaxed);

        result
    }

    async fn send_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &Req,
        service: &str,
    ) -> Result<Resp> {
        let mut req = self.http_client.post(url).json(body);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(service, status, &body));
        }
        Ok(response.json::<Resp>().await?)
    }
}

/// 429 and 5xx are worth retrying; every other status is final
fn status_error(service: &str, status: StatusCode, body: &str) -> RagError {
    let message = format!("{} error (HTTP {}): {}", service, status, body);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        RagError::ServiceUnavailable(message)
    } else {
        RagError::ExternalError(message)
    }
}

#[async_trait]
impl LLMClient for VLLMClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let messages_json = serde_json::to_string(&messages)?;
        let key = cache_key("chat", &self.config.model, &messages_json);

        if let Some(cached) = self.chat_cache.get(&key) {
            tracing::debug!("Cache hit for chat completion");
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let url = format!("{}/v1/chat/completions", self.config.url);
        let response: ChatResponse = self.post_json(&url, &request, "LLM service").await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RagError::ExternalError("No choices in LLM response".to_string()))?;

        self.chat_cache.insert(key, content.clone());
        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::ExternalError("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = &self.config.embedding_model;
        let mut results: Vec<Option<Vec<f32>>> = texts
            .iter()
            .map(|t| self.embedding_cache.get(&cache_key("embed", model, t)))
            .collect();

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| results[i].is_none()).collect();
        let cached = texts.len() - missing.len();
        self.metrics
            .cache_hits
            .fetch_add(cached as u64, Ordering::Relaxed);

        if !missing.is_empty() {
            tracing::debug!(
                "Embedding batch: {} cached, {} to fetch",
                cached,
                missing.len()
            );

            #[derive(Serialize)]
            struct EmbedRequest<'a> {
                model: &'a str,
                input: Vec<&'a str>,
            }

            #[derive(Deserialize)]
            struct EmbedResponse {
                data: Vec<EmbedData>,
            }

            #[derive(Deserialize)]
            struct EmbedData {
                #[serde(default)]
                index: Option<usize>,
                embedding: Vec<f32>,
            }

            let request = EmbedRequest {
                model,
                input: missing.iter().map(|&i| texts[i].as_str()).collect(),
            };

            let url = format!("{}/v1/embeddings", self.config.embeddings_url());
            let mut response: EmbedResponse =
                self.post_json(&url, &request, "Embedding service").await?;

            if response.data.len() != missing.len() {
                return Err(RagError::ExternalError(format!(
                    "Embedding service returned {} vectors for {} inputs",
                    response.data.len(),
                    missing.len()
                )));
            }

            // The API may return items out of order; `index` refers to the request.
            response
                .data
                .sort_by_key(|d| d.index.unwrap_or(usize::MAX));

            for (slot, data) in missing.iter().zip(response.data) {
                self.embedding_cache
                    .insert(cache_key("embed", model, &texts[*slot]), data.embedding.clone());
                results[*slot] = Some(data.embedding);
            }
        }

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| RagError::ExternalError("Missing embedding".to_string())))
            .collect()
    }

    fn embedding_dimensions(&self) -> usize {
        self.config.embedding_dimensions.unwrap_or(0)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn embedding_model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            status_error("x", StatusCode::TOO_MANY_REQUESTS, ""),
            RagError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            status_error("x", StatusCode::BAD_GATEWAY, ""),
            RagError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            status_error("x", StatusCode::UNAUTHORIZED, "bad key"),
            RagError::ExternalError(_)
        ));
    }

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
    }

    #[test]
    fn test_new_client_has_empty_metrics() {
        let config = LLMServiceConfig {
            url: "http://localhost:1".to_string(),
            model: "m".to_string(),
            embedding_url: None,
            embedding_model: "e".to_string(),
            embedding_dimensions: Some(8),
            api_key: None,
            timeout_secs: 1,
            temperature: 0.0,
        };
        let client = VLLMClient::new(config).unwrap();
        assert_eq!(client.embedding_dimensions(), 8);
        assert_eq!(client.metrics().total_requests, 0);
    }
}
