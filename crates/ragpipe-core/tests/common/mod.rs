//! In-process fakes for the embedding and generation capabilities

#![allow(dead_code)]

use async_trait::async_trait;
use ragpipe_core::error::{RagError, Result};
use ragpipe_core::llm::{Embedder, Generator, Planner};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const VOCABULARY: [&str; 5] = ["capital", "france", "paris", "eiffel", "tower"];

pub const PARIS_TEXT: &str =
    "Paris is the capital of France. The Eiffel Tower is in Paris.";

/// Bag-of-words over a fixed vocabulary
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    VOCABULARY
        .iter()
        .map(|term| words.iter().filter(|w| *w == term).count() as f32)
        .collect()
}

/// Deterministic embedder counting how it is called
#[derive(Default)]
pub struct KeywordEmbedder {
    pub embed_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

/// Embedder whose every call fails with a transient error
#[derive(Default)]
pub struct UnavailableEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for UnavailableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RagError::ServiceUnavailable("HTTP 503".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RagError::ServiceUnavailable("HTTP 503".to_string()))
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }
}

/// Extract the "Question: ..." line of an answer prompt
pub fn prompt_question(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Question: "))
        .map(str::trim)
}

/// Generator answering "answer to <question>", optionally delayed per
/// question, recording prompts and completion order
#[derive(Default)]
pub struct EchoGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<String>>,
    pub delays: HashMap<String, Duration>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, question: &str, delay: Duration) -> Self {
        self.delays.insert(question.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.contains("Findings:") {
            return Ok("synthesized report".to_string());
        }

        let question = prompt_question(prompt).unwrap_or("unknown").to_string();
        if let Some(delay) = self.delays.get(&question) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(question.clone());
        Ok(format!("answer to {}", question))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Generator that rejects every prompt permanently
pub struct RejectingGenerator;

#[async_trait]
impl Generator for RejectingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::ExternalError("HTTP 400: bad request".to_string()))
    }

    fn model_name(&self) -> &str {
        "rejecting"
    }
}

/// Planner returning a fixed list
pub struct FixedPlanner(pub Vec<String>);

impl FixedPlanner {
    pub fn new(sub_questions: &[&str]) -> Self {
        Self(sub_questions.iter().map(|s| s.to_string()).collect())
    }
}

#[async_trait]
impl Planner for FixedPlanner {
    async fn decompose(&self, _question: &str) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}
