//! Question decomposition
//!
//! An LLM breaks one complex question into a handful of focused
//! sub-questions, one per line. Parsing the reply is part of the contract:
//! list markers and stray punctuation are stripped, blank lines dropped,
//! and the order of the remaining lines is kept.

use super::Generator;
use crate::error::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

lazy_static! {
    /// Leading bullets and numbering: "-", "*", "•", "1.", "2)", "(3)", "Q4:", "Step 5 -"
    static ref LIST_MARKER: Regex = Regex::new(
        r"^(?:[-*•+]\s*|\(?\d{1,3}[.):]\s*|\(\d{1,3}\)\s*|(?i:q|question|step)\s*\d{1,3}\s*[:.)\-]\s*)+"
    )
    .unwrap();
}

/// Decomposes a question into sub-questions
#[async_trait]
pub trait Planner: Send + Sync {
    /// Sub-questions in the order they should be presented; may be empty
    async fn decompose(&self, question: &str) -> Result<Vec<String>>;
}

/// Planner that asks a generator for 3–5 sub-questions
pub struct LlmPlanner {
    generator: Arc<dyn Generator>,
}

impl LlmPlanner {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn decompose(&self, question: &str) -> Result<Vec<String>> {
        tracing::debug!("Planner: decomposing {:?}", question);
        let raw = self.generator.generate(&build_planner_prompt(question)).await?;
        let sub_questions = parse_sub_questions(&raw);
        tracing::info!("Planner produced {} sub-questions", sub_questions.len());
        Ok(sub_questions)
    }
}

/// Planner that never splits: the question is its own only sub-question
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughPlanner;

#[async_trait]
impl Planner for PassthroughPlanner {
    async fn decompose(&self, question: &str) -> Result<Vec<String>> {
        Ok(vec![question.trim().to_string()])
    }
}

fn build_planner_prompt(question: &str) -> String {
    format!(
        r#"You are a research planner. Break the question below into 3-5 specific, focused sub-questions.
Each sub-question must be answerable on its own. Put each sub-question on its own line.
Do not add any other text.

Question:
{}

Sub-questions:"#,
        question.trim()
    )
}

/// Clean a planner reply into an ordered list of sub-questions
pub fn parse_sub_questions(raw: &str) -> Vec<String> {
    raw.lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .collect()
}

fn clean_line(line: &str) -> String {
    let trimmed = line.trim();
    let without_marker = LIST_MARKER.replace(trimmed, "");
    without_marker
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '.' | '"' | '\'' | '`' | '*' | '_' | '“' | '”')
        })
        .to_string()
}
