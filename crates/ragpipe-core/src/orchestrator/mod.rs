//! Two-stage question answering
//!
//! A question is decomposed into sub-questions, each sub-question is
//! answered from retrieved context (concurrently, bounded), and the partial
//! answers are aggregated into one `Report`. The first unrecoverable error
//! aborts the whole query and no partial report is returned.

mod prompt;
mod report;
mod stages;

pub use prompt::{build_answer_prompt, build_synthesis_prompt, format_context};
pub use report::{render_sections, AggregationMode, Report, SubAnswer};
pub use stages::{Answered, Decomposed, PartialAnswer, QueryStage, Received};

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::llm::{Generator, Planner, RetryPolicy};
use crate::search::{Retriever, DEFAULT_K};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::sync::Arc;

/// Callback receiving every lifecycle transition
pub type StageObserver = Arc<dyn Fn(&QueryStage) + Send + Sync>;

/// Tuning for one orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Chunks retrieved per sub-question
    pub k: usize,
    /// Sub-questions processed at once
    pub max_concurrency: usize,
    pub aggregation: AggregationMode,
    /// Applied to planning and generation calls
    pub retry: RetryPolicy,
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            k: config.retrieval.k,
            max_concurrency: config.retrieval.max_concurrency.max(1),
            aggregation: config.retrieval.aggregation,
            retry: config.retry.policy()?,
        })
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            max_concurrency: 4,
            aggregation: AggregationMode::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Planner, retriever and generator wired into one query pipeline
pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    retriever: Arc<Retriever>,
    generator: Arc<dyn Generator>,
    options: OrchestratorOptions,
    observer: Option<StageObserver>,
}

impl Orchestrator {
    pub fn new(
        planner: Arc<dyn Planner>,
        retriever: Arc<Retriever>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            planner,
            retriever,
            generator,
            options: OrchestratorOptions::default(),
            observer: None,
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&QueryStage) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Answer `question` using `k` chunks per sub-question
    pub async fn answer(&self, question: &str, k: usize) -> Result<Report> {
        match self.run(question, k).await {
            Ok(report) => {
                self.emit(QueryStage::Done);
                Ok(report)
            }
            Err(e) => {
                tracing::warn!("Query failed: {}", e);
                self.emit(QueryStage::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Like `answer`, but gives up with `Cancelled` once `shutdown` resolves.
    ///
    /// In-flight branches are dropped; nothing needs rolling back.
    pub async fn answer_until<F>(&self, question: &str, k: usize, shutdown: F) -> Result<Report>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.answer(question, k) => result,
            _ = shutdown => {
                tracing::info!("Query cancelled");
                self.emit(QueryStage::Failed {
                    error: RagError::Cancelled.to_string(),
                });
                Err(RagError::Cancelled)
            }
        }
    }

    async fn run(&self, question: &str, k: usize) -> Result<Report> {
        let received = Received::new(question)?;
        self.emit(QueryStage::Received {
            question: received.question().to_string(),
        });

        let planned = self
            .options
            .retry
            .run("decompose", || self.planner.decompose(received.question()))
            .await
            .map_err(RagError::into_generation_failure)?;

        let decomposed = received.decompose(planned);
        self.emit(QueryStage::Decomposed {
            sub_questions: decomposed.sub_questions().to_vec(),
            fallback: decomposed.is_fallback(),
        });
        tracing::info!(
            "Answering {} sub-question(s) with k={}",
            decomposed.sub_questions().len(),
            k
        );

        let partials: Vec<PartialAnswer> = stream::iter(
            decomposed
                .sub_questions()
                .iter()
                .cloned()
                .enumerate()
                .collect::<Vec<_>>(),
        )
        .map(|(position, sub_question)| self.answer_sub_question(position, sub_question, k))
        .buffer_unordered(self.options.max_concurrency.max(1))
        .try_collect()
        .await?;

        let answered = decomposed.answered(partials)?;
        let sections: Vec<(String, String)> = answered
            .partials
            .iter()
            .map(|p| (p.sub_question.clone(), p.answer.clone()))
            .collect();

        let answer = match self.options.aggregation {
            AggregationMode::Sections => render_sections(&sections),
            AggregationMode::Synthesized if sections.len() == 1 => render_sections(&sections),
            AggregationMode::Synthesized => {
                let prompt = build_synthesis_prompt(&answered.question, &sections);
                self.generate("synthesize report", &prompt).await?
            }
        };
        self.emit(QueryStage::Aggregated);

        Ok(Report::new(answered, answer, self.options.aggregation))
    }

    async fn answer_sub_question(
        &self,
        position: usize,
        sub_question: String,
        k: usize,
    ) -> Result<PartialAnswer> {
        self.emit(QueryStage::Retrieving {
            position,
            sub_question: sub_question.clone(),
        });
        let retrieved = self.retriever.retrieve(&sub_question, k).await?;

        self.emit(QueryStage::Answering { position });
        let prompt = build_answer_prompt(&format_context(&retrieved), &sub_question);
        let answer = self.generate("answer sub-question", &prompt).await?;

        tracing::debug!("Sub-question {} answered", position);
        Ok(PartialAnswer {
            position,
            sub_question,
            retrieved,
            answer,
        })
    }

    async fn generate(&self, operation: &str, prompt: &str) -> Result<String> {
        let text = self
            .options
            .retry
            .run(operation, || self.generator.generate(prompt))
            .await
            .map_err(RagError::into_generation_failure)?;
        Ok(text.trim().to_string())
    }

    fn emit(&self, stage: QueryStage) {
        tracing::debug!("Query stage: {}", stage.name());
        if let Some(ref observer) = self.observer {
            observer(&stage);
        }
    }
}
