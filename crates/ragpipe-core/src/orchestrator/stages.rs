//! Typed records for each stage of a query's lifecycle

use crate::error::{RagError, Result};
use crate::index::RetrievalResult;
use serde::Serialize;

/// Lifecycle events reported to an observer, in the order they happen.
///
/// `Retrieving` and `Answering` events of different sub-questions may
/// interleave; within one sub-question retrieval precedes answering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum QueryStage {
    Received {
        question: String,
    },
    Decomposed {
        sub_questions: Vec<String>,
        /// The planner returned nothing and the question is used as is
        fallback: bool,
    },
    Retrieving {
        position: usize,
        sub_question: String,
    },
    Answering {
        position: usize,
    },
    Aggregated,
    Done,
    Failed {
        error: String,
    },
}

impl QueryStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Received { .. } => "received",
            Self::Decomposed { .. } => "decomposed",
            Self::Retrieving { .. } => "retrieving",
            Self::Answering { .. } => "answering",
            Self::Aggregated => "aggregated",
            Self::Done => "done",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

/// A validated incoming question
#[derive(Debug, Clone)]
pub struct Received {
    question: String,
}

impl Received {
    pub fn new(question: &str) -> Result<Self> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidInput("Question is empty".to_string()));
        }
        Ok(Self {
            question: question.to_string(),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Move to the decomposed stage. An empty plan falls back to the
    /// original question as the only sub-question.
    pub fn decompose(self, planned: Vec<String>) -> Decomposed {
        let planned: Vec<String> = planned
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        if planned.is_empty() {
            tracing::info!("Planner returned no sub-questions, using the question itself");
            Decomposed {
                sub_questions: vec![self.question.clone()],
                question: self.question,
                fallback: true,
            }
        } else {
            Decomposed {
                question: self.question,
                sub_questions: planned,
                fallback: false,
            }
        }
    }
}

/// The question with its ordered, non-empty sub-questions
#[derive(Debug, Clone)]
pub struct Decomposed {
    question: String,
    sub_questions: Vec<String>,
    fallback: bool,
}

impl Decomposed {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn sub_questions(&self) -> &[String] {
        &self.sub_questions
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Collect partial answers, restoring planner order regardless of the
    /// order they completed in.
    pub fn answered(self, mut partials: Vec<PartialAnswer>) -> Result<Answered> {
        partials.sort_by_key(|p| p.position);

        let complete = partials.len() == self.sub_questions.len()
            && partials.iter().enumerate().all(|(i, p)| p.position == i);
        if !complete {
            return Err(RagError::Other(anyhow::anyhow!(
                "Expected {} partial answers, got {}",
                self.sub_questions.len(),
                partials.len()
            )));
        }

        Ok(Answered {
            question: self.question,
            decomposed: !self.fallback,
            partials,
        })
    }
}

/// One sub-question's retrieval and generated answer
#[derive(Debug, Clone)]
pub struct PartialAnswer {
    pub position: usize,
    pub sub_question: String,
    pub retrieved: RetrievalResult,
    pub answer: String,
}

/// Every sub-question answered, in planner order
#[derive(Debug, Clone)]
pub struct Answered {
    pub question: String,
    pub decomposed: bool,
    pub partials: Vec<PartialAnswer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(position: usize) -> PartialAnswer {
        PartialAnswer {
            position,
            sub_question: format!("q{}", position),
            retrieved: RetrievalResult::default(),
            answer: format!("a{}", position),
        }
    }

    #[test]
    fn test_empty_question_rejected() {
        assert!(matches!(
            Received::new("   ").unwrap_err(),
            RagError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_empty_plan_falls_back() {
        let decomposed = Received::new(" What is X? ")
            .unwrap()
            .decompose(vec!["  ".to_string()]);
        assert!(decomposed.is_fallback());
        assert_eq!(decomposed.sub_questions(), ["What is X?".to_string()]);
    }

    #[test]
    fn test_answered_restores_order() {
        let decomposed = Received::new("q")
            .unwrap()
            .decompose(vec!["q0".into(), "q1".into(), "q2".into()]);
        let answered = decomposed
            .answered(vec![partial(2), partial(0), partial(1)])
            .unwrap();
        let positions: Vec<usize> = answered.partials.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(answered.decomposed);
    }

    #[test]
    fn test_answered_rejects_missing_partials() {
        let decomposed = Received::new("q")
            .unwrap()
            .decompose(vec!["q0".into(), "q1".into()]);
        assert!(decomposed.answered(vec![partial(1)]).is_err());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(QueryStage::Done.is_terminal());
        assert!(QueryStage::Failed {
            error: "x".into()
        }
        .is_terminal());
        assert!(!QueryStage::Aggregated.is_terminal());
        assert_eq!(QueryStage::Aggregated.name(), "aggregated");
    }
}
