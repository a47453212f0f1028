//! Final report assembled from partial answers

use super::stages::Answered;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How partial answers are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// One section per sub-question, in planner order
    #[default]
    Sections,
    /// One extra generation call fusing the partial answers
    Synthesized,
}

impl AggregationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sections => "sections",
            Self::Synthesized => "synthesized",
        }
    }
}

/// Answer to one sub-question, with the chunks it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAnswer {
    pub position: usize,
    pub sub_question: String,
    pub answer: String,
    /// Chunk indices in rank order
    pub cited_chunks: Vec<usize>,
}

/// Complete answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub question: String,
    pub answer: String,
    pub mode: AggregationMode,
    /// False when the planner produced nothing and the question was used as is
    pub decomposed: bool,
    pub sub_answers: Vec<SubAnswer>,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub(crate) fn new(answered: Answered, answer: String, mode: AggregationMode) -> Self {
        let sub_answers = answered
            .partials
            .into_iter()
            .map(|p| SubAnswer {
                position: p.position,
                cited_chunks: p.retrieved.chunk_indices(),
                sub_question: p.sub_question,
                answer: p.answer,
            })
            .collect();

        Self {
            question: answered.question,
            answer,
            mode,
            decomposed: answered.decomposed,
            sub_answers,
            generated_at: Utc::now(),
        }
    }

    /// Every chunk index cited by any sub-answer, first citation order
    pub fn cited_chunks(&self) -> Vec<usize> {
        let mut seen = Vec::new();
        for idx in self.sub_answers.iter().flat_map(|s| s.cited_chunks.iter()) {
            if !seen.contains(idx) {
                seen.push(*idx);
            }
        }
        seen
    }
}

/// Render partial answers as one section each
pub fn render_sections(sections: &[(String, String)]) -> String {
    if let [(_, only)] = sections {
        return only.trim().to_string();
    }
    sections
        .iter()
        .map(|(sub_question, answer)| format!("## {}\n\n{}", sub_question, answer.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_keep_order() {
        let rendered = render_sections(&[
            ("A?".to_string(), "a".to_string()),
            ("B?".to_string(), " b ".to_string()),
        ]);
        assert_eq!(rendered, "## A?\n\na\n\n## B?\n\nb");
    }

    #[test]
    fn test_single_section_is_plain_answer() {
        let rendered = render_sections(&[("A?".to_string(), " only ".to_string())]);
        assert_eq!(rendered, "only");
    }

    #[test]
    fn test_mode_serde() {
        let mode: AggregationMode = serde_json::from_str("\"synthesized\"").unwrap();
        assert_eq!(mode, AggregationMode::Synthesized);
        assert_eq!(AggregationMode::default().as_str(), "sections");
    }
}
