//! Prompt templates for answering and synthesis

use crate::index::RetrievalResult;

/// Context block from retrieved chunks, best match first
pub fn format_context(retrieved: &RetrievalResult) -> String {
    retrieved
        .hits
        .iter()
        .map(|hit| hit.chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt answering one sub-question from its retrieved context
pub fn build_answer_prompt(context: &str, question: &str) -> String {
    if context.is_empty() {
        return format!(
            "No context was found for this question. Answer briefly and say so if you do not know.\n\nQuestion: {}\nAnswer:",
            question
        );
    }
    format!("Context:\n{}\n\nQuestion: {}\nAnswer:", context, question)
}

/// Prompt fusing partial answers into one unified answer
pub fn build_synthesis_prompt(question: &str, partials: &[(String, String)]) -> String {
    let findings = partials
        .iter()
        .enumerate()
        .map(|(i, (sub_question, answer))| {
            format!("{}. {}\n{}", i + 1, sub_question, answer.trim())
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are writing a single report that answers the question below.
Combine the findings for each sub-question into one coherent answer.
Use only the information in the findings.

Question: {}

Findings:
{}

Report:"#,
        question, findings
    )
}
