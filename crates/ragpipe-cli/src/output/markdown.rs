//! Markdown output formatter

use ragpipe_core::{Chunk, Report, RetrievalResult};

pub fn format_chunks(chunks: &[Chunk]) -> String {
    let mut output = String::from("# Chunks\n\n");

    for c in chunks {
        output.push_str(&format!("## Chunk {}\n\n", c.index));
        if let Some(ref source) = c.source_id {
            output.push_str(&format!("- **Source**: `{}`\n", source));
        }
        output.push_str(&format!("- **Overlap**: {} chars\n\n", c.overlap));
        output.push_str(&format!("```text\n{}\n```\n\n", c.text));
    }

    if chunks.is_empty() {
        output.push_str("*No chunks*\n");
    }

    output
}

pub fn format_retrieval(query: &str, result: &RetrievalResult) -> String {
    let mut output = format!("# Results for \"{}\"\n\n", query);

    for (i, hit) in result.hits.iter().enumerate() {
        output.push_str(&format!(
            "## {}. Chunk {} (Distance: {:.4})\n\n",
            i + 1,
            hit.chunk.index,
            hit.score
        ));
        if let Some(ref source) = hit.chunk.source_id {
            output.push_str(&format!("- **Source**: `{}`\n\n", source));
        }
        output.push_str(&format!("{}\n\n---\n\n", hit.chunk.text.trim()));
    }

    if result.is_empty() {
        output.push_str("*No results found*\n");
    }

    output
}

pub fn format_report(report: &Report) -> String {
    let mut output = format!("# {}\n\n", report.question);
    output.push_str(&format!("{}\n\n", report.answer));

    if report.decomposed {
        output.push_str("## Sub-questions\n\n");
        for sub in &report.sub_answers {
            output.push_str(&format!(
                "{}. {} (chunks: {})\n",
                sub.position + 1,
                sub.sub_question,
                join_indices(&sub.cited_chunks)
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "*Generated {} ({})*\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.mode.as_str()
    ));
    output
}

pub(crate) fn join_indices(indices: &[usize]) -> String {
    if indices.is_empty() {
        return "none".to_string();
    }
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
