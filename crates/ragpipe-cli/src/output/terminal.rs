//! Terminal output, colored when stdout is a terminal

use super::markdown::join_indices;
use ragpipe_core::{Chunk, Report, RetrievalResult};
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout() -> StandardStream {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn label(out: &mut StandardStream, text: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{}", text)?;
    out.reset()
}

pub fn print_chunks(chunks: &[Chunk]) -> io::Result<()> {
    let mut out = stdout();
    for c in chunks {
        label(&mut out, &format!("chunk {}", c.index), Color::Cyan)?;
        let source = c.source_id.as_deref().unwrap_or("-");
        writeln!(
            out,
            " {} ({} chars, {} overlap)",
            source,
            c.text.chars().count(),
            c.overlap
        )?;
        for line in c.text.lines() {
            writeln!(out, "  {}", line)?;
        }
        writeln!(out)?;
    }
    out.flush()
}

pub fn print_retrieval(result: &RetrievalResult) -> io::Result<()> {
    let mut out = stdout();
    if result.is_empty() {
        return writeln!(out, "No results found");
    }
    for hit in &result.hits {
        label(&mut out, &format!("{:>8.4}", hit.score), Color::Green)?;
        writeln!(
            out,
            " chunk {} {}",
            hit.chunk.index,
            hit.chunk.source_id.as_deref().unwrap_or("")
        )?;
        for line in hit.chunk.text.lines().take(5) {
            writeln!(out, "  {}", line)?;
        }
        if hit.chunk.text.lines().count() > 5 {
            writeln!(out, "  ...")?;
        }
    }
    out.flush()
}

pub fn print_report(report: &Report) -> io::Result<()> {
    let mut out = stdout();
    writeln!(out, "{}\n", report.answer)?;

    if report.decomposed {
        label(&mut out, "Sub-questions", Color::Yellow)?;
        writeln!(out)?;
        for sub in &report.sub_answers {
            writeln!(
                out,
                "  {}. {} [chunks: {}]",
                sub.position + 1,
                sub.sub_question,
                join_indices(&sub.cited_chunks)
            )?;
        }
    } else if let Some(sub) = report.sub_answers.first() {
        writeln!(out, "[chunks: {}]", join_indices(&sub.cited_chunks))?;
    }
    out.flush()
}
