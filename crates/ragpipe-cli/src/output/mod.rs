//! Output formatters

pub mod json;
pub mod markdown;
pub mod terminal;

use crate::app::OutputFormat;
use ragpipe_core::{Chunk, Report, RetrievalResult, SnapshotInfo};
use std::io::{self, Write};
use std::path::Path;

pub fn print_chunks(chunks: &[Chunk], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => print_plain(&json::format_chunks(chunks)),
        OutputFormat::Md => print_plain(&markdown::format_chunks(chunks)),
        OutputFormat::Cli => terminal::print_chunks(chunks),
    }
}

pub fn print_retrieval(query: &str, result: &RetrievalResult, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => print_plain(&json::format_retrieval(query, result)),
        OutputFormat::Md => print_plain(&markdown::format_retrieval(query, result)),
        OutputFormat::Cli => terminal::print_retrieval(result),
    }
}

pub fn print_report(report: &Report, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => print_plain(&json::format_report(report)),
        OutputFormat::Md => print_plain(&markdown::format_report(report)),
        OutputFormat::Cli => terminal::print_report(report),
    }
}

pub fn print_snapshot(info: &SnapshotInfo, path: &Path, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => print_plain(&json::format_snapshot(info, path)),
        _ => print_plain(&format!(
            "Indexed {} chunks ({} dimensions, {} metric) into {}\n",
            info.chunk_count,
            info.dimensions,
            info.metric.as_str(),
            path.display()
        )),
    }
}

fn print_plain(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}
