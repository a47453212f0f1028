//! Chunk command

use super::ingest::read_documents;
use crate::app::{ChunkArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use ragpipe_core::index::{chunk_documents, CharacterChunker, ChunkingStrategy, SentenceChunker};
use ragpipe_core::Config;

pub async fn run(args: ChunkArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let strategy = strategy_from_args(&args, config)?;
    let docs = read_documents(&args.files)?;
    let chunks = chunk_documents(&docs, &strategy);

    tracing::info!("{} document(s) produced {} chunks", docs.len(), chunks.len());
    output::print_chunks(&chunks, format)?;
    Ok(())
}

/// Command-line chunking flags take precedence over the config file
fn strategy_from_args(args: &ChunkArgs, config: &Config) -> Result<ChunkingStrategy> {
    if let Some(n) = args.sentences {
        return Ok(ChunkingStrategy::Sentence(SentenceChunker::new(n)?));
    }
    if let Some(size) = args.chars {
        let defaults = CharacterChunker::default();
        let overlap = args
            .overlap
            .unwrap_or_else(|| defaults.chunk_overlap().min(size.saturating_sub(1)));
        let separator = args
            .separator
            .as_deref()
            .map(unescape)
            .unwrap_or_else(|| defaults.separator().to_string());
        return Ok(ChunkingStrategy::Character(CharacterChunker::new(
            separator, size, overlap,
        )?));
    }
    Ok(config.chunking.strategy()?)
}

/// Allow `\n` and `\t` to be typed literally on the command line
fn unescape(s: &str) -> String {
    s.replace("\\n", "\n").replace("\\t", "\t")
}
