//! Index command

use super::ingest::read_documents;
use super::snapshot_path;
use crate::app::{IndexArgs, OutputFormat};
use crate::{output, progress};
use anyhow::Result;
use ragpipe_core::index::{chunk_documents, BuildOptions};
use ragpipe_core::{Config, Database, HttpEmbedder, VectorIndex};

pub async fn run(args: IndexArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let docs = read_documents(&args.files)?;
    let chunks = chunk_documents(&docs, &config.chunking.strategy()?);
    tracing::info!("{} document(s) produced {} chunks", docs.len(), chunks.len());

    let embedder = HttpEmbedder::from_config(config.llm_service.clone())?;
    let options = BuildOptions {
        batch_size: args
            .batch_size
            .unwrap_or(config.retrieval.embed_batch_size),
        retry: config.retry.policy()?,
        progress: Some(progress::embed_progress()),
    };

    let index = VectorIndex::new(config.retrieval.metric);
    let built = index.build(chunks, &embedder, &options).await;
    progress::finish();
    built?;

    let path = snapshot_path(args.snapshot);
    let db = Database::open(&path)?;
    db.initialize()?;
    let info = db.save_index(&index)?;

    output::print_snapshot(&info, &path, format)?;
    Ok(())
}
