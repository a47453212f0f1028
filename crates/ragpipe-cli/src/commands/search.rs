//! Search command

use super::{load_snapshot, snapshot_path};
use crate::app::{OutputFormat, SearchArgs};
use crate::output;
use anyhow::Result;
use ragpipe_core::{Config, HttpEmbedder, Retriever};
use std::sync::Arc;

pub async fn run(args: SearchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let query = args.query.join(" ");
    let k = args.k.unwrap_or(config.retrieval.k);

    let index = load_snapshot(&snapshot_path(args.snapshot))?;
    let embedder = HttpEmbedder::from_config(config.llm_service.clone())?;
    let retriever =
        Retriever::new(Arc::new(embedder), Arc::new(index)).with_retry(config.retry.policy()?);

    let result = retriever.retrieve(&query, k).await?;
    output::print_retrieval(&query, &result, format)?;
    Ok(())
}
