//! Embedding pipeline: chunks in, one vector per chunk out

use super::chunker::Chunk;
use super::vector_index::BuildOptions;
use crate::error::{RagError, Result};
use crate::llm::Embedder;

/// Embedding progress
#[derive(Debug, Clone, Copy)]
pub struct EmbedProgress {
    pub total_chunks: usize,
    pub embedded_chunks: usize,
    pub batches_done: usize,
}

/// Embed chunks in batches, preserving order one-to-one.
///
/// Each batch goes through the retry policy; the first permanent failure
/// aborts the whole run and nothing is returned.
pub async fn embed_chunks(
    chunks: &[Chunk],
    embedder: &dyn Embedder,
    options: &BuildOptions,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = options.batch_size.max(1);
    let total = chunks.len();
    let mut vectors = Vec::with_capacity(total);

    tracing::info!(
        "Embedding {} chunks with {} (batch size {})",
        total,
        embedder.model_name(),
        batch_size
    );

    for (batch_idx, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

        let embeddings = options
            .retry
            .run("embed batch", || embedder.embed_batch(&texts))
            .await
            .map_err(RagError::into_embedding_failure)?;

        if embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingFailure(format!(
                "Gateway returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        vectors.extend(embeddings);
        tracing::debug!("Embedded batch {} ({}/{})", batch_idx + 1, vectors.len(), total);

        if let Some(ref callback) = options.progress {
            callback(EmbedProgress {
                total_chunks: total,
                embedded_chunks: vectors.len(),
                batches_done: batch_idx + 1,
            });
        }
    }

    Ok(vectors)
}
