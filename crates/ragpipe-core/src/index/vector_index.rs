//! In-memory vector index with exhaustive nearest-neighbor search
//!
//! The index is built exactly once and is read-only afterwards, so queries
//! take no locks. Readiness is published through a `OnceLock`.

use super::chunker::Chunk;
use super::embedder::{embed_chunks, EmbedProgress};
use crate::error::{RagError, Result};
use crate::llm::{Embedder, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Distance metric, fixed for the lifetime of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// L2 distance
    #[default]
    Euclidean,
    /// 1 - cosine similarity
    Cosine,
}

impl DistanceMetric {
    /// Non-negative distance between two equal-length vectors
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            Self::Cosine => (1.0 - cosine_similarity(a, b)).max(0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            other => Err(RagError::InvalidInput(format!(
                "Unknown distance metric: {}",
                other
            ))),
        }
    }
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// One retrieved chunk and its distance to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Distance under the index metric, lower is more similar
    pub score: f32,
}

/// Ranked chunks for one query, best match first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn best(&self) -> Option<&ScoredChunk> {
        self.hits.first()
    }

    /// Chunk indices in rank order
    pub fn chunk_indices(&self) -> Vec<usize> {
        self.hits.iter().map(|h| h.chunk.index).collect()
    }
}

/// Options for `VectorIndex::build`
pub struct BuildOptions {
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub progress: Option<Box<dyn Fn(EmbedProgress) + Send + Sync>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            retry: RetryPolicy::default(),
            progress: None,
        }
    }
}

struct IndexData {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
    model: Option<String>,
}

/// Resets the in-progress flag when a build ends, successfully or not.
struct BuildGuard<'a>(&'a AtomicBool);

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Build-once, query-many vector index
pub struct VectorIndex {
    metric: DistanceMetric,
    data: OnceLock<IndexData>,
    building: AtomicBool,
}

impl VectorIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            data: OnceLock::new(),
            building: AtomicBool::new(false),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Embed every chunk and populate the index.
    ///
    /// All-or-nothing: if any embedding call fails the index stays unbuilt.
    pub async fn build(
        &self,
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        options: &BuildOptions,
    ) -> Result<()> {
        let _guard = self.begin_build()?;
        validate_chunks(&chunks)?;

        let vectors = embed_chunks(&chunks, embedder, options).await?;
        let declared = embedder.dimensions();
        let dimensions = validate_vectors(&chunks, &vectors, (declared > 0).then_some(declared))?;

        self.publish(IndexData {
            chunks,
            vectors,
            dimensions,
            model: Some(embedder.model_name().to_string()),
        })
    }

    /// Populate the index from precomputed vectors (e.g. a loaded snapshot)
    pub fn build_from_vectors(
        &self,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        model: Option<String>,
    ) -> Result<()> {
        let _guard = self.begin_build()?;
        validate_chunks(&chunks)?;
        let dimensions = validate_vectors(&chunks, &vectors, None)?;

        self.publish(IndexData {
            chunks,
            vectors,
            dimensions,
            model,
        })
    }

    /// k nearest chunks, ascending distance, ties by ascending chunk index
    pub fn query(&self, vector: &[f32], k: usize) -> Result<RetrievalResult> {
        let data = self.data.get().ok_or(RagError::IndexNotReady)?;

        if vector.len() != data.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: data.dimensions,
                actual: vector.len(),
            });
        }

        let mut ranked: Vec<(usize, f32)> = data
            .vectors
            .iter()
            .enumerate()
            .map(|(i, stored)| (i, self.metric.distance(vector, stored)))
            .collect();

        ranked.sort_by(|a, b| compare_hits(a, b));
        ranked.truncate(k.min(data.chunks.len()));

        Ok(RetrievalResult {
            hits: ranked
                .into_iter()
                .map(|(i, score)| ScoredChunk {
                    chunk: data.chunks[i].clone(),
                    score,
                })
                .collect(),
        })
    }

    /// Whether a build has completed
    pub fn is_ready(&self) -> bool {
        self.data.get().is_some()
    }

    /// Number of indexed chunks (0 until built)
    pub fn len(&self) -> usize {
        self.data.get().map(|d| d.chunks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.data.get().map(|d| d.dimensions)
    }

    pub fn model_name(&self) -> Option<&str> {
        self.data.get().and_then(|d| d.model.as_deref())
    }

    pub fn chunks(&self) -> Result<&[Chunk]> {
        self.data
            .get()
            .map(|d| d.chunks.as_slice())
            .ok_or(RagError::IndexNotReady)
    }

    pub fn vectors(&self) -> Result<&[Vec<f32>]> {
        self.data
            .get()
            .map(|d| d.vectors.as_slice())
            .ok_or(RagError::IndexNotReady)
    }

    fn begin_build(&self) -> Result<BuildGuard<'_>> {
        if self.is_ready() || self.building.swap(true, Ordering::AcqRel) {
            return Err(RagError::IndexAlreadyBuilt);
        }
        Ok(BuildGuard(&self.building))
    }

    fn publish(&self, data: IndexData) -> Result<()> {
        let count = data.chunks.len();
        let dimensions = data.dimensions;
        self.data
            .set(data)
            .map_err(|_| RagError::IndexAlreadyBuilt)?;
        tracing::info!(
            "Built vector index: {} chunks, {} dimensions, {} metric",
            count,
            dimensions,
            self.metric.as_str()
        );
        Ok(())
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new(DistanceMetric::default())
    }
}

fn compare_hits(a: &(usize, f32), b: &(usize, f32)) -> CmpOrdering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

fn validate_chunks(chunks: &[Chunk]) -> Result<()> {
    if chunks.is_empty() {
        return Err(RagError::EmptyCorpus);
    }
    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.index != i {
            return Err(RagError::InvalidInput(format!(
                "Chunk at position {} has index {}; chunks must be in index order",
                i, chunk.index
            )));
        }
        if chunk.text.is_empty() {
            return Err(RagError::InvalidInput(format!("Chunk {} is empty", i)));
        }
    }
    Ok(())
}

/// One vector per chunk, all of the same non-zero length
fn validate_vectors(
    chunks: &[Chunk],
    vectors: &[Vec<f32>],
    declared: Option<usize>,
) -> Result<usize> {
    if vectors.len() != chunks.len() {
        return Err(RagError::InvalidInput(format!(
            "Got {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    let expected = declared.unwrap_or(vectors[0].len());
    if expected == 0 {
        return Err(RagError::InvalidInput(
            "Embedding vectors must not be empty".to_string(),
        ));
    }

    for vector in vectors {
        if vector.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
    }

    Ok(expected)
}
