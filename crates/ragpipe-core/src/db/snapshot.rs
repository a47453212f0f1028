//! Persisting a built vector index and loading it back

use super::Database;
use crate::error::{RagError, Result};
use crate::index::{Chunk, DistanceMetric, VectorIndex};
use rusqlite::{params, OptionalExtension};

/// Summary of the stored snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub metric: DistanceMetric,
    pub dimensions: usize,
    pub model: Option<String>,
    pub chunk_count: usize,
    pub fingerprint: String,
    pub created_at: String,
}

impl Database {
    /// Replace the stored snapshot with the contents of a built index
    pub fn save_index(&self, index: &VectorIndex) -> Result<SnapshotInfo> {
        let chunks = index.chunks()?;
        let vectors = index.vectors()?;
        let dimensions = index.dimensions().ok_or(RagError::IndexNotReady)?;
        let fingerprint = corpus_fingerprint(index.metric(), chunks, vectors);
        let created_at = chrono::Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM vectors", [])?;
        tx.execute("DELETE FROM chunks", [])?;
        tx.execute("DELETE FROM snapshot_meta", [])?;

        {
            let mut insert_chunk = tx.prepare(
                "INSERT INTO chunks (idx, source_id, text, overlap) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_vector =
                tx.prepare("INSERT INTO vectors (idx, embedding) VALUES (?1, ?2)")?;

            for (chunk, vector) in chunks.iter().zip(vectors) {
                insert_chunk.execute(params![
                    chunk.index as i64,
                    chunk.source_id,
                    chunk.text,
                    chunk.overlap as i64
                ])?;
                insert_vector.execute(params![chunk.index as i64, embedding_to_bytes(vector)])?;
            }
        }

        tx.execute(
            "INSERT INTO snapshot_meta (id, metric, dimensions, model, chunk_count, fingerprint, created_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                index.metric().as_str(),
                dimensions as i64,
                index.model_name(),
                chunks.len() as i64,
                fingerprint,
                created_at
            ],
        )?;
        tx.commit()?;

        tracing::info!(
            "Saved snapshot: {} chunks, {} dimensions",
            chunks.len(),
            dimensions
        );

        Ok(SnapshotInfo {
            metric: index.metric(),
            dimensions,
            model: index.model_name().map(str::to_string),
            chunk_count: chunks.len(),
            fingerprint,
            created_at,
        })
    }

    /// Stored snapshot summary, or None when nothing was saved
    pub fn snapshot_info(&self) -> Result<Option<SnapshotInfo>> {
        let row = self
            .conn
            .query_row(
                "SELECT metric, dimensions, model, chunk_count, fingerprint, created_at
                 FROM snapshot_meta WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((metric, dimensions, model, chunk_count, fingerprint, created_at)) = row else {
            return Ok(None);
        };

        let metric = DistanceMetric::parse(&metric)
            .map_err(|_| RagError::Snapshot(format!("Unknown metric in snapshot: {}", metric)))?;

        Ok(Some(SnapshotInfo {
            metric,
            dimensions: dimensions as usize,
            model,
            chunk_count: chunk_count as usize,
            fingerprint,
            created_at,
        }))
    }

    /// Rebuild a ready index from the stored snapshot.
    ///
    /// Alignment, dimensionality and the fingerprint are checked again, so
    /// a tampered or truncated snapshot is rejected rather than served.
    pub fn load_index(&self) -> Result<VectorIndex> {
        let info = self.snapshot_info()?.ok_or(RagError::IndexNotReady)?;

        let mut stmt = self
            .conn
            .prepare("SELECT idx, source_id, text, overlap FROM chunks ORDER BY idx")?;
        let chunks = stmt
            .query_map([], |row| {
                Ok(Chunk {
                    index: row.get::<_, i64>(0)? as usize,
                    source_id: row.get(1)?,
                    text: row.get(2)?,
                    overlap: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT idx, embedding FROM vectors ORDER BY idx")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as usize, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if chunks.len() != info.chunk_count || rows.len() != info.chunk_count {
            return Err(RagError::Snapshot(format!(
                "Snapshot declares {} chunks but holds {} chunks and {} vectors",
                info.chunk_count,
                chunks.len(),
                rows.len()
            )));
        }

        let mut vectors = Vec::with_capacity(rows.len());
        for (position, (idx, bytes)) in rows.into_iter().enumerate() {
            if idx != position {
                return Err(RagError::Snapshot(format!(
                    "Vector for chunk {} found at position {}",
                    idx, position
                )));
            }
            if bytes.len() != info.dimensions * 4 {
                return Err(RagError::Snapshot(format!(
                    "Vector {} has {} bytes, expected {}",
                    idx,
                    bytes.len(),
                    info.dimensions * 4
                )));
            }
            vectors.push(bytes_to_embedding(&bytes));
        }

        let fingerprint = corpus_fingerprint(info.metric, &chunks, &vectors);
        if fingerprint != info.fingerprint {
            return Err(RagError::Snapshot(
                "Snapshot fingerprint does not match its contents".to_string(),
            ));
        }

        let index = VectorIndex::new(info.metric);
        index
            .build_from_vectors(chunks, vectors, info.model)
            .map_err(|e| RagError::Snapshot(e.to_string()))?;

        tracing::info!("Loaded snapshot: {} chunks", info.chunk_count);
        Ok(index)
    }
}

/// Content hash over metric, chunks and vectors
pub fn corpus_fingerprint(metric: DistanceMetric, chunks: &[Chunk], vectors: &[Vec<f32>]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(metric.as_str().as_bytes());
    for (chunk, vector) in chunks.iter().zip(vectors) {
        hasher.update(&(chunk.index as u64).to_le_bytes());
        hasher.update(chunk.source_id.as_deref().unwrap_or("").as_bytes());
        hasher.update(&[0]);
        hasher.update(&(chunk.overlap as u64).to_le_bytes());
        hasher.update(chunk.text.as_bytes());
        hasher.update(&[0]);
        hasher.update(&embedding_to_bytes(vector));
    }
    hasher.finalize().to_hex().to_string()
}

/// Convert embedding to bytes for storage
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes back to embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
