//! Query-time retrieval: embed the query, then rank the corpus

use crate::error::{RagError, Result};
use crate::index::{RetrievalResult, VectorIndex};
use crate::llm::{Embedder, RetryPolicy};
use std::sync::Arc;

/// Number of chunks returned when the caller does not choose
pub const DEFAULT_K: usize = 1;

/// Embedding gateway plus a built vector index
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<VectorIndex>>,
    retry: RetryPolicy,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<VectorIndex>) -> Self {
        Self {
            embedder,
            index: Some(index),
            retry: RetryPolicy::default(),
        }
    }

    /// Retriever with no documents loaded; every query yields nothing
    pub fn without_corpus(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn index(&self) -> Option<&Arc<VectorIndex>> {
        self.index.as_ref()
    }

    /// Top-k chunks for `query`, best first
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let Some(ref index) = self.index else {
            tracing::debug!("No corpus loaded, skipping retrieval");
            return Ok(RetrievalResult::default());
        };
        if !index.is_ready() {
            return Err(RagError::IndexNotReady);
        }
        if k == 0 {
            return Ok(RetrievalResult::default());
        }

        let query_vector = self
            .retry
            .run("embed query", || self.embedder.embed(query))
            .await
            .map_err(RagError::into_embedding_failure)?;

        let result = index.query(&query_vector, k)?;
        tracing::debug!(
            "Retrieved {} chunk(s) for query {:?}: {:?}",
            result.len(),
            query,
            result.chunk_indices()
        );
        Ok(result)
    }

    /// Best `DEFAULT_K` chunks
    pub async fn retrieve_top(&self, query: &str) -> Result<RetrievalResult> {
        self.retrieve(query, DEFAULT_K).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Chunk;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps text to [len, count of 'a']
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn vector(text: &str) -> Vec<f32> {
            vec![
                text.len() as f32,
                text.chars().filter(|c| *c == 'a').count() as f32,
            ]
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn built_index() -> Arc<VectorIndex> {
        let chunks = vec![
            Chunk::new(0, "aaaa"),
            Chunk::new(1, "bbbbbbbb"),
            Chunk::new(2, "ab"),
        ];
        let vectors = chunks.iter().map(|c| CountingEmbedder::vector(&c.text)).collect();
        let index = VectorIndex::default();
        index.build_from_vectors(chunks, vectors, None).unwrap();
        Arc::new(index)
    }

    #[tokio::test]
    async fn test_retrieve_nearest() {
        let retriever = Retriever::new(Arc::new(CountingEmbedder::new()), built_index());
        let result = retriever.retrieve("aaab", 2).await.unwrap();
        assert_eq!(result.chunk_indices(), vec![0, 2]);

        let top = retriever.retrieve_top("bbbbbbba").await.unwrap();
        assert_eq!(top.chunk_indices(), vec![1]);
    }

    #[tokio::test]
    async fn test_without_corpus_skips_gateway() {
        let embedder = Arc::new(CountingEmbedder::new());
        let retriever = Retriever::without_corpus(embedder.clone());
        let result = retriever.retrieve("anything", 3).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unbuilt_index_not_ready() {
        let retriever = Retriever::new(
            Arc::new(CountingEmbedder::new()),
            Arc::new(VectorIndex::default()),
        );
        let err = retriever.retrieve("q", 1).await.unwrap_err();
        assert!(matches!(err, RagError::IndexNotReady));

        let err = retriever.retrieve("q", 0).await.unwrap_err();
        assert!(matches!(err, RagError::IndexNotReady));
    }

    #[tokio::test]
    async fn test_zero_k_on_built_index_skips_gateway() {
        let embedder = Arc::new(CountingEmbedder::new());
        let retriever = Retriever::new(embedder.clone(), built_index());
        assert!(retriever.retrieve("a", 0).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_k_is_clamped() {
        let retriever = Retriever::new(Arc::new(CountingEmbedder::new()), built_index());
        let result = retriever.retrieve("a", 50).await.unwrap();
        assert_eq!(result.len(), 3);
    }
}
