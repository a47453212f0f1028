//! Document chunking for embedding
//!
//! Two policies are supported: grouping whole sentences, or accumulating
//! separator-delimited pieces up to a character budget with optional overlap.

use crate::error::{RagError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Chunking defaults
pub const DEFAULT_SENTENCES_PER_CHUNK: usize = 5;
pub const DEFAULT_CHUNK_SIZE_CHARS: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP_CHARS: usize = 200;
pub const DEFAULT_SEPARATOR: &str = "\n";

lazy_static! {
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n[ \t]*\n\s*").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Document chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the corpus, aligned with the vector at the same index
    pub index: usize,
    pub text: String,
    /// Document this chunk came from, for multi-document corpora
    pub source_id: Option<String>,
    /// Number of leading characters repeated from the previous chunk
    pub overlap: usize,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            source_id: None,
            overlap: 0,
        }
    }

    /// Text without the prefix repeated from the previous chunk
    pub fn body(&self) -> &str {
        let start = self
            .text
            .char_indices()
            .nth(self.overlap)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        &self.text[start..]
    }
}

/// Raw text of one document, as produced by ingestion
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Line endings unified to LF, outer whitespace trimmed
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Split normalized text into trimmed, non-empty sentences.
///
/// Hard-wrapped lines are joined back together; blank lines still end a
/// sentence so headings do not bleed into the following paragraph.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let mut sentences = Vec::new();

    for paragraph in PARAGRAPH_BREAK.split(&normalized) {
        let flat = WHITESPACE_RUN.replace_all(paragraph, " ");
        sentences.extend(
            flat.split_sentence_bounds()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }

    sentences
}

/// Groups consecutive sentences into fixed-size chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunker {
    sentences_per_chunk: usize,
}

impl SentenceChunker {
    pub fn new(sentences_per_chunk: usize) -> Result<Self> {
        if sentences_per_chunk == 0 {
            return Err(RagError::InvalidInput(
                "sentences_per_chunk must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            sentences_per_chunk,
        })
    }

    pub fn sentences_per_chunk(&self) -> usize {
        self.sentences_per_chunk
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        split_sentences(text)
            .chunks(self.sentences_per_chunk)
            .enumerate()
            .map(|(i, group)| Chunk::new(i, group.join(" ")))
            .collect()
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self {
            sentences_per_chunk: DEFAULT_SENTENCES_PER_CHUNK,
        }
    }
}

/// Accumulates separator-delimited pieces up to a character budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterChunker {
    separator: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CharacterChunker {
    pub fn new(separator: impl Into<String>, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(RagError::InvalidInput(
                "chunk separator must not be empty".to_string(),
            ));
        }
        if chunk_size == 0 {
            return Err(RagError::InvalidInput(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            separator,
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        // Byte range and character count of the pending body
        let mut start = 0;
        let mut end = 0;
        let mut body_chars = 0;
        let mut has_content = false;
        // Overlap the pending chunk may repeat from the previous one
        let mut planned = 0;

        for piece in normalized.split_inclusive(self.separator.as_str()) {
            let piece_chars = piece.chars().count();

            if has_content && planned + body_chars + piece_chars > self.chunk_size {
                let chunk =
                    self.finish_chunk(&normalized, chunks.len(), start, end, body_chars, planned);
                planned = self.chunk_overlap.min(chunk.text.chars().count());
                chunks.push(chunk);
                start = end;
                body_chars = 0;
                has_content = false;
            }

            end += piece.len();
            body_chars += piece_chars;
            has_content |= !piece.trim().is_empty();
        }
        if end > start {
            let chunk =
                self.finish_chunk(&normalized, chunks.len(), start, end, body_chars, planned);
            chunks.push(chunk);
        }

        chunks
    }

    /// Prefix the body with as much of the planned overlap as still fits the budget
    fn finish_chunk(
        &self,
        text: &str,
        index: usize,
        body_start: usize,
        body_end: usize,
        body_chars: usize,
        planned: usize,
    ) -> Chunk {
        let overlap = planned.min(self.chunk_size.saturating_sub(body_chars));
        let text_start = if overlap == 0 {
            body_start
        } else {
            text[..body_start]
                .char_indices()
                .nth_back(overlap - 1)
                .map(|(b, _)| b)
                .unwrap_or(0)
        };

        Chunk {
            index,
            text: text[text_start..body_end].to_string(),
            source_id: None,
            overlap,
        }
    }
}

impl Default for CharacterChunker {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE_CHARS,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP_CHARS,
        }
    }
}

/// Validated chunking policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkingStrategy {
    Sentence(SentenceChunker),
    Character(CharacterChunker),
}

impl ChunkingStrategy {
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        match self {
            Self::Sentence(c) => c.chunk(text),
            Self::Character(c) => c.chunk(text),
        }
    }
}

impl Default for ChunkingStrategy {
    fn default() -> Self {
        Self::Sentence(SentenceChunker::default())
    }
}

/// Sentence-based chunking
pub fn chunk_by_sentences(text: &str, sentences_per_chunk: usize) -> Result<Vec<Chunk>> {
    Ok(SentenceChunker::new(sentences_per_chunk)?.chunk(text))
}

/// Character-based chunking
pub fn chunk_by_chars(
    text: &str,
    separator: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>> {
    Ok(CharacterChunker::new(separator, chunk_size, chunk_overlap)?.chunk(text))
}

/// Chunk several documents into one corpus with consecutive indices
pub fn chunk_documents(docs: &[SourceDocument], strategy: &ChunkingStrategy) -> Vec<Chunk> {
    let mut corpus = Vec::new();

    for doc in docs {
        let chunks = strategy.chunk(&doc.text);
        tracing::debug!("Document {} produced {} chunks", doc.id, chunks.len());

        for chunk in chunks {
            corpus.push(Chunk {
                index: corpus.len(),
                source_id: Some(doc.id.clone()),
                ..chunk
            });
        }
    }

    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reconstruct(chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| c.body()).collect()
    }

    #[test]
    fn test_empty_input_produces_no_chunks() {
        assert!(SentenceChunker::default().chunk("   \n\t ").is_empty());
        assert!(CharacterChunker::default().chunk("\r\n\r\n").is_empty());
    }

    #[test]
    fn test_one_sentence_per_chunk() {
        let chunks = chunk_by_sentences(
            "Paris is the capital of France. The Eiffel Tower is in Paris.",
            1,
        )
        .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Paris is the capital of France.");
        assert_eq!(chunks[1].text, "The Eiffel Tower is in Paris.");
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_sentence_groups_last_chunk_shorter() {
        let text = "One. Two. Three. Four. Five.";
        let chunks = chunk_by_sentences(text, 2).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "One. Two.");
        assert_eq!(chunks[2].text, "Five.");
    }

    #[test]
    fn test_hard_wrapped_lines_stay_in_one_sentence() {
        let sentences = split_sentences("The quick brown\nfox jumps. Next one.\n\nHeading\n\nBody text.");
        assert_eq!(
            sentences,
            vec!["The quick brown fox jumps.", "Next one.", "Heading", "Body text."]
        );
    }

    #[test]
    fn test_zero_sentences_per_chunk_rejected() {
        assert!(matches!(
            SentenceChunker::new(0),
            Err(RagError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_overlap_validation() {
        assert!(CharacterChunker::new("\n", 100, 100).is_err());
        assert!(CharacterChunker::new("\n", 100, 150).is_err());
        assert!(CharacterChunker::new("\n", 0, 0).is_err());
        assert!(CharacterChunker::new("", 100, 10).is_err());
        assert!(CharacterChunker::new("\n", 100, 99).is_ok());
    }

    #[test]
    fn test_small_content_single_chunk() {
        let chunks = chunk_by_chars("Small content.", "\n", 100, 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Small content.");
        assert_eq!(chunks[0].overlap, 0);
    }

    #[test]
    fn test_pieces_accumulate_up_to_budget() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = chunk_by_chars(text, "\n", 10, 0).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "aaaa\nbbbb\n");
        assert_eq!(chunks[1].text, "cccc\ndddd");
    }

    #[test]
    fn test_overlap_repeats_trailing_characters() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = chunk_by_chars(text, "\n", 10, 3).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].overlap, 3);
        assert_eq!(chunks[1].text, "bb\ncccc\n");
        assert_eq!(chunks[1].body(), "cccc\n");
        assert_eq!(chunks[2].text, "cc\ndddd");
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_overlap_counts_toward_chunk_size() {
        let text = "aaaa\nbbbb\ncccc\ndddd\neeee";
        let chunks = chunk_by_chars(text, "\n", 10, 3).unwrap();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 10, "{:?}", chunk.text);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_overlap_shrinks_to_fit_large_body() {
        let text = "aaaa\nbbbbbbbb\ncc";
        let chunks = chunk_by_chars(text, "\n", 10, 4).unwrap();
        assert_eq!(chunks[1].body(), "bbbbbbbb\n");
        assert_eq!(chunks[1].overlap, 1);
        assert_eq!(chunks[1].text, "\nbbbbbbbb\n");
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_oversized_piece_becomes_own_chunk() {
        let long = "x".repeat(50);
        let text = format!("short\n{}\ntail", long);
        let chunks = chunk_by_chars(&text, "\n", 10, 0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, format!("{}\n", long));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_handles_unicode() {
        let text = "Hello 世界!\nThis is a test with emoji 🎉\nand special chars ─ here.";
        let chunks = chunk_by_chars(text, "\n", 20, 5).unwrap();
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_chunk_documents_assigns_global_indices() {
        let docs = vec![
            SourceDocument::new("a.txt", "First. Second."),
            SourceDocument::new("b.txt", "Third."),
        ];
        let strategy = ChunkingStrategy::Sentence(SentenceChunker::new(1).unwrap());
        let corpus = chunk_documents(&docs, &strategy);

        assert_eq!(corpus.len(), 3);
        for (i, chunk) in corpus.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
        assert_eq!(corpus[1].source_id.as_deref(), Some("a.txt"));
        assert_eq!(corpus[2].source_id.as_deref(), Some("b.txt"));
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Alpha beta.\nGamma delta.\nEpsilon zeta eta theta.\n";
        let chunker = CharacterChunker::new("\n", 15, 4).unwrap();
        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }

    proptest! {
        #[test]
        fn prop_character_chunks_reconstruct_text(
            text in "[a-z \\n.é]{0,300}",
            size in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % size;
            let chunks = chunk_by_chars(&text, "\n", size, overlap).unwrap();
            prop_assert_eq!(reconstruct(&chunks), normalize(&text));
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert!(!chunk.text.is_empty());
                prop_assert!(chunk.overlap <= overlap);

                // Only a lone oversized piece may exceed the budget, and then without overlap
                let text_chars = chunk.text.chars().count();
                prop_assert!(text_chars <= size || chunk.overlap == 0);
                let pieces = chunk
                    .body()
                    .split_inclusive('\n')
                    .filter(|p| !p.trim().is_empty())
                    .count();
                if pieces > 1 {
                    prop_assert!(text_chars <= size);
                }
            }
        }

        #[test]
        fn prop_sentence_chunks_keep_every_sentence(
            words in proptest::collection::vec("[a-z]{1,8}", 0..40),
            per_chunk in 1usize..6,
        ) {
            let text = words
                .iter()
                .enumerate()
                .map(|(i, w)| if i % 3 == 2 { format!("{}.", w) } else { w.clone() })
                .collect::<Vec<_>>()
                .join(" ");
            let sentences = split_sentences(&text);
            let chunks = chunk_by_sentences(&text, per_chunk).unwrap();

            prop_assert_eq!(chunks.len(), (sentences.len() + per_chunk - 1) / per_chunk);
            let joined: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            prop_assert_eq!(joined.join(" "), sentences.join(" "));
        }
    }
}
