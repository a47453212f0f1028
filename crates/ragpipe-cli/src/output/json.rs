//! JSON output formatter

use ragpipe_core::{Chunk, Report, RetrievalResult, SnapshotInfo};
use std::path::Path;

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()) + "\n"
}

pub fn format_chunks(chunks: &[Chunk]) -> String {
    let output: Vec<serde_json::Value> = chunks
        .iter()
        .map(|c| {
            serde_json::json!({
                "index": c.index,
                "source": c.source_id,
                "overlap": c.overlap,
                "chars": c.text.chars().count(),
                "text": c.text,
            })
        })
        .collect();
    pretty(&serde_json::Value::Array(output))
}

pub fn format_retrieval(query: &str, result: &RetrievalResult) -> String {
    let hits: Vec<serde_json::Value> = result
        .hits
        .iter()
        .map(|h| {
            serde_json::json!({
                "index": h.chunk.index,
                "distance": h.score,
                "source": h.chunk.source_id,
                "text": h.chunk.text,
            })
        })
        .collect();
    pretty(&serde_json::json!({ "query": query, "hits": hits }))
}

pub fn format_report(report: &Report) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_snapshot(info: &SnapshotInfo, path: &Path) -> String {
    pretty(&serde_json::json!({
        "snapshot": path.display().to_string(),
        "chunks": info.chunk_count,
        "dimensions": info.dimensions,
        "metric": info.metric.as_str(),
        "model": info.model,
        "fingerprint": info.fingerprint,
        "created_at": info.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_are_valid_json() {
        let mut chunk = Chunk::new(0, "héllo");
        chunk.source_id = Some("a.txt".to_string());
        let parsed: serde_json::Value = serde_json::from_str(&format_chunks(&[chunk])).unwrap();
        assert_eq!(parsed[0]["chars"], 5);
        assert_eq!(parsed[0]["source"], "a.txt");
    }
}
