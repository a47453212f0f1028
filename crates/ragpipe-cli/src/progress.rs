//! Progress reporting for long-running commands

use ragpipe_core::index::EmbedProgress;
use std::io::{self, Write};

/// Callback printing embedding progress on one stderr line
pub fn embed_progress() -> Box<dyn Fn(EmbedProgress) + Send + Sync> {
    Box::new(|progress: EmbedProgress| {
        let pct = if progress.total_chunks > 0 {
            progress.embedded_chunks as f64 / progress.total_chunks as f64 * 100.0
        } else {
            100.0
        };
        eprint!(
            "\rEmbedding: {}/{} chunks, {} batch(es) ({:.0}%)   ",
            progress.embedded_chunks, progress.total_chunks, progress.batches_done, pct
        );
        io::stderr().flush().ok();
    })
}

/// End the progress line
pub fn finish() {
    eprintln!();
}
