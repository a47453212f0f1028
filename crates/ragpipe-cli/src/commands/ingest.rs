//! Reading input files as plain text

use anyhow::{bail, Context, Result};
use ragpipe_core::SourceDocument;
use std::path::Path;

/// Read each file as one document, extracting text from PDFs
pub fn read_documents(paths: &[impl AsRef<Path>]) -> Result<Vec<SourceDocument>> {
    paths.iter().map(|p| read_document(p.as_ref())).collect()
}

fn read_document(path: &Path) -> Result<SourceDocument> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let text = if is_pdf {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .with_context(|| format!("Failed to extract text from PDF {:?}", path))?;
        if text.trim().is_empty() {
            bail!(
                "PDF file {:?} contains no extractable text (may be image-based)",
                path
            );
        }
        text
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?
    };

    tracing::debug!("Read {:?} ({} bytes)", path, text.len());
    Ok(SourceDocument::new(path.display().to_string(), text))
}
