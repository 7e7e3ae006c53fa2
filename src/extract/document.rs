//! Uploaded document parsing (plain text and PDF)

use crate::error::ChatError;
use crate::Result;
use lopdf::Document as PdfDocument;
use std::path::Path;
use tracing::{debug, warn};

/// Upload types the extractor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from a file name's extension (case-insensitive)
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(DocumentKind::PlainText),
            "pdf" => Ok(DocumentKind::Pdf),
            _ => Err(ChatError::UnsupportedFileType(file_name.to_string())),
        }
    }
}

/// Extract text from an uploaded blob of the given kind
pub fn extract_document(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    match kind {
        DocumentKind::PlainText => decode_text(bytes),
        DocumentKind::Pdf => extract_pdf(bytes),
    }
}

fn decode_text(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ChatError::ExtractionError(format!("text upload is not valid UTF-8: {}", e)))
}

/// Read an upload from disk, returning its file name and bytes
pub async fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((file_name, bytes))
}

/// Pages are concatenated in page order; a page that fails to extract
/// contributes nothing instead of aborting the whole document.
fn extract_pdf(bytes: &[u8]) -> Result<String> {
    let doc = PdfDocument::load_mem(bytes)
        .map_err(|e| ChatError::ExtractionError(format!("failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    let mut content = String::new();

    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => content.push_str(&text),
            Err(e) => warn!("Failed to extract text from page {}: {}", page_num, e),
        }
    }

    debug!(pages = pages.len(), chars = content.len(), "Extracted PDF text");
    Ok(content)
}
