//! Content extraction
//!
//! Turns uploads and web pages into plain text. Stateless: the same input
//! always yields the same text.

pub mod document;
pub mod web;

pub use document::{extract_document, read_upload, DocumentKind};
pub use web::{fetch_all, fetch_url_text, html_to_text, UrlText};

use sha2::{Digest, Sha256};

/// Hex SHA-256 of an upload, used to skip re-extracting identical files
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Document text first, then each URL's text, separated by blank lines
pub fn combine_content(document: Option<&str>, urls: &[UrlText]) -> String {
    let mut combined = String::new();

    if let Some(doc) = document.filter(|d| !d.is_empty()) {
        combined.push_str(doc);
        combined.push_str("\n\n");
    }

    let url_text = urls
        .iter()
        .map(|u| u.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    combined.push_str(&url_text);

    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_text(text: &str) -> UrlText {
        UrlText {
            url: "https://example.com".to_string(),
            text: text.to_string(),
            error: None,
        }
    }

    #[test]
    fn test_combine_document_and_urls() {
        let combined = combine_content(Some("doc"), &[url_text("one"), url_text("two")]);
        assert_eq!(combined, "doc\n\none\n\ntwo");
    }

    #[test]
    fn test_combine_document_only() {
        assert_eq!(combine_content(Some("doc"), &[]), "doc\n\n");
    }

    #[test]
    fn test_combine_nothing_is_empty() {
        assert!(combine_content(None, &[]).is_empty());
        assert!(combine_content(Some(""), &[]).is_empty());
    }

    #[test]
    fn test_failed_url_only_leaves_blank_content() {
        let combined = combine_content(None, &[url_text("")]);
        assert!(combined.trim().is_empty());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
        assert_eq!(fingerprint(b"").len(), 64);
    }
}
