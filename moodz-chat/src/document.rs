//! Document loader: PDF and plain text only.

use std::path::Path;

use lopdf::Document;
use tracing::debug;

use crate::error::{ChatError, Result};

/// Media type for PDF uploads.
pub const PDF: &str = "application/pdf";
/// Media type for plain-text uploads.
pub const PLAIN_TEXT: &str = "text/plain";

/// Turn uploaded bytes into text.
///
/// PDF pages are extracted in page order and joined with newlines. Plain
/// text must be valid UTF-8.
///
/// # Errors
/// [`ChatError::UnsupportedMediaType`] for anything outside the allow-list,
/// [`ChatError::Document`] when the bytes cannot be decoded.
pub fn load(bytes: &[u8], media_type: &str) -> Result<String> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let text = match essence.as_str() {
        PDF => pdf_text(bytes)?,
        PLAIN_TEXT => String::from_utf8(bytes.to_vec())
            .map_err(|e| ChatError::Document(format!("text is not valid UTF-8: {e}")))?,
        _ => return Err(ChatError::UnsupportedMediaType(media_type.to_string())),
    };

    debug!(
        media_type = %essence,
        bytes = bytes.len(),
        chars = text.chars().count(),
        "Document loaded"
    );
    Ok(text)
}

fn pdf_text(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ChatError::Document(format!("failed to load PDF: {e}")))?;

    // get_pages is keyed by page number, so iteration is already in order.
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut texts = Vec::with_capacity(pages.len());
    for page in pages {
        let text = doc
            .extract_text(&[page])
            .map_err(|e| ChatError::Document(format!("page {page}: {e}")))?;
        texts.push(text);
    }
    Ok(texts.join("\n"))
}

/// Guess the media type from a file extension (`.pdf`, `.txt`).
#[must_use]
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF),
        "txt" | "text" => Some(PLAIN_TEXT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let text = load("Holmes: Elementary.".as_bytes(), "text/plain; charset=utf-8")
            .expect("plain text");
        assert_eq!(text, "Holmes: Elementary.");
    }

    #[test]
    fn other_media_types_are_rejected() {
        let err = load(b"<html></html>", "text/html").expect_err("html");
        assert!(matches!(err, ChatError::UnsupportedMediaType(t) if t == "text/html"));
    }

    #[test]
    fn invalid_utf8_is_a_document_error() {
        let err = load(&[0xff, 0xfe, 0x00], PLAIN_TEXT).expect_err("bad utf-8");
        assert!(matches!(err, ChatError::Document(_)));
    }

    #[test]
    fn garbage_pdf_is_a_document_error() {
        let err = load(b"definitely not a pdf", PDF).expect_err("bad pdf");
        assert!(matches!(err, ChatError::Document(_)));
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(media_type_for_path(Path::new("study.PDF")), Some(PDF));
        assert_eq!(media_type_for_path(Path::new("notes.txt")), Some(PLAIN_TEXT));
        assert_eq!(media_type_for_path(Path::new("novel.epub")), None);
        assert_eq!(media_type_for_path(Path::new("README")), None);
    }
}
