//! Resume text handling: PDF extraction at the boundary, and the size bound
//! applied before resume text enters a prompt.

pub mod handlers;

use bytes::Bytes;
use thiserror::Error;

/// Default bound on resume characters sent to the model. Enough for a dense
/// multi-page resume; beyond this it is cut, not rejected.
pub const DEFAULT_RESUME_MAX_CHARS: usize = 20_000;

#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("document contains no extractable text")]
    Empty,

    #[error("PDF could not be read: {0}")]
    Pdf(String),

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Resume text ready to embed in the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedResume {
    pub text: String,
    pub truncated: bool,
}

/// Trims the text and cuts it to `max_chars` characters. Returns `None` for
/// blank input. Deterministic: the same input always yields the same prefix.
pub fn prepare_resume(raw: &str, max_chars: usize) -> Option<PreparedResume> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => Some(PreparedResume {
            text: trimmed[..cut].trim_end().to_string(),
            truncated: true,
        }),
        None => Some(PreparedResume {
            text: trimmed.to_string(),
            truncated: false,
        }),
    }
}

/// Extracts plain text from a PDF. Parsing is CPU-bound, so it runs on the
/// blocking pool.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, ExtractionFailure> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractionFailure::Task(e.to_string()))?
        .map_err(|e| ExtractionFailure::Pdf(e.to_string()))?;

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractionFailure::Empty);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_resume_is_omitted() {
        assert_eq!(prepare_resume("", 100), None);
        assert_eq!(prepare_resume("  \n\t ", 100), None);
    }

    #[test]
    fn test_short_resume_is_trimmed_not_truncated() {
        let prepared = prepare_resume("  Jane Doe\nRust engineer  ", 100).unwrap();
        assert_eq!(prepared.text, "Jane Doe\nRust engineer");
        assert!(!prepared.truncated);
    }

    #[test]
    fn test_exact_length_is_not_truncated() {
        let prepared = prepare_resume("abcde", 5).unwrap();
        assert_eq!(prepared.text, "abcde");
        assert!(!prepared.truncated);
    }

    #[test]
    fn test_long_resume_is_cut_on_char_boundary() {
        let prepared = prepare_resume("héllo wörld", 4).unwrap();
        assert_eq!(prepared.text, "héll");
        assert!(prepared.truncated);
    }

    #[test]
    fn test_truncation_is_deterministic() {
        let text = "word ".repeat(10_000);
        assert_eq!(
            prepare_resume(&text, DEFAULT_RESUME_MAX_CHARS),
            prepare_resume(&text, DEFAULT_RESUME_MAX_CHARS)
        );
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_extraction_failure() {
        let result = extract_pdf_text(Bytes::from_static(b"definitely not a pdf")).await;
        assert!(result.is_err());
    }
}
