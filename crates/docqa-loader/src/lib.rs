//! Document loading: raw uploaded bytes in, normalized [`Segment`]s out.
//!
//! Extraction is format-specific (`docx` is a zip of WordprocessingML;
//! plain text and markdown decode directly); segmentation is shared and
//! lives in [`chunker`].

pub mod chunker;
mod docx;

use docqa_core::config::ChunkingSettings;
use docqa_core::error::{Error, Result};
use docqa_core::types::Segment;
use tracing::debug;

use chunker::Chunker;

/// Formats the loader knows how to extract. Anything else is rejected up
/// front rather than silently misparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::PlainText),
            "md" | "markdown" => Ok(Self::Markdown),
            "docx" => Ok(Self::Docx),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Markdown => "md",
            Self::Docx => "docx",
        }
    }
}

pub struct Loader {
    chunker: Chunker,
}

impl Loader {
    pub fn new(chunking: ChunkingSettings) -> Self {
        Self { chunker: Chunker::new(chunking) }
    }

    /// Extract text from `bytes` according to the declared format and split
    /// it into overlapping segments.
    ///
    /// Fails with `UnsupportedFormat` when the bytes do not parse as the
    /// declared format, and `EmptyDocument` when extraction yields no
    /// non-whitespace characters.
    pub fn load(&self, bytes: &[u8], format: DocumentFormat) -> Result<Vec<Segment>> {
        let text = match format {
            // Markdown chunks fine as plain text; paragraph breaks survive.
            DocumentFormat::PlainText | DocumentFormat::Markdown => {
                normalize_newlines(&String::from_utf8_lossy(bytes))
            }
            DocumentFormat::Docx => docx::extract(bytes)?,
        };

        if text.chars().all(char::is_whitespace) {
            return Err(Error::EmptyDocument);
        }

        let mut segments = self.chunker.split(&text);
        let total = segments.len();
        for segment in &mut segments {
            segment.meta.insert("format".to_string(), format.label().to_string());
            segment.meta.insert("total_chunks".to_string(), total.to_string());
        }
        debug!(segments = total, format = format.label(), "document loaded");
        Ok(segments)
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> Loader {
        Loader::new(ChunkingSettings::default())
    }

    #[test]
    fn plain_text_yields_at_least_one_segment() {
        let segments = loader()
            .load(b"The capital of France is Paris.", DocumentFormat::PlainText)
            .expect("load");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "The capital of France is Paris.");
        assert_eq!(segments[0].id, 0);
        assert_eq!(segments[0].meta.get("format").map(String::as_str), Some("txt"));
    }

    #[test]
    fn whitespace_only_document_is_rejected() {
        let err = loader().load(b"  \n\t \n", DocumentFormat::PlainText).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = loader().load(b"", DocumentFormat::Markdown).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = DocumentFormat::from_extension("pdf").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(f) if f == "pdf"));
    }

    #[test]
    fn crlf_is_normalized() {
        let segments = loader()
            .load(b"first paragraph\r\n\r\nsecond paragraph", DocumentFormat::PlainText)
            .expect("load");
        assert!(segments[0].text.contains("first paragraph\n\nsecond paragraph"));
    }

    #[test]
    fn docx_bytes_that_are_not_a_zip_are_unsupported() {
        let err = loader().load(b"definitely not a zip", DocumentFormat::Docx).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
