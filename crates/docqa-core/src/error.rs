use thiserror::Error;

/// Failure taxonomy for the whole pipeline.
///
/// Service variants (`EmbeddingService`, `GenerationService`) carry a
/// sanitized description of the remote failure; credentials must never be
/// interpolated into these messages.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("document contains no extractable text")]
    EmptyDocument,

    #[error("embedding service failure: {0}")]
    EmbeddingService(String),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("vector index holds no entries")]
    EmptyIndex,

    #[error("invalid k for search: {0}")]
    InvalidK(usize),

    #[error("no grounding context was retrieved")]
    NoContext,

    #[error("generation service failure: {0}")]
    GenerationService(String),

    #[error("index schema mismatch: expected {expected}, found {found}")]
    IndexVersionMismatch { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, Error>;
