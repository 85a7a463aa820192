//! Domain types shared across the loader, index and answer crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

pub type SegmentId = usize;
pub type Meta = HashMap<String, String>;

/// Fixed-length vector representation of a piece of text.
///
/// All embeddings inside one index share a dimensionality. Values are only
/// comparable between vectors produced by the same model version; the
/// embedder identifier recorded alongside a persisted index exists to catch
/// mixes across versions.
pub type Embedding = Vec<f32>;

/// A bounded chunk of the source document, the unit of retrieval.
///
/// - `id`: dense, ascending in document order (used for deterministic
///   tie-breaks when similarity scores are equal)
/// - `span`: byte range of this chunk within the extracted document text
/// - `meta`: free-form string metadata (format, chunk position)
///
/// Segments are immutable once created and live as long as the index that
/// owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub text: String,
    pub span: Range<usize>,
    pub meta: Meta,
}

/// A segment paired with its similarity score against a query.
/// Higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub score: f32,
}

/// Ordered retrieval output: at most k hits, non-increasing score,
/// score ties broken by ascending segment id.
pub type RetrievalResult = Vec<ScoredSegment>;

/// The synthesizer's output. `grounded` is false when no retrieval context
/// backed the answer; callers should surface that instead of presenting the
/// text as document-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub grounded: bool,
}
