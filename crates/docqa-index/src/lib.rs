//! In-memory vector index: cosine similarity over a full linear scan.
//!
//! A single uploaded document produces tens to low thousands of segments,
//! so exact scan beats any approximate structure here. The index is
//! immutable after [`VectorIndex::build`]; concurrent searches need no
//! locking.

mod persist;
mod topk;

pub use persist::INDEX_SCHEMA_VERSION;

use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::error::{Error, Result};
use docqa_core::types::{Embedding, RetrievalResult, ScoredSegment, Segment};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct IndexEntry {
    pub segment: Segment,
    pub vector: Embedding,
}

#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    /// Precomputed L2 norms, parallel to `entries`.
    norms: Vec<f32>,
    dim: usize,
    embedder_id: String,
}

impl VectorIndex {
    /// Build an index from segment/vector pairs. All vectors must share a
    /// dimensionality; `embedder_id` tags which model produced them so a
    /// later load can detect incompatible vectors.
    pub fn build(
        pairs: Vec<(Segment, Embedding)>,
        embedder_id: impl Into<String>,
    ) -> Result<Self> {
        let dim = pairs.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut entries = Vec::with_capacity(pairs.len());
        let mut norms = Vec::with_capacity(pairs.len());
        for (segment, vector) in pairs {
            if vector.len() != dim {
                return Err(Error::DimensionMismatch { expected: dim, got: vector.len() });
            }
            norms.push(vector.iter().map(|x| x * x).sum::<f32>().sqrt());
            entries.push(IndexEntry { segment, vector });
        }
        debug!(entries = entries.len(), dim, "vector index built");
        Ok(Self { entries, norms, dim, embedder_id: embedder_id.into() })
    }

    /// Top-k nearest entries by cosine similarity.
    ///
    /// Results come back in descending score order; equal scores break by
    /// ascending segment id, so a rebuilt index answers identically.
    /// `k` larger than the entry count returns everything.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if self.entries.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if k == 0 {
            return Err(Error::InvalidK(k));
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: query.len() });
        }

        let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mut selector = topk::TopK::new(k);
        for (pos, entry) in self.entries.iter().enumerate() {
            let score = cosine(query, query_norm, &entry.vector, self.norms[pos]);
            selector.push(score, entry.segment.id, pos);
        }

        Ok(selector
            .into_sorted()
            .into_iter()
            .map(|hit| ScoredSegment {
                segment: self.entries[hit.pos].segment.clone(),
                score: hit.score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }
}

/// Cosine similarity with precomputed norms. Zero-magnitude vectors have no
/// direction and score 0.
fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm <= f32::EPSILON || b_norm <= f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_is_magnitude_invariant() {
        let a = [1.0f32, 0.0];
        let big_a = [10.0f32, 0.0];
        let b = [1.0f32, 1.0];
        let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
        let s1 = cosine(&a, norm(&a), &b, norm(&b));
        let s2 = cosine(&big_a, norm(&big_a), &b, norm(&b));
        assert!((s1 - s2).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let zero = [0.0f32, 0.0];
        let b = [1.0f32, 1.0];
        assert_eq!(cosine(&zero, 0.0, &b, std::f32::consts::SQRT_2), 0.0);
    }
}
