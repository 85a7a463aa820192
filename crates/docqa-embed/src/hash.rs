use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use twox_hash::XxHash64;

use docqa_core::error::Result;
use docqa_core::traits::Embedder;
use docqa_core::types::Embedding;

/// Deterministic feature-hashing embedder.
///
/// Each whitespace token is hashed into one of `dim` buckets and the vector
/// is L2-normalized, so identical text always embeds identically and texts
/// sharing vocabulary land near each other. Good enough to exercise the
/// whole pipeline without a network.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let lowered = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if lowered.is_empty() {
                continue;
            }
            let mut hasher = XxHash64::with_seed(0);
            lowered.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> String {
        format!("fake:d{}", self.dim)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.embed_one(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_embeds_identically() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("The capital of France is Paris.").await.expect("embed");
        let b = embedder.embed("The capital of France is Paris.").await.expect("embed");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let embedder = HashEmbedder::new(64);
        let v = embedder.embed("some words here").await.expect("embed");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher_than_disjoint() {
        let embedder = HashEmbedder::new(256);
        let doc = embedder.embed("the capital of france is paris").await.expect("embed");
        let close = embedder.embed("what is the capital of france").await.expect("embed");
        let far = embedder.embed("quarterly revenue grew nine percent").await.expect("embed");
        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&doc, &close) > dot(&doc, &far));
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let embedder = HashEmbedder::new(32);
        let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let batch = embedder.embed_batch(&texts).await.expect("batch");
        assert_eq!(batch.len(), 3);
        for (text, vec) in texts.iter().zip(&batch) {
            assert_eq!(vec, &embedder.embed(text).await.expect("embed"));
        }
    }
}
