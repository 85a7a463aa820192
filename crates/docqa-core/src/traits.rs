use async_trait::async_trait;

use crate::error::Result;
use crate::types::Embedding;

/// External embedding capability.
///
/// `embed_batch` preserves order 1:1 with its input. Output is
/// deterministic for identical input and model version only; a model
/// upgrade invalidates any persisted vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backing model (e.g. `fake:d256`).
    fn embedder_id(&self) -> String;
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Embedding>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}

/// External text-generation capability: one prompt in, one completion out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
