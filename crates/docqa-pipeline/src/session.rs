use std::sync::{Arc, RwLock};

use tracing::info;

use docqa_answer::{PromptBuilder, Synthesizer};
use docqa_core::config::Settings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, Generator};
use docqa_core::types::{Answer, RetrievalResult};
use docqa_index::VectorIndex;
use docqa_loader::{DocumentFormat, Loader};

use crate::retriever::Retriever;

#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub segments: usize,
    pub dim: usize,
}

/// One document-QA session.
///
/// `index_document` is the one-time, potentially long build; questions are
/// independent round trips against the immutable active index, so they may
/// run concurrently. Replacing the document builds a fresh index and swaps
/// the active reference; the old index is never mutated in place, and a
/// failed build leaves the previous index active.
pub struct QaSession {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    settings: Settings,
    index: RwLock<Option<Arc<VectorIndex>>>,
}

impl QaSession {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        settings: Settings,
    ) -> Self {
        Self { embedder, generator, settings, index: RwLock::new(None) }
    }

    /// Load, segment, embed and index a document, then make the new index
    /// active. Errors here are fatal to the build, not to the session.
    pub async fn index_document(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
    ) -> Result<IndexStats> {
        let loader = Loader::new(self.settings.chunking.clone());
        let segments = loader.load(bytes, format)?;

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != segments.len() {
            return Err(Error::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                segments.len(),
                embeddings.len()
            )));
        }

        let pairs = segments.into_iter().zip(embeddings).collect();
        let index = VectorIndex::build(pairs, self.embedder.embedder_id())?;
        let stats = IndexStats { segments: index.len(), dim: index.dim() };
        info!(segments = stats.segments, dim = stats.dim, "index activated");
        self.attach_index(Arc::new(index));
        Ok(stats)
    }

    /// Make a prebuilt (e.g. loaded-from-disk) index the active one.
    pub fn attach_index(&self, index: Arc<VectorIndex>) {
        let mut guard = self.index.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(index);
    }

    /// One question/answer round trip. Embedding or generation failures
    /// surface as an error for this question only; the session and its
    /// index stay usable.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let context = self.retrieve(question, self.settings.retrieval.top_k).await?;
        let synthesizer = Synthesizer::new(
            self.generator.clone(),
            PromptBuilder::new(self.settings.retrieval.context_budget_chars),
        );
        synthesizer.synthesize(question, &context).await
    }

    pub async fn retrieve(&self, question: &str, k: usize) -> Result<RetrievalResult> {
        let index = self.active_index()?;
        Retriever::new(self.embedder.clone(), index).retrieve(question, k).await
    }

    pub fn stats(&self) -> Option<IndexStats> {
        let guard = self.index.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|index| IndexStats { segments: index.len(), dim: index.dim() })
    }

    fn active_index(&self) -> Result<Arc<VectorIndex>> {
        // Clone the Arc and release the lock before any await.
        let guard = self.index.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().cloned().ok_or(Error::EmptyIndex)
    }
}
