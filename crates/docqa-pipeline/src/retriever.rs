use std::sync::Arc;

use docqa_core::error::Result;
use docqa_core::traits::Embedder;
use docqa_core::types::RetrievalResult;
use docqa_index::VectorIndex;

/// Thin wrapper: embed the question, search the index.
///
/// No query-embedding cache; each question is independent and the index is
/// small enough that the embedding call dominates anyway.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub async fn retrieve(&self, query_text: &str, k: usize) -> Result<RetrievalResult> {
        let query_vector = self.embedder.embed(query_text).await?;
        self.index.search(&query_vector, k)
    }
}
