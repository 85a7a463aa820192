//! Pipeline driver: composes loader, embedder, index and synthesizer into
//! one document-QA session.

mod retriever;
mod session;

pub use retriever::Retriever;
pub use session::{IndexStats, QaSession};
