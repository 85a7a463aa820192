//! Embedding providers.
//!
//! [`RemoteEmbedder`] talks to an OpenAI-style `/embeddings` endpoint;
//! [`HashEmbedder`] is a deterministic feature-hashing stand-in for tests
//! and offline development, switched on via `embedding.use_fake` (or
//! `APP_EMBEDDING__USE_FAKE=true`).

mod hash;
mod remote;

pub use hash::HashEmbedder;
pub use remote::RemoteEmbedder;

use std::sync::Arc;

use docqa_core::config::Settings;
use docqa_core::traits::Embedder;
use tracing::info;

/// Build the embedder the settings ask for. The remote client requires an
/// API key; the fake one never touches the network.
pub fn embedder_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn Embedder>> {
    if settings.embedding.use_fake {
        info!(dim = settings.embedding.fake_dim, "using deterministic hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.embedding.fake_dim)));
    }
    let api_key = settings
        .credentials
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("credentials.api_key is required unless embedding.use_fake is set"))?;
    let remote = RemoteEmbedder::new(
        settings.embedding.clone(),
        settings.retry.clone(),
        api_key,
    )?;
    Ok(Arc::new(remote))
}
