//! Optional on-disk form of the index.
//!
//! The envelope records the schema version, embedding dimensionality and
//! the embedder that produced the vectors, so loading with a different
//! embedder version fails loudly instead of silently returning wrong
//! neighbours. This file is a session convenience, not a durability
//! contract.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use docqa_core::error::Error;

use crate::{IndexEntry, VectorIndex};

pub const INDEX_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    schema_version: u32,
    embedder_id: String,
    dim: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let envelope = Envelope {
            schema_version: INDEX_SCHEMA_VERSION,
            embedder_id: self.embedder_id.clone(),
            dim: self.dim,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string(&envelope)?;
        fs::write(path, json)?;
        info!(path = %path.display(), entries = self.entries.len(), "index saved");
        Ok(())
    }

    /// Load a previously saved index. When `expected_embedder_id` is given,
    /// a stored index produced by a different embedder is rejected.
    pub fn load(path: &Path, expected_embedder_id: Option<&str>) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)?;
        let envelope: Envelope = serde_json::from_str(&json)?;

        if envelope.schema_version != INDEX_SCHEMA_VERSION {
            return Err(Error::IndexVersionMismatch {
                expected: format!("schema v{INDEX_SCHEMA_VERSION}"),
                found: format!("schema v{}", envelope.schema_version),
            }
            .into());
        }
        if let Some(expected) = expected_embedder_id {
            if envelope.embedder_id != expected {
                return Err(Error::IndexVersionMismatch {
                    expected: expected.to_string(),
                    found: envelope.embedder_id,
                }
                .into());
            }
        }

        let stored_dim = envelope.dim;
        let embedder_id = envelope.embedder_id.clone();
        let pairs = envelope
            .entries
            .into_iter()
            .map(|e| (e.segment, e.vector))
            .collect();
        let index = Self::build(pairs, embedder_id)?;
        if !index.is_empty() && index.dim() != stored_dim {
            return Err(Error::IndexVersionMismatch {
                expected: format!("dim {stored_dim}"),
                found: format!("dim {}", index.dim()),
            }
            .into());
        }
        info!(path = %path.display(), entries = index.len(), "index loaded");
        Ok(index)
    }
}
