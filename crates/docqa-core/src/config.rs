//! Configuration loading and typed settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars, then extracts a fully-defaulted [`Settings`] tree. Credentials are
//! explicit configuration passed into the remote clients at construction;
//! nothing reads ambient global state after load.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Extract the full typed settings tree. Every section defaults, so an
    /// absent config file yields a usable (fake-embedder-friendly) setup.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
    }
}

/// API credential wrapper. Debug/Display never reveal the value; callers
/// reach the secret through [`ApiKey::expose`] at the request boundary only.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target segment length in characters.
    pub max_chars: usize,
    /// Characters of context shared between adjacent segments.
    pub overlap_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_chars: 1000, overlap_chars: 100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    /// Expected vector dimensionality; responses are validated against it.
    pub dim: usize,
    /// Segments per embedding request.
    pub batch_size: usize,
    /// In-flight embedding requests during index build.
    pub concurrency: usize,
    /// Use the deterministic hash embedder instead of the remote service.
    pub use_fake: bool,
    /// Dimensionality of the fake embedder.
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dim: 1536,
            batch_size: 32,
            concurrency: 4,
            use_fake: false,
            fake_dim: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    /// 0.0 keeps grounded answers reproducible.
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts including the first. 1 means no retry.
    pub max_attempts: u32,
    /// Initial backoff; doubles per subsequent attempt.
    pub backoff_ms: u64,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: 1, backoff_ms: 250, timeout_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Total characters of retrieved context allowed into one prompt.
    pub context_budget_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, context_budget_chars: 6000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Where `ingest` persists the index and `ask` loads it from.
    pub index_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { index_path: "./docqa_index.json".to_string() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub api_key: Option<ApiKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub retry: RetrySettings,
    pub retrieval: RetrievalSettings,
    pub data: DataSettings,
    pub credentials: CredentialSettings,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Expand `p`, then anchor it at `base` unless it is already absolute.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_without_config_files() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.max_chars, 1000);
        assert_eq!(settings.chunking.overlap_chars, 100);
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.retry.max_attempts, 1, "non-retriable by default");
        assert_eq!(settings.generation.temperature, 0.0);
        assert!(settings.credentials.api_key.is_none());
    }

    #[test]
    fn resolve_with_base_joins_relative_paths() {
        let base = Path::new("/srv/docqa");
        assert_eq!(
            resolve_with_base(base, "indexes/doc.json"),
            PathBuf::from("/srv/docqa/indexes/doc.json")
        );
    }

    #[test]
    fn resolve_with_base_keeps_absolute_paths() {
        let base = Path::new("/srv/docqa");
        assert_eq!(
            resolve_with_base(base, "/var/lib/doc.json"),
            PathBuf::from("/var/lib/doc.json")
        );
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-super-secret");
        let shown = format!("{:?}", key);
        assert!(!shown.contains("secret"));
        assert_eq!(key.expose(), "sk-super-secret");
    }
}
