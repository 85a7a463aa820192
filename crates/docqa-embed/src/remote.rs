//! OpenAI-style remote embedding client.
//!
//! Index build can involve hundreds of segments, so inputs are split into
//! `batch_size` requests fanned out under a semaphore and reassembled in
//! the original order before returning. Retry is off by default
//! (`retry.max_attempts = 1`) and only ever applies to transport errors
//! and 429/5xx responses.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use docqa_core::config::{ApiKey, EmbeddingSettings, RetrySettings};
use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::Embedding;

#[derive(Debug, Clone)]
pub struct RemoteEmbedder {
    client: Client,
    settings: EmbeddingSettings,
    retry: RetrySettings,
    api_key: ApiKey,
}

struct RequestFailure {
    error: Error,
    retryable: bool,
}

impl RemoteEmbedder {
    pub fn new(
        settings: EmbeddingSettings,
        retry: RetrySettings,
        api_key: ApiKey,
    ) -> Result<Self> {
        if settings.base_url.trim().is_empty() {
            return Err(Error::EmbeddingService(
                "embedding.base_url must not be empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(retry.timeout_ms.max(1)))
            .build()
            .map_err(|e| Error::EmbeddingService(format!("http client: {e}")))?;
        Ok(Self { client, settings, retry, api_key })
    }

    async fn request_with_retry(&self, inputs: &[String]) -> Result<Vec<Embedding>> {
        with_retry(&self.retry, || self.request_once(inputs)).await
    }

    async fn request_once(
        &self,
        inputs: &[String],
    ) -> std::result::Result<Vec<Embedding>, RequestFailure> {
        #[derive(Serialize)]
        struct EmbeddingRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }
        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingRow>,
        }
        #[derive(Deserialize)]
        struct EmbeddingRow {
            index: usize,
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&EmbeddingRequest { model: &self.settings.model, input: inputs })
            .send()
            .await
            .map_err(|e| RequestFailure {
                error: Error::EmbeddingService(format!("transport: {e}")),
                retryable: true,
            })?;

        let status = response.status();
        if !status.is_success() {
            // Bodies can echo request headers; report the status only.
            return Err(RequestFailure {
                error: Error::EmbeddingService(format!("embedding endpoint returned {status}")),
                retryable: status.as_u16() == 429 || status.is_server_error(),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| RequestFailure {
            error: Error::EmbeddingService(format!("malformed response: {e}")),
            retryable: false,
        })?;

        if parsed.data.len() != inputs.len() {
            return Err(RequestFailure {
                error: Error::EmbeddingService(format!(
                    "expected {} vectors, got {}",
                    inputs.len(),
                    parsed.data.len()
                )),
                retryable: false,
            });
        }

        let mut rows = parsed.data;
        rows.sort_by_key(|r| r.index);
        for row in &rows {
            if row.embedding.len() != self.settings.dim {
                return Err(RequestFailure {
                    error: Error::DimensionMismatch {
                        expected: self.settings.dim,
                        got: row.embedding.len(),
                    },
                    retryable: false,
                });
            }
        }
        Ok(rows.into_iter().map(|r| r.embedding).collect())
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn embedder_id(&self) -> String {
        format!("remote:{}:d{}", self.settings.model, self.settings.dim)
    }

    fn dim(&self) -> usize {
        self.settings.dim
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vectors = self.request_with_retry(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingService("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch_size = self.settings.batch_size.max(1);
        debug!(
            texts = texts.len(),
            batches = texts.len().div_ceil(batch_size),
            "embedding batch fan-out"
        );
        let this = self.clone();
        fan_out_batches(texts, batch_size, self.settings.concurrency, move |inputs| {
            let this = this.clone();
            async move { this.request_with_retry(&inputs).await }
        })
        .await
    }
}

/// Run `call` until it succeeds, a non-retryable failure occurs, or
/// `retry.max_attempts` is exhausted. Backoff doubles between attempts.
async fn with_retry<T, F, Fut>(retry: &RetrySettings, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestFailure>>,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut backoff = Duration::from_millis(retry.backoff_ms);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(failure) => {
                if !failure.retryable || attempt >= max_attempts {
                    return Err(failure.error);
                }
                warn!(attempt, "embedding request failed, backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
    }
}

/// Split `texts` into `batch_size` chunks, run them through `run_batch` with
/// at most `concurrency` in flight, and reassemble the results by batch index
/// so output order matches input order regardless of completion order.
async fn fan_out_batches<F, Fut>(
    texts: &[String],
    batch_size: usize,
    concurrency: usize,
    run_batch: F,
) -> Result<Vec<Embedding>>
where
    F: Fn(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<Embedding>>> + Send + 'static,
{
    let n_batches = texts.len().div_ceil(batch_size);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();
    for (batch_index, chunk) in texts.chunks(batch_size).enumerate() {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::EmbeddingService(format!("semaphore closed: {e}")))?;
        let batch = run_batch(chunk.to_vec());
        join_set.spawn(async move {
            let _permit = permit;
            let vectors = batch.await?;
            Ok::<(usize, Vec<Embedding>), Error>((batch_index, vectors))
        });
    }

    let mut slots: Vec<Option<Vec<Embedding>>> = vec![None; n_batches];
    while let Some(joined) = join_set.join_next().await {
        let (idx, vectors) = joined
            .map_err(|e| Error::EmbeddingService(format!("embedding task aborted: {e}")))??;
        slots[idx] = Some(vectors);
    }

    let mut out = Vec::with_capacity(texts.len());
    for slot in slots {
        let vectors =
            slot.ok_or_else(|| Error::EmbeddingService("missing batch result".to_string()))?;
        out.extend(vectors);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn settings() -> EmbeddingSettings {
        EmbeddingSettings::default()
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let mut s = settings();
        s.base_url = "  ".to_string();
        let err = RemoteEmbedder::new(s, RetrySettings::default(), ApiKey::new("k")).unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }

    #[test]
    fn embedder_id_names_model_and_dim() {
        let embedder =
            RemoteEmbedder::new(settings(), RetrySettings::default(), ApiKey::new("k"))
                .expect("construct");
        assert_eq!(embedder.embedder_id(), "remote:text-embedding-3-small:d1536");
    }

    #[tokio::test]
    async fn empty_input_short_circuits_without_io() {
        let embedder =
            RemoteEmbedder::new(settings(), RetrySettings::default(), ApiKey::new("k"))
                .expect("construct");
        let out = embedder.embed_batch(&[]).await.expect("empty batch");
        assert!(out.is_empty());
    }

    fn retry(max_attempts: u32) -> RetrySettings {
        RetrySettings { max_attempts, backoff_ms: 1, timeout_ms: 1_000 }
    }

    fn server_error() -> RequestFailure {
        RequestFailure {
            error: Error::EmbeddingService("embedding endpoint returned 500".to_string()),
            retryable: true,
        }
    }

    #[tokio::test]
    async fn retry_recovers_from_a_transient_failure() {
        let calls = AtomicU32::new(0);
        let out = with_retry(&retry(2), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(server_error())
                } else {
                    Ok(7usize)
                }
            }
        })
        .await
        .expect("second attempt succeeds");
        assert_eq!(out, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = with_retry::<usize, _, _>(&retry(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "max_attempts = 1 means a single try");

        let calls = AtomicU32::new(0);
        let _ = with_retry::<usize, _, _>(&retry(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry::<usize, _, _>(&retry(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RequestFailure {
                    error: Error::DimensionMismatch { expected: 4, got: 3 },
                    retryable: false,
                })
            }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fan_out_reassembles_batches_in_input_order() {
        let texts: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        // Later batches sleep less, so completion order inverts batch order.
        let out = fan_out_batches(&texts, 3, 4, |inputs| async move {
            let first: u64 = inputs[0].parse().map_err(|_| Error::EmptyDocument)?;
            tokio::time::sleep(Duration::from_millis(50 - first * 5)).await;
            inputs
                .iter()
                .map(|t| {
                    t.parse::<f32>()
                        .map(|v| vec![v])
                        .map_err(|_| Error::EmptyDocument)
                })
                .collect()
        })
        .await
        .expect("fan-out");
        assert_eq!(out.len(), texts.len());
        for (i, vector) in out.iter().enumerate() {
            assert_eq!(vector[0] as usize, i, "vector {i} out of place");
        }
    }
}
