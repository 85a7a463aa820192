//! OpenAI-style chat-completions client used as the generation capability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use docqa_core::config::{ApiKey, GenerationSettings, RetrySettings};
use docqa_core::error::{Error, Result};
use docqa_core::traits::Generator;

#[derive(Debug)]
pub struct RemoteGenerator {
    client: Client,
    settings: GenerationSettings,
    api_key: ApiKey,
}

impl RemoteGenerator {
    pub fn new(
        settings: GenerationSettings,
        retry: RetrySettings,
        api_key: ApiKey,
    ) -> Result<Self> {
        if settings.base_url.trim().is_empty() {
            return Err(Error::GenerationService(
                "generation.base_url must not be empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(retry.timeout_ms.max(1)))
            .build()
            .map_err(|e| Error::GenerationService(format!("http client: {e}")))?;
        Ok(Self { client, settings, api_key })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl Generator for RemoteGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::GenerationService(format!("transport: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Bodies can echo request headers; report the status only.
            return Err(Error::GenerationService(format!(
                "generation endpoint returned {status}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::GenerationService(format!("malformed response: {e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::GenerationService("response held no choices".to_string()))?;
        Ok(choice.message.content)
    }
}
