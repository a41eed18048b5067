// crates/core/src/llm/openai.rs
//! OpenAI-compatible chat-completions provider over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use proofread_types::ProofreadingConfig;

use super::provider::{ByteStream, LlmProvider};
use super::sse::ContentPath;
use super::types::{ChatCompletionRequest, LlmError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// LLM provider for any endpoint speaking the OpenAI streaming protocol
/// (OpenAI, DeepSeek, Moonshot, local gateways...).
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    content_path: ContentPath,
    /// Limit on waiting for the response headers. The body itself may
    /// stream for as long as the model keeps writing.
    timeout_secs: u64,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::NotConfigured(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            content_path: ContentPath::default(),
            timeout_secs: proofread_types::DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn from_config(config: &ProofreadingConfig) -> Result<Self, LlmError> {
        Ok(Self::new(&config.api_url, &config.api_key, &config.model)?.with_timeout(config.timeout_secs))
    }

    /// Set the timeout in seconds for receiving response headers.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_content_path(mut self, path: ContentPath) -> Self {
        self.content_path = path;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn open_stream(&self, request: &ChatCompletionRequest) -> Result<ByteStream, LlmError> {
        let t0 = std::time::Instant::now();
        tracing::info!(
            endpoint = %self.api_url,
            model = %request.model,
            input_chars = request.messages.last().map_or(0, |m| m.content.chars().count()),
            "chat completion: sending request"
        );

        let send = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send();

        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), send)
            .await
            .map_err(|_| {
                tracing::error!(elapsed_ms = t0.elapsed().as_millis() as u64, "chat completion: timed out");
                LlmError::Timeout(self.timeout_secs)
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion: request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = body.chars().take(500).collect::<String>();
            tracing::error!(
                status = status.as_u16(),
                body = %message,
                "chat completion: non-success status"
            );
            return Err(LlmError::Transport {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "chat completion: response headers received"
        );

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed())
    }

    fn content_path(&self) -> ContentPath {
        self.content_path.clone()
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
