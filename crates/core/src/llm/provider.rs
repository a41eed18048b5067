// crates/core/src/llm/provider.rs
//! LlmProvider trait defining the interface for streaming chat endpoints.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use super::sse::ContentPath;
use super::types::{ChatCompletionRequest, LlmError};

/// Raw response body, chunked as it arrives from the network.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Trait for LLM providers that can stream a chat completion.
///
/// Implementations include:
/// - `OpenAiCompatProvider`: any OpenAI-compatible `/chat/completions` endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send the request and hand back the response body once the status
    /// line is known to be successful. A non-2xx status fails here with
    /// [`LlmError::Transport`], before any body data is consumed.
    async fn open_stream(&self, request: &ChatCompletionRequest) -> Result<ByteStream, LlmError>;

    /// Where the content fragment lives inside each stream envelope.
    fn content_path(&self) -> ContentPath {
        ContentPath::default()
    }

    /// Provider name for logging/display (e.g. "openai-compatible").
    fn name(&self) -> &str;

    /// Model identifier (e.g. "gpt-4o-mini", "deepseek-chat").
    fn model(&self) -> &str;
}
