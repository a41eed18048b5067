// crates/core/src/llm/testing.rs
//! In-process provider for unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};

use super::provider::{ByteStream, LlmProvider};
use super::types::{ChatCompletionRequest, LlmError};

/// Serves a fixed sequence of body chunks, then optionally hangs.
pub(crate) struct ScriptedProvider {
    pub chunks: Vec<String>,
    pub hang_after: bool,
    pub status: Option<u16>,
}

impl ScriptedProvider {
    pub fn new<S: Into<String>>(chunks: impl IntoIterator<Item = S>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            hang_after: false,
            status: None,
        }
    }

    /// One SSE line per content fragment, followed by `[DONE]`.
    pub fn fragments<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut chunks: Vec<String> = fragments.into_iter().map(sse_line).collect();
        chunks.push("data: [DONE]\n\n".into());
        Self::new(chunks)
    }
}

/// An OpenAI-style `data:` line carrying `content`.
pub(crate) fn sse_line(content: &str) -> String {
    let envelope = serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]});
    format!("data: {envelope}\n\n")
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn open_stream(&self, _request: &ChatCompletionRequest) -> Result<ByteStream, LlmError> {
        if let Some(status) = self.status {
            return Err(LlmError::Transport {
                status,
                message: "nope".into(),
            });
        }
        let body = stream::iter(
            self.chunks
                .clone()
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from(c))),
        );
        if self.hang_after {
            Ok(body.chain(stream::pending()).boxed())
        } else {
            Ok(body.boxed())
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "test"
    }
}
