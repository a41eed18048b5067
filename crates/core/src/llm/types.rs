// crates/core/src/llm/types.rs
//! Request/response/error types for the chat-completions endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling temperature for proofreading requests. Kept low so repeated
/// checks of the same text cite the same substrings.
pub const PROOFREAD_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Desired response format for a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".into(),
        }
    }
}

/// Body of the streaming chat-completions POST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl ChatCompletionRequest {
    /// A streamed, JSON-mode proofreading request.
    pub fn proofreading(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        input_text: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(input_text)],
            stream: true,
            temperature: PROOFREAD_TEMPERATURE,
            response_format: ResponseFormat::json_object(),
        }
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// Non-2xx status from the endpoint. Raised before any data is yielded.
    #[error("HTTP error! status: {status}: {message}")]
    Transport { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    /// The user cancelled the check. Not reported as a failure.
    #[error("Request aborted")]
    Aborted,

    /// The stream ended without ever producing a structured issue list.
    #[error("Failed to parse response: {0}")]
    MalformedResponse(String),

    #[error("Invalid stream envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

impl LlmError {
    pub fn is_abort(&self) -> bool {
        matches!(self, LlmError::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proofreading_request_wire_format() {
        let req = ChatCompletionRequest::proofreading("gpt-4o-mini", "你是校对", "他慌张的穿上衣服");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["stream"], true);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "你是校对");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "他慌张的穿上衣服");
        assert!((json["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Transport {
            status: 401,
            message: "invalid api key".into(),
        };
        assert_eq!(err.to_string(), "HTTP error! status: 401: invalid api key");
        assert_eq!(LlmError::Timeout(30).to_string(), "Timeout after 30 seconds");
        assert!(LlmError::Aborted.is_abort());
        assert!(!LlmError::Network("reset".into()).is_abort());
    }
}
