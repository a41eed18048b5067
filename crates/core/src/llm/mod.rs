// crates/core/src/llm/mod.rs
//! LLM integration for proofreading.
//!
//! Provides the `LlmProvider` trait, the OpenAI-compatible streaming
//! implementation and the SSE line decoder used by the transport.

pub mod factory;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::create_provider;
pub use openai::OpenAiCompatProvider;
pub use provider::{ByteStream, LlmProvider};
pub use sse::{ContentPath, SseDecoder, SseEvent};
pub use types::{ChatCompletionRequest, ChatMessage, ChatRole, LlmError};
