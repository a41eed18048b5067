// crates/core/src/transport.rs
//! Streaming transport: response body → cumulative content deltas.
//!
//! The body is split into lines, each `data:` line is decoded into a content
//! fragment, and every non-empty fragment produces a [`StreamEvent::Delta`]
//! carrying the whole buffer so far. The stream ends with exactly one
//! [`StreamEvent::Finished`], or with an error item.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::llm::provider::LlmProvider;
use crate::llm::sse::{SseDecoder, SseEvent};
use crate::llm::types::{ChatCompletionRequest, LlmError};

/// Longest single SSE line accepted before the stream is treated as broken.
const MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTiming {
    /// Time from request start to the first non-empty fragment. `None` when
    /// the model produced no content at all.
    pub first_byte: Option<Duration>,
    pub total: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub content: String,
    pub timing: StreamTiming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Cumulative content so far. Replaces the previous buffer.
    Delta(String),
    Finished(StreamOutcome),
}

pub type DeltaStream = BoxStream<'static, Result<StreamEvent, LlmError>>;

/// Open a streamed completion. Nothing is sent until the stream is polled.
///
/// Cancelling `cancel` ends the stream with [`LlmError::Aborted`] at the
/// next line boundary (or while waiting for the response headers).
pub fn open(
    provider: Arc<dyn LlmProvider>,
    request: ChatCompletionRequest,
    cancel: CancellationToken,
) -> DeltaStream {
    let stream = async_stream::try_stream! {
        let started = Instant::now();

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LlmError::Aborted),
            opened = provider.open_stream(&request) => opened,
        }?;

        let decoder = SseDecoder::new(provider.content_path());
        let mut lines = FramedRead::new(
            StreamReader::new(body),
            LinesCodec::new_with_max_length(MAX_LINE_BYTES),
        );
        let mut content = String::new();
        let mut first_byte: Option<Duration> = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(LlmError::Aborted),
                line = lines.next() => Ok(line),
            };
            if next.is_err() {
                tracing::info!(
                    received_chars = content.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "stream aborted"
                );
            }
            let Some(line) = next? else {
                break;
            };
            let line = line.map_err(|e| LlmError::Network(e.to_string()))?;

            match decoder.decode(&line) {
                Ok(SseEvent::Fragment(fragment)) if !fragment.is_empty() => {
                    if first_byte.is_none() {
                        let elapsed = started.elapsed();
                        tracing::debug!(first_byte_ms = elapsed.as_millis() as u64, "first content received");
                        first_byte = Some(elapsed);
                    }
                    content.push_str(&fragment);
                    yield StreamEvent::Delta(content.clone());
                }
                Ok(SseEvent::Done) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable stream line");
                }
            }
        }

        let timing = StreamTiming {
            first_byte,
            total: started.elapsed(),
        };
        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            response_chars = content.chars().count(),
            total_ms = timing.total.as_millis() as u64,
            "stream finished"
        );
        yield StreamEvent::Finished(StreamOutcome { content, timing });
    };
    stream.boxed()
}
