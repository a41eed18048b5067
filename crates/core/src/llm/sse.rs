// crates/core/src/llm/sse.rs
//! Server-sent-event framing for streamed completions.
//!
//! Each `data: <json>` line carries one envelope; the content fragment sits
//! at a provider-specific path inside it (`choices[0].delta.content` for
//! OpenAI-compatible endpoints). `data: [DONE]` marks the end of the stream.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::types::LlmError;

const DONE_SENTINEL: &str = "[DONE]";

/// One step in a [`ContentPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of the content fragment inside a stream envelope, written as
/// dotted segments where numeric segments index arrays:
/// `choices.0.delta.content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath(Vec<PathSegment>);

impl ContentPath {
    pub fn resolve<'a>(&self, envelope: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(envelope, |node, segment| match segment {
            PathSegment::Key(k) => node.get(k.as_str()),
            PathSegment::Index(i) => node.get(*i),
        })
    }
}

impl Default for ContentPath {
    fn default() -> Self {
        ContentPath(vec![
            PathSegment::Key("choices".into()),
            PathSegment::Index(0),
            PathSegment::Key("delta".into()),
            PathSegment::Key("content".into()),
        ])
    }
}

impl FromStr for ContentPath {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('.')
            .map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return Err(LlmError::NotConfigured(format!("empty segment in content path {s:?}")));
                }
                Ok(match part.parse::<usize>() {
                    Ok(i) => PathSegment::Index(i),
                    Err(_) => PathSegment::Key(part.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ContentPath(segments))
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Key(k) => f.write_str(k)?,
                PathSegment::Index(n) => write!(f, "{n}")?,
            }
        }
        Ok(())
    }
}

/// What a single line of the event stream means to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Next content fragment, possibly empty (role-only or keep-alive deltas).
    Fragment(String),
    /// Explicit end-of-stream sentinel.
    Done,
    /// Blank lines, comments, `event:`/`id:` fields.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct SseDecoder {
    path: ContentPath,
}

impl SseDecoder {
    pub fn new(path: ContentPath) -> Self {
        Self { path }
    }

    /// Decode one line (without its trailing newline).
    pub fn decode(&self, line: &str) -> Result<SseEvent, LlmError> {
        let line = line.trim_end_matches('\r');
        let Some(payload) = line.strip_prefix("data:") else {
            return Ok(SseEvent::Skip);
        };
        let payload = payload.strip_prefix(' ').unwrap_or(payload);
        if payload.trim() == DONE_SENTINEL {
            return Ok(SseEvent::Done);
        }
        if payload.trim().is_empty() {
            return Ok(SseEvent::Skip);
        }

        let envelope: Value = serde_json::from_str(payload)
            .map_err(|e| LlmError::InvalidEnvelope(format!("{e}: {}", preview(payload))))?;

        if let Some(err) = envelope.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(LlmError::InvalidEnvelope(format!("provider error in stream: {message}")));
        }

        let fragment = self
            .path
            .resolve(&envelope)
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(SseEvent::Fragment(fragment.to_string()))
    }
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(120) {
        Some((b, _)) => &s[..b],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_openai_delta() {
        let dec = SseDecoder::default();
        let line = r#"data: {"id":"x","choices":[{"index":0,"delta":{"content":"{\"iss"}}]}"#;
        assert_eq!(dec.decode(line).unwrap(), SseEvent::Fragment("{\"iss".into()));
    }

    #[test]
    fn test_decode_role_only_delta_is_empty_fragment() {
        let dec = SseDecoder::default();
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(dec.decode(line).unwrap(), SseEvent::Fragment(String::new()));
    }

    #[test]
    fn test_decode_done_and_noise() {
        let dec = SseDecoder::default();
        assert_eq!(dec.decode("data: [DONE]").unwrap(), SseEvent::Done);
        assert_eq!(dec.decode("data: [DONE]\r").unwrap(), SseEvent::Done);
        assert_eq!(dec.decode("").unwrap(), SseEvent::Skip);
        assert_eq!(dec.decode(": keep-alive").unwrap(), SseEvent::Skip);
        assert_eq!(dec.decode("event: message").unwrap(), SseEvent::Skip);
    }

    #[test]
    fn test_decode_without_space_after_colon() {
        let dec = SseDecoder::default();
        let line = r#"data:{"choices":[{"delta":{"content":"a"}}]}"#;
        assert_eq!(dec.decode(line).unwrap(), SseEvent::Fragment("a".into()));
    }

    #[test]
    fn test_decode_invalid_json() {
        let dec = SseDecoder::default();
        assert!(matches!(
            dec.decode("data: {not json"),
            Err(LlmError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_in_stream_error() {
        let dec = SseDecoder::default();
        let err = dec
            .decode(r#"data: {"error":{"message":"context length exceeded"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("context length exceeded"));
    }

    #[test]
    fn test_custom_content_path() {
        let path: ContentPath = "message.content".parse().unwrap();
        assert_eq!(path.to_string(), "message.content");
        let dec = SseDecoder::new(path);
        let line = r#"data: {"message":{"role":"assistant","content":"你好"}}"#;
        assert_eq!(dec.decode(line).unwrap(), SseEvent::Fragment("你好".into()));
    }

    #[test]
    fn test_content_path_rejects_empty_segment() {
        assert!("choices..content".parse::<ContentPath>().is_err());
        assert_eq!(ContentPath::default().to_string(), "choices.0.delta.content");
    }
}
