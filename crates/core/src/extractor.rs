// crates/core/src/extractor.rs
//! Incremental issue extraction from a growing, possibly truncated JSON
//! document such as `{"issues":[{...},{...},{"original":"错","sugg`.
//!
//! The extractor lexes the buffer once, remembering where it stopped, and
//! yields each top-level object of the issues array as soon as its closing
//! brace arrives. A confirmed-object watermark guarantees nothing is yielded
//! twice, even if the caller hands over a buffer that is not an extension of
//! the previous one and a full rescan is needed.
//!
//! Incrementally, the issues array is either the value of the top-level
//! `"issues"` key or a bare top-level array. A bracketed run that closes
//! without holding any object (prose such as `结果[如下]：`) is skipped.
//! Arrays under other keys are only considered by [`IssueExtractor::finish`],
//! which starts its own count when it settles on a different array.

use proofread_types::RawIssue;
use serde_json::Value;

use crate::llm::types::LlmError;

/// Which array the confirmed watermark counts objects of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArraySource {
    Bare,
    IssuesKey,
    /// Found only by the final parse (nested, or under another key).
    Other,
}

const ISSUES_KEY: &[u8] = b"issues";

/// Lexer position inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Looking for the issues array.
    SeekArray,
    /// Inside the array, between elements.
    InArray,
    /// Inside a top-level element object of the array.
    InObject,
    /// The array's closing `]` was seen; nothing more to extract.
    Closed,
}

#[derive(Debug, Clone)]
struct Lexer {
    phase: Phase,
    in_string: bool,
    escaped: bool,
    /// Brace/bracket depth, counted from the start of the buffer.
    depth: usize,
    /// Depth inside the array at which element objects open.
    array_depth: usize,
    /// Byte offset of the `{` that opened the current element.
    object_start: usize,
    /// Objects closed inside the current array.
    array_objects: usize,
    /// Opening quote of the string being lexed.
    string_start: usize,
    /// Quote span of the last string closed at depth 1, i.e. the key in
    /// front of a depth-1 value.
    last_key: Option<(usize, usize)>,
    source: Option<ArraySource>,
}

impl Lexer {
    fn new() -> Self {
        Self {
            phase: Phase::SeekArray,
            in_string: false,
            escaped: false,
            depth: 0,
            array_depth: 0,
            object_start: 0,
            array_objects: 0,
            string_start: 0,
            last_key: None,
            source: None,
        }
    }
}

/// Stateful extractor for one stream.
#[derive(Debug, Clone)]
pub struct IssueExtractor {
    /// Text already lexed; every new buffer is expected to extend it.
    scanned: String,
    lexer: Lexer,
    /// Complete element objects seen so far, valid or not.
    completed: usize,
    /// Watermark: objects before this index were already handled.
    confirmed: usize,
    /// Objects that closed but did not deserialize into a [`RawIssue`].
    rejected: usize,
    /// Array `confirmed` refers to once [`Self::finish`] has settled on one.
    final_source: Option<ArraySource>,
}

impl Default for IssueExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueExtractor {
    pub fn new() -> Self {
        Self {
            scanned: String::new(),
            lexer: Lexer::new(),
            completed: 0,
            confirmed: 0,
            rejected: 0,
            final_source: None,
        }
    }

    /// Number of element objects handled so far (yielded or rejected).
    pub fn confirmed(&self) -> usize {
        self.confirmed
    }

    /// Number of complete objects that were not valid issues.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Feed the cumulative buffer and return issues confirmed since the
    /// previous call. Incomplete trailing objects are deferred, never an error.
    pub fn feed(&mut self, buffer: &str) -> Vec<RawIssue> {
        let resume_at = if buffer.starts_with(self.scanned.as_str()) {
            self.scanned.len()
        } else {
            tracing::debug!(
                previous_len = self.scanned.len(),
                new_len = buffer.len(),
                "extractor: buffer is not an extension of the previous one, rescanning"
            );
            self.lexer = Lexer::new();
            self.completed = 0;
            self.scanned.clear();
            0
        };
        self.scanned.push_str(&buffer[resume_at..]);

        let mut found = Vec::new();
        self.scan_from(resume_at, &mut found);
        found
    }

    fn scan_from(&mut self, from: usize, out: &mut Vec<RawIssue>) {
        let bytes = self.scanned.as_bytes();
        let mut closed_objects: Vec<(usize, usize)> = Vec::new();
        let lx = &mut self.lexer;

        // Structural characters are all ASCII, so a byte walk is safe on UTF-8.
        for (i, &b) in bytes.iter().enumerate().skip(from) {
            if lx.phase == Phase::Closed {
                break;
            }
            if lx.in_string {
                if lx.escaped {
                    lx.escaped = false;
                } else if b == b'\\' {
                    lx.escaped = true;
                } else if b == b'"' {
                    lx.in_string = false;
                    if lx.depth == 1 {
                        lx.last_key = Some((lx.string_start, i));
                    }
                }
                continue;
            }
            match b {
                b'"' => {
                    lx.in_string = true;
                    lx.string_start = i;
                }
                b'{' => {
                    if lx.phase == Phase::InArray && lx.depth == lx.array_depth {
                        lx.phase = Phase::InObject;
                        lx.object_start = i;
                    }
                    lx.depth += 1;
                }
                b'[' => {
                    if lx.phase == Phase::SeekArray {
                        let source = match lx.depth {
                            0 => Some(ArraySource::Bare),
                            1 => lx
                                .last_key
                                .filter(|&(open, close)| &bytes[open + 1..close] == ISSUES_KEY)
                                .map(|_| ArraySource::IssuesKey),
                            _ => None,
                        };
                        if source.is_some() {
                            lx.phase = Phase::InArray;
                            lx.array_depth = lx.depth + 1;
                            lx.array_objects = 0;
                            lx.source = source;
                        }
                    }
                    lx.depth += 1;
                }
                b'}' | b']' => {
                    lx.depth = lx.depth.saturating_sub(1);
                    match lx.phase {
                        Phase::InObject if b == b'}' && lx.depth == lx.array_depth => {
                            closed_objects.push((lx.object_start, i + 1));
                            lx.array_objects += 1;
                            lx.phase = Phase::InArray;
                        }
                        Phase::InArray if b == b']' && lx.depth + 1 == lx.array_depth => {
                            if lx.array_objects == 0 {
                                lx.phase = Phase::SeekArray;
                                lx.source = None;
                            } else {
                                lx.phase = Phase::Closed;
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        for (start, end) in closed_objects {
            let index = self.completed;
            self.completed += 1;
            if index < self.confirmed {
                continue;
            }
            self.confirmed += 1;
            match serde_json::from_str::<RawIssue>(&self.scanned[start..end]) {
                Ok(issue) => out.push(issue),
                Err(e) => {
                    self.rejected += 1;
                    tracing::warn!(
                        index,
                        error = %e,
                        object = %truncate(&self.scanned[start..end], 200),
                        "extractor: complete object is not a valid issue, skipping"
                    );
                }
            }
        }
    }

    /// Called once the stream has ended. Yields any issues the incremental
    /// pass could not see (for example when the model nested the array
    /// deeper than expected) and fails with `MalformedResponse` when the
    /// stream never produced structured output.
    pub fn finish(&mut self, buffer: &str) -> Result<Vec<RawIssue>, LlmError> {
        let mut found = self.feed(buffer);

        match parse_document(buffer) {
            Some(value) => {
                let (source, elements) = match locate_issues(&value) {
                    Some((source, items)) => (source, items.as_slice()),
                    None => (ArraySource::Other, &[][..]),
                };
                let counted = self.final_source.or(self.lexer.source);
                if counted.is_some_and(|c| c != source) {
                    tracing::debug!(
                        live_confirmed = self.confirmed,
                        ?source,
                        "extractor: final document uses a different array, recounting"
                    );
                    self.confirmed = 0;
                }
                self.final_source = Some(source);
                for (index, element) in elements.iter().enumerate().skip(self.confirmed) {
                    self.confirmed = index + 1;
                    match serde_json::from_value::<RawIssue>(element.clone()) {
                        Ok(issue) => found.push(issue),
                        Err(e) => {
                            self.rejected += 1;
                            tracing::warn!(index, error = %e, "extractor: invalid issue in final document");
                        }
                    }
                }
                Ok(found)
            }
            None if self.confirmed > 0 => {
                tracing::warn!(
                    confirmed = self.confirmed,
                    buffer_len = buffer.len(),
                    "extractor: stream ended with truncated JSON, keeping confirmed issues"
                );
                Ok(found)
            }
            None => Err(LlmError::MalformedResponse(format!(
                "no structured issue list in response: {}",
                truncate(buffer, 200)
            ))),
        }
    }
}

/// Parse the complete response, tolerating prose or markdown fences around
/// the JSON body.
///
/// Every `{`/`[` is tried as a start position; trailing text after the first
/// complete value is ignored. A value that is plainly an issue list wins over
/// one that merely contains an array somewhere.
fn parse_document(buffer: &str) -> Option<Value> {
    let trimmed = buffer.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }
    let mut fallback = None;
    for (start, _) in trimmed.match_indices(&['{', '['][..]) {
        let mut values = serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<Value>();
        let Some(Ok(value)) = values.next() else {
            continue;
        };
        if is_issue_list(&value) {
            return Some(value);
        }
        if fallback.is_none() && issue_array(&value).is_some() {
            fallback = Some(value);
        }
    }
    fallback
}

fn is_issue_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => {
            !items.is_empty() && items.iter().all(|item| item.get("original").is_some())
        }
        Value::Object(map) => map.get("issues").is_some_and(Value::is_array),
        _ => false,
    }
}

/// The issue array of a parsed response and where it was found.
fn locate_issues(value: &Value) -> Option<(ArraySource, &Vec<Value>)> {
    match value {
        Value::Array(items) => Some((ArraySource::Bare, items)),
        Value::Object(map) => match map.get("issues").and_then(Value::as_array) {
            Some(items) => Some((ArraySource::IssuesKey, items)),
            None => map.values().find_map(issue_array).map(|items| (ArraySource::Other, items)),
        },
        _ => None,
    }
}

/// A bare array, the `issues` key, or the first array found searching nested
/// values in key order.
fn issue_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("issues")
            .and_then(Value::as_array)
            .or_else(|| map.values().find_map(issue_array)),
        _ => None,
    }
}

fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proofread_types::IssueCategory;

    const FULL: &str = r#"{"issues":[{"original":"错","suggestion":"措","reason":"错别字","category":"错别字"},{"original":"的","suggestion":"地","reason":"副词","category":"语法错误"}]}"#;

    fn originals(issues: &[RawIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.original.as_str()).collect()
    }

    #[test]
    fn test_incomplete_object_yields_nothing_then_completes() {
        let mut ex = IssueExtractor::new();
        let delta1 = r#"{"issues":[{"original":"错","suggest"#;
        assert!(ex.feed(delta1).is_empty());

        let delta2 = r#"{"issues":[{"original":"错","suggestion":"措","reason":"r","category":"错别字"}"#;
        let got = ex.feed(delta2);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].original, "错");
        assert_eq!(got[0].category, IssueCategory::Typo);
    }

    #[test]
    fn test_never_yields_twice_across_growing_prefixes() {
        let mut ex = IssueExtractor::new();
        let mut all = Vec::new();
        for end in 1..=FULL.len() {
            if FULL.is_char_boundary(end) {
                all.extend(ex.feed(&FULL[..end]));
            }
        }
        assert_eq!(originals(&all), vec!["错", "的"]);
        assert!(ex.finish(FULL).unwrap().is_empty());
    }

    #[test]
    fn test_same_buffer_twice_yields_once() {
        let mut ex = IssueExtractor::new();
        assert_eq!(ex.feed(FULL).len(), 2);
        assert!(ex.feed(FULL).is_empty());
    }

    #[test]
    fn test_rewritten_buffer_respects_watermark() {
        let mut ex = IssueExtractor::new();
        assert_eq!(ex.feed(FULL).len(), 2);
        // same document re-serialized with different whitespace
        let reformatted = FULL.replace(",\"", ", \"");
        assert!(ex.feed(&reformatted).is_empty());
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let mut ex = IssueExtractor::new();
        let buf = r#"{"issues":[{"original":"{括号}","suggestion":"【括号】","reason":"用 } 和 \" 表示","category":"标点符号"}"#;
        let got = ex.feed(buf);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].original, "{括号}");
    }

    #[test]
    fn test_nested_objects_inside_issue() {
        let mut ex = IssueExtractor::new();
        let buf = r#"{"issues":[{"original":"a","suggestion":"b","reason":"r","category":"表达优化","meta":{"score":1}},"#;
        assert_eq!(ex.feed(buf).len(), 1);
    }

    #[test]
    fn test_invalid_complete_object_is_skipped_not_retried() {
        let mut ex = IssueExtractor::new();
        let buf = r#"{"issues":[{"original":"a","category":"未知"},{"original":"b","suggestion":"c","reason":"r","category":"typo"}]}"#;
        let got = ex.feed(buf);
        assert_eq!(originals(&got), vec!["b"]);
        assert_eq!(ex.rejected(), 1);
        assert_eq!(ex.confirmed(), 2);
        assert!(ex.finish(buf).unwrap().is_empty());
    }

    #[test]
    fn test_bare_array_and_fenced_output() {
        let mut ex = IssueExtractor::new();
        let buf = "```json\n[{\"original\":\"a\",\"suggestion\":\"b\",\"reason\":\"r\",\"category\":\"Style\"}]\n```";
        assert_eq!(ex.feed(buf).len(), 1);
        assert!(ex.finish(buf).unwrap().is_empty());
    }

    #[test]
    fn test_empty_issue_list_is_valid() {
        let mut ex = IssueExtractor::new();
        assert!(ex.finish(r#"{"issues":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_deeply_nested_array_found_on_finish() {
        let mut ex = IssueExtractor::new();
        let buf = r#"{"result":{"issues":[{"original":"a","suggestion":"b","reason":"r","category":"错别字"}]}}"#;
        // depth-2 array is not tracked incrementally
        assert!(ex.feed(buf).is_empty());
        let got = ex.finish(buf).unwrap();
        assert_eq!(originals(&got), vec!["a"]);
    }

    #[test]
    fn test_other_array_field_found_on_finish() {
        let mut ex = IssueExtractor::new();
        let buf = r#"{"errors":[{"original":"a","suggestion":"b","reason":"r","category":"错别字"}]}"#;
        // only the "issues" key is followed incrementally
        assert!(ex.feed(buf).is_empty());
        assert_eq!(originals(&ex.finish(buf).unwrap()), vec!["a"]);
        assert!(ex.finish(buf).unwrap().is_empty());
    }

    #[test]
    fn test_sibling_array_before_issues_does_not_consume_watermark() {
        let mut ex = IssueExtractor::new();
        let buf = r#"{"notes":[{"step":1},{"step":2}],"issues":[{"original":"a","suggestion":"b","reason":"r","category":"错别字"}]}"#;
        let mut all = ex.feed(buf);
        all.extend(ex.finish(buf).unwrap());
        assert_eq!(originals(&all), vec!["a"]);
        assert_eq!(ex.rejected(), 0);
    }

    #[test]
    fn test_sibling_array_across_growing_prefixes() {
        let buf = r#"{"notes":[{"step":1}],"issues":[{"original":"a","suggestion":"b","reason":"r","category":"错别字"},{"original":"c","suggestion":"d","reason":"r","category":"错别字"}]}"#;
        let mut ex = IssueExtractor::new();
        let mut all = Vec::new();
        for end in (1..=buf.len()).filter(|&end| buf.is_char_boundary(end)) {
            all.extend(ex.feed(&buf[..end]));
        }
        all.extend(ex.finish(buf).unwrap());
        assert_eq!(originals(&all), vec!["a", "c"]);
    }

    #[test]
    fn test_prose_with_brackets_before_document() {
        let buf = r#"结果[如下]：{"issues":[{"original":"a","suggestion":"b","reason":"r","category":"错别字"}]} 以上。"#;
        let mut ex = IssueExtractor::new();
        assert_eq!(originals(&ex.feed(buf)), vec!["a"]);
        assert!(ex.finish(buf).unwrap().is_empty());

        // Same text seen only at the end of the stream.
        let mut late = IssueExtractor::new();
        assert_eq!(originals(&late.finish(buf).unwrap()), vec!["a"]);
    }

    #[test]
    fn test_prose_array_of_objects_is_recounted_on_finish() {
        let buf = r#"示例 [{"x":1}] 正文：{"issues":[{"original":"a","suggestion":"b","reason":"r","category":"错别字"}]}"#;
        let mut ex = IssueExtractor::new();
        let mut all = ex.feed(buf);
        all.extend(ex.finish(buf).unwrap());
        assert_eq!(originals(&all), vec!["a"]);
    }

    #[test]
    fn test_garbage_stream_is_malformed() {
        let mut ex = IssueExtractor::new();
        let err = ex.finish("抱歉，我无法完成这个请求。").unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_truncated_stream_keeps_confirmed_issues() {
        let mut ex = IssueExtractor::new();
        let buf = r#"{"issues":[{"original":"a","suggestion":"b","reason":"r","category":"错别字"},{"original":"c","sugg"#;
        assert_eq!(ex.feed(buf).len(), 1);
        assert!(ex.finish(buf).unwrap().is_empty());
    }
}
