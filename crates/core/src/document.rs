// crates/core/src/document.rs
//! The text under review, addressed in character offsets.
//!
//! Issue spans are character (Unicode scalar) offsets because that is what
//! the presentation layer counts. The byte/char conversion lives here so the
//! mapper and lifecycle code never slice a `String` by hand.

use memchr::memmem;

/// Half-open character range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} after end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Two spans overlap when they share at least one character. Adjacent
    /// spans (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    char_len: usize,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self { text, char_len }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset of the character at `char_idx`. `char_idx == char_len`
    /// maps to the end of the text.
    pub fn byte_offset(&self, char_idx: usize) -> Option<usize> {
        if char_idx == self.char_len {
            return Some(self.text.len());
        }
        self.text.char_indices().nth(char_idx).map(|(b, _)| b)
    }

    /// Text covered by `span`, or `None` when the span is out of bounds.
    pub fn slice(&self, span: Span) -> Option<&str> {
        if span.start > span.end || span.end > self.char_len {
            return None;
        }
        let start = self.byte_offset(span.start)?;
        let end = start + self.text[start..].char_indices().nth(span.len()).map_or(
            self.text.len() - start,
            |(b, _)| b,
        );
        Some(&self.text[start..end])
    }

    /// Replace the characters in `span` with `replacement`. Returns `false`
    /// (leaving the text untouched) when the span is out of bounds.
    pub fn replace(&mut self, span: Span, replacement: &str) -> bool {
        if span.start > span.end || span.end > self.char_len {
            return false;
        }
        let (Some(start), Some(end)) = (self.byte_offset(span.start), self.byte_offset(span.end))
        else {
            return false;
        };
        self.text.replace_range(start..end, replacement);
        self.char_len = self.char_len - span.len() + replacement.chars().count();
        true
    }

    /// Every occurrence of `needle`, left to right, including overlapping
    /// ones (`"aa"` occurs at 0 and 1 in `"aaa"`). Empty needles never match.
    pub fn occurrences<'a>(&'a self, needle: &'a str) -> Occurrences<'a> {
        Occurrences {
            haystack: &self.text,
            finder: memmem::Finder::new(needle.as_bytes()),
            needle_chars: needle.chars().count(),
            byte_pos: 0,
            char_pos: 0,
            done: needle.is_empty(),
        }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Document::new(text)
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Document::new(text)
    }
}

/// Iterator over the character spans where a needle occurs.
pub struct Occurrences<'a> {
    haystack: &'a str,
    finder: memmem::Finder<'a>,
    needle_chars: usize,
    byte_pos: usize,
    char_pos: usize,
    done: bool,
}

impl Iterator for Occurrences<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.done {
            return None;
        }
        let rest = &self.haystack.as_bytes()[self.byte_pos..];
        let Some(rel) = self.finder.find(rest) else {
            self.done = true;
            return None;
        };
        let hit = self.byte_pos + rel;
        // A UTF-8 needle can only match on a char boundary of a UTF-8 haystack.
        self.char_pos += self.haystack[self.byte_pos..hit].chars().count();
        let start = self.char_pos;

        // Resume one character past the hit so overlapping matches are seen.
        let step = self.haystack[hit..].chars().next().map_or(1, char::len_utf8);
        self.byte_pos = hit + step;
        self.char_pos += 1;
        if self.byte_pos >= self.haystack.len() {
            self.done = true;
        }

        Some(Span::new(start, start + self.needle_chars))
    }
}
