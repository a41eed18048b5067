// crates/core/src/file_parser.rs
//! Turning uploaded files into plain text.
//!
//! Routing is by extension. TXT and Markdown are handled here; DOCX and PDF
//! are recognised formats whose decoders must be registered by the host.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FileParseError;

/// Extensions accepted anywhere in the app.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "docx", "pdf"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub file_name: String,
    pub file_type: String,
    /// Character count of the extracted text.
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub text: String,
    pub metadata: FileMetadata,
}

pub trait FileParser: Send + Sync {
    /// Lower-case extensions this parser handles, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<ParsedFile, FileParseError>;
}

/// UTF-8 text and Markdown files. Invalid UTF-8 is an error, not replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl FileParser for PlainTextParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["txt", "md", "markdown"]
    }

    fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<ParsedFile, FileParseError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|e| FileParseError::Decode {
                file_name: file_name.to_string(),
                message: e.to_string(),
            })?
            .to_string();
        let file_type = extension(file_name).unwrap_or_else(|| "txt".into());
        Ok(ParsedFile {
            metadata: FileMetadata {
                file_name: file_name.to_string(),
                file_type,
                word_count: text.chars().count(),
                page_count: None,
            },
            text,
        })
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Extension-routed set of parsers.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn FileParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self {
            parsers: vec![Box::new(PlainTextParser)],
        }
    }
}

impl ParserRegistry {
    pub fn register(&mut self, parser: Box<dyn FileParser>) {
        self.parsers.insert(0, parser);
    }

    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<ParsedFile, FileParseError> {
        let ext = extension(file_name)
            .filter(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| FileParseError::UnsupportedFormat {
                file_name: file_name.to_string(),
            })?;
        let parser = self
            .parsers
            .iter()
            .find(|p| p.extensions().contains(&ext.as_str()))
            .ok_or(FileParseError::NoParser { file_type: ext })?;
        let parsed = parser.parse(file_name, bytes)?;
        tracing::debug!(
            file_name,
            file_type = %parsed.metadata.file_type,
            chars = parsed.metadata.word_count,
            "file parsed"
        );
        Ok(parsed)
    }

    pub async fn parse_path(&self, path: &Path) -> Result<ParsedFile, FileParseError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Reject before reading so a wrong file never gets loaded.
        if !extension(&file_name).is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str())) {
            return Err(FileParseError::UnsupportedFormat { file_name });
        }
        let bytes = tokio::fs::read(path).await.map_err(|source| FileParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&file_name, &bytes)
    }
}
