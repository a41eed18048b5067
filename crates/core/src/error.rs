// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

pub use crate::llm::types::LlmError;

/// Errors from the persisted key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("IO error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON stored under key {key}: {message}")]
    MalformedValue { key: String, message: String },

    #[error("Failed to serialize value for key {key}: {message}")]
    Serialize { key: String, message: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the file-parse capability. Reported per upload attempt.
#[derive(Debug, Error)]
pub enum FileParseError {
    #[error("Unsupported file format: {file_name} (expected TXT, MD, DOCX or PDF)")]
    UnsupportedFormat { file_name: String },

    #[error("No parser registered for {file_type} files")]
    NoParser { file_type: String },

    #[error("Failed to decode {file_name}: {message}")]
    Decode { file_name: String, message: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from thesaurus group management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThesaurusError {
    #[error("Thesaurus group not found: {0}")]
    GroupNotFound(String),

    #[error("Group name must not be empty")]
    EmptyName,

    #[error("Correction fields must not be empty")]
    EmptyCorrection,

    #[error("Correction for {original:?} already exists in this group")]
    DuplicateCorrection { original: String },

    #[error("Correction for {original:?} not found in this group")]
    CorrectionNotFound { original: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_parse_error_display() {
        let err = FileParseError::UnsupportedFormat {
            file_name: "notes.rtf".into(),
        };
        assert!(err.to_string().contains("notes.rtf"));
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::MalformedValue {
            key: "history".into(),
            message: "expected value".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed JSON stored under key history: expected value"
        );
    }

    #[test]
    fn test_thesaurus_error_display() {
        let err = ThesaurusError::DuplicateCorrection {
            original: "帐号".into(),
        };
        assert!(err.to_string().contains("帐号"));
    }
}
