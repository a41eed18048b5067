// crates/core/src/lib.rs
//! Proofreading engine: streamed model output → positioned, actionable issues.
pub mod bus;
pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod extractor;
pub mod file_parser;
pub mod highlight;
pub mod history;
pub mod lifecycle;
pub mod llm;
pub mod mapper;
pub mod paths;
pub mod prompt;
pub mod prompt_queue;
pub mod proofreader;
pub mod session;
pub mod store;
pub mod summary;
pub mod thesaurus;
pub mod transport;

pub use document::{Document, Span};
pub use error::*;
pub use extractor::IssueExtractor;
pub use lifecycle::{IssueBoard, Transition};
pub use mapper::{DropReason, DroppedIssue};
pub use proofreader::{CheckRun, Proofreader};
pub use session::{ProofreadSession, UserAction};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use transport::{StreamEvent, StreamOutcome, StreamTiming};
