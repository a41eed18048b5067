// crates/core/src/session.rs
//! One proofreading session: document, issues, extractor state and metrics.
//!
//! The session is a plain synchronous state machine. Each delta drives
//! extractor → mapper → board in one call, and user actions are applied
//! between deltas, so positioning always sees committed fixes.

use proofread_types::{CategoryFilter, HistoryEntry, SessionPhase, SessionSummary};

use crate::extractor::IssueExtractor;
use crate::history;
use crate::lifecycle::{IssueBoard, Transition};
use crate::llm::types::LlmError;
use crate::summary::{self, StreamStats};
use crate::transport::StreamOutcome;

/// Something the user did to the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Accept(u64),
    Ignore(u64),
    Unignore(u64),
    FixCategory(CategoryFilter),
    IgnoreCategory(CategoryFilter),
    /// Direct edit of the text. Discards every issue.
    EditText(String),
}

#[derive(Debug, Default)]
pub struct ProofreadSession {
    board: IssueBoard,
    extractor: IssueExtractor,
    phase: SessionPhase,
    stats: StreamStats,
    error: Option<LlmError>,
}

impl ProofreadSession {
    pub fn new(text: impl Into<String>) -> Self {
        let board = IssueBoard::new(text);
        let stats = StreamStats {
            input_chars: board.document().char_len(),
            ..Default::default()
        };
        Self {
            board,
            stats,
            ..Default::default()
        }
    }

    /// Reopen a history entry as a completed session with every issue pending.
    pub fn restore(entry: &HistoryEntry) -> Self {
        let board = history::restore(entry);
        let stats = StreamStats {
            input_chars: board.document().char_len(),
            ..Default::default()
        };
        Self {
            board,
            stats,
            phase: SessionPhase::Complete,
            ..Default::default()
        }
    }

    pub fn board(&self) -> &IssueBoard {
        &self.board
    }

    pub fn text(&self) -> &str {
        self.board.text()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The failure that ended the session, if it errored.
    pub fn error(&self) -> Option<&LlmError> {
        self.error.as_ref()
    }

    /// Start streaming against the current text with a fresh issue set.
    pub fn begin(&mut self) {
        let text = self.board.text().to_string();
        self.board = IssueBoard::new(text);
        self.extractor = IssueExtractor::new();
        self.stats = StreamStats {
            input_chars: self.board.document().char_len(),
            ..Default::default()
        };
        self.error = None;
        self.phase = SessionPhase::Streaming;
    }

    /// Feed the cumulative response buffer. Returns the ids of newly
    /// positioned issues.
    pub fn ingest(&mut self, buffer: &str) -> Vec<u64> {
        if self.phase != SessionPhase::Streaming {
            return Vec::new();
        }
        let raws = self.extractor.feed(buffer);
        self.position_all(raws)
    }

    fn position_all(&mut self, raws: Vec<proofread_types::RawIssue>) -> Vec<u64> {
        raws.into_iter()
            .filter_map(|raw| self.board.insert_raw(raw).ok())
            .collect()
    }

    /// The stream ended normally. Flushes the extractor over the final
    /// buffer; fails when the response never held a recognizable issue list.
    pub fn complete(&mut self, outcome: StreamOutcome) -> Result<Vec<u64>, LlmError> {
        if self.phase != SessionPhase::Streaming {
            return Ok(Vec::new());
        }
        self.stats.timing = Some(outcome.timing);
        self.stats.response_chars = Some(outcome.content.chars().count());

        match self.extractor.finish(&outcome.content) {
            Ok(raws) => {
                let ids = self.position_all(raws);
                self.phase = SessionPhase::Complete;
                tracing::info!(
                    issues = self.board.issues().len(),
                    dropped = self.board.dropped().len(),
                    "check complete"
                );
                Ok(ids)
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    /// User cancelled. Already positioned issues stay.
    pub fn abort(&mut self) {
        if self.phase != SessionPhase::Streaming {
            return;
        }
        self.extractor = IssueExtractor::new();
        self.phase = SessionPhase::Aborted;
        tracing::info!(issues = self.board.issues().len(), "check aborted");
    }

    /// The check failed. [`LlmError::Aborted`] is routed to [`Self::abort`].
    pub fn fail(&mut self, error: LlmError) {
        if error.is_abort() {
            self.abort();
            return;
        }
        if self.phase != SessionPhase::Streaming {
            return;
        }
        tracing::error!(error = %error, issues = self.board.issues().len(), "check failed");
        self.extractor = IssueExtractor::new();
        self.error = Some(error);
        self.phase = SessionPhase::Errored;
    }

    /// Apply a user action. Returns how many issues changed state.
    pub fn apply(&mut self, action: UserAction) -> usize {
        let single = |t: Transition| usize::from(t == Transition::Applied);
        match action {
            UserAction::Accept(id) => single(self.board.accept(id)),
            UserAction::Ignore(id) => single(self.board.ignore(id)),
            UserAction::Unignore(id) => single(self.board.unignore(id)),
            UserAction::FixCategory(filter) => self.board.fix_category(filter),
            UserAction::IgnoreCategory(filter) => self.board.ignore_category(filter),
            UserAction::EditText(text) => {
                let discarded = self.board.issues().len();
                self.board.replace_text(text);
                self.stats.input_chars = self.board.document().char_len();
                discarded
            }
        }
    }

    pub fn summary(&self) -> SessionSummary {
        summary::summarize(&self.board, self.phase, &self.stats)
    }

    /// Package a completed session for the history list.
    pub fn history_entry(&self, timestamp: impl Into<String>) -> Option<HistoryEntry> {
        (self.phase == SessionPhase::Complete).then(|| history::entry_from_board(&self.board, timestamp))
    }
}
