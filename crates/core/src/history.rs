// crates/core/src/history.rs
//! Proofreading history: packaging finished sessions and replaying them.
//!
//! An entry stores the *baseline* text (accepted fixes reverted) so every
//! stored span points at its `original`. The corrected text is rebuilt by
//! substituting suggestions back in by offset.

use proofread_types::{HistoryEntry, Issue};

use crate::document::{Document, Span};
use crate::error::StoreError;
use crate::lifecycle::IssueBoard;
use crate::store::{self, KeyValueStore, HISTORY_KEY};

/// Oldest entries beyond this are discarded on record.
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// Current time in the format used for entry timestamps.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Package the board into a history entry.
pub fn entry_from_board(board: &IssueBoard, timestamp: impl Into<String>) -> HistoryEntry {
    let doc = board.document();
    let text = doc.as_str();

    let mut ordered: Vec<&Issue> = board.issues().iter().collect();
    ordered.sort_by_key(|i| (i.start, i.end));

    let mut baseline = String::with_capacity(text.len());
    let mut baseline_chars = 0;
    let mut cursor = 0;
    let mut issues = Vec::with_capacity(ordered.len());

    for issue in ordered {
        let (Some(bs), Some(be)) = (doc.byte_offset(issue.start), doc.byte_offset(issue.end)) else {
            tracing::warn!(issue_id = issue.id, "history: issue span out of bounds, skipping");
            continue;
        };
        if bs < cursor {
            tracing::warn!(issue_id = issue.id, "history: overlapping issue span, skipping");
            continue;
        }
        let gap = &text[cursor..bs];
        baseline.push_str(gap);
        baseline_chars += gap.chars().count();

        let restored = if issue.is_fixed() {
            issue.original.as_str()
        } else {
            &text[bs..be]
        };
        let start = baseline_chars;
        baseline.push_str(restored);
        baseline_chars += restored.chars().count();

        issues.push(Issue {
            start,
            end: baseline_chars,
            ..issue.clone()
        });
        cursor = be;
    }
    baseline.push_str(&text[cursor..]);

    HistoryEntry {
        text: baseline,
        issues,
        timestamp: timestamp.into(),
    }
}

fn replay<'a>(text: &str, issues: impl Iterator<Item = &'a Issue>) -> String {
    let mut spans: Vec<&Issue> = issues.collect();
    spans.sort_by_key(|i| (i.start, i.end));

    let mut doc = Document::new(text);
    let mut last_start = usize::MAX;
    // Right to left, so earlier offsets stay valid.
    for issue in spans.into_iter().rev() {
        if issue.end > last_start {
            tracing::warn!(issue_id = issue.id, "history: overlapping span not replayed");
            continue;
        }
        let span = Span::new(issue.start, issue.end);
        if doc.slice(span) != Some(issue.original.as_str()) {
            tracing::warn!(issue_id = issue.id, "history: span does not match stored text, not replayed");
            continue;
        }
        if doc.replace(span, &issue.suggestion) {
            last_start = issue.start;
        }
    }
    doc.into_string()
}

/// The text with every stored issue's suggestion applied, exactly once each.
pub fn corrected_text(entry: &HistoryEntry) -> String {
    replay(&entry.text, entry.issues.iter())
}

/// The text as the user left it: only the fixes they accepted.
pub fn final_text(entry: &HistoryEntry) -> String {
    replay(&entry.text, entry.issues.iter().filter(|i| i.is_fixed()))
}

/// Rehydrate a board from an entry. All issues come back as pending.
pub fn restore(entry: &HistoryEntry) -> IssueBoard {
    IssueBoard::restore(entry.text.clone(), entry.issues.iter().cloned())
}

/// Newest-first list of finished sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        let mut log = Self { entries };
        log.entries.truncate(MAX_HISTORY_ENTRIES);
        log
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, timestamp: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.timestamp == timestamp)
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    /// Remove the entry with this timestamp. Returns whether one was found.
    pub fn delete(&mut self, timestamp: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp != timestamp);
        self.entries.len() != before
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub async fn load(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        let entries: Option<Vec<HistoryEntry>> = store::load(store, HISTORY_KEY).await?;
        Ok(Self::new(entries.unwrap_or_default()))
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store::save(store, HISTORY_KEY, &self.entries).await
    }
}
