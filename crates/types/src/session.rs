// crates/types/src/session.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::issue::IssueCategory;

/// Lifecycle of one proofreading check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Streaming,
    Complete,
    Aborted,
    Errored,
}

impl SessionPhase {
    /// True once the stream is over, whatever the outcome.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            SessionPhase::Complete | SessionPhase::Aborted | SessionPhase::Errored
        )
    }
}

/// Issue counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub typo: usize,
    pub grammar: usize,
    pub punctuation: usize,
    pub style: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: IssueCategory) -> usize {
        match category {
            IssueCategory::Typo => self.typo,
            IssueCategory::Grammar => self.grammar,
            IssueCategory::Punctuation => self.punctuation,
            IssueCategory::Style => self.style,
        }
    }

    pub fn bump(&mut self, category: IssueCategory) {
        match category {
            IssueCategory::Typo => self.typo += 1,
            IssueCategory::Grammar => self.grammar += 1,
            IssueCategory::Punctuation => self.punctuation += 1,
            IssueCategory::Style => self.style += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.typo + self.grammar + self.punctuation + self.style
    }
}

/// Metrics shown next to the results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub phase: SessionPhase,
    /// Per-category counts over every non-ignored issue.
    pub counts: CategoryCounts,
    pub unresolved: usize,
    pub fixed: usize,
    pub ignored: usize,
    /// Issues the model reported that could not be positioned or were
    /// invalidated by an overlapping fix.
    pub dropped: usize,
    pub input_chars: usize,
    /// Milliseconds until the first non-empty delta. Set once streaming ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_byte_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ms: Option<u64>,
    /// Character count of the model's final content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_chars: Option<usize>,
}
