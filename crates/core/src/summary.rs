// crates/core/src/summary.rs
//! Session metrics for the results panel.

use proofread_types::{CategoryCounts, IssueState, SessionPhase, SessionSummary};

use crate::lifecycle::IssueBoard;
use crate::transport::StreamTiming;

/// Stream-level figures that live outside the issue board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub input_chars: usize,
    /// Set once the stream has finished.
    pub timing: Option<StreamTiming>,
    pub response_chars: Option<usize>,
}

/// Recompute the summary from scratch. Cheap enough to call after every
/// delta and every user action.
pub fn summarize(board: &IssueBoard, phase: SessionPhase, stats: &StreamStats) -> SessionSummary {
    let mut counts = CategoryCounts::default();
    let (mut unresolved, mut fixed, mut ignored) = (0, 0, 0);
    for issue in board.issues() {
        match issue.state {
            IssueState::Pending => unresolved += 1,
            IssueState::Fixed => fixed += 1,
            IssueState::Ignored => {
                ignored += 1;
                continue;
            }
        }
        counts.bump(issue.category);
    }

    SessionSummary {
        phase,
        counts,
        unresolved,
        fixed,
        ignored,
        dropped: board.dropped().len(),
        input_chars: stats.input_chars,
        first_byte_ms: stats
            .timing
            .and_then(|t| t.first_byte)
            .map(|d| d.as_millis() as u64),
        total_ms: stats.timing.map(|t| t.total.as_millis() as u64),
        response_chars: stats.response_chars,
    }
}
