// crates/core/src/mapper.rs
//! Offset mapping: raw model issues → disjoint spans in the live document.
//!
//! Positioning is first-available, left to right: an issue claims the first
//! occurrence of its `original` that does not overlap a span already
//! claimed. Arrival order decides ties, so two issues citing the same text
//! land on successive occurrences and the surplus is dropped.
//!
//! Fix reconciliation shifts spans that lie after a replaced span and
//! invalidates any span that overlapped it.

use proofread_types::{Issue, RawIssue};

use crate::document::{Document, Span};

/// Why a raw issue did not make it into the issue set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The model cited an empty `original`.
    EmptyOriginal,
    /// `original` does not occur in the document at all.
    NotFound,
    /// Every occurrence of `original` is already claimed by another issue.
    AllOccurrencesClaimed,
    /// The issue's text was replaced by an overlapping fix.
    InvalidatedByFix { fixed_id: u64 },
}

/// Diagnostic record for an issue that could not be kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedIssue {
    pub raw: RawIssue,
    pub reason: DropReason,
}

/// Find the first occurrence of `original` in `document` that overlaps none
/// of `claimed`. `claimed` need not be sorted.
pub fn locate(document: &Document, original: &str, claimed: &[Span]) -> Result<Span, DropReason> {
    if original.is_empty() {
        return Err(DropReason::EmptyOriginal);
    }
    let mut seen_any = false;
    for candidate in document.occurrences(original) {
        seen_any = true;
        if !claimed.iter().any(|c| c.overlaps(&candidate)) {
            return Ok(candidate);
        }
    }
    Err(if seen_any {
        DropReason::AllOccurrencesClaimed
    } else {
        DropReason::NotFound
    })
}

/// Position `raw` against `document`, producing a pending [`Issue`] with the
/// given id. The returned issue satisfies `document[start..end] == original`.
pub fn position(
    document: &Document,
    raw: RawIssue,
    claimed: &[Span],
    id: u64,
) -> Result<Issue, DroppedIssue> {
    match locate(document, &raw.original, claimed) {
        Ok(span) => Ok(Issue::from_raw(id, raw, span.start, span.end)),
        Err(reason) => Err(DroppedIssue { raw, reason }),
    }
}

/// Shift or invalidate `issues` after the span `fixed` (as it was before the
/// fix) was replaced by `replacement_len` characters.
///
/// - spans entirely before `fixed` are untouched
/// - spans entirely after it move by `replacement_len - fixed.len()`
/// - spans overlapping it are removed and returned
///
/// The fixed issue itself must not be in `issues`.
pub fn reconcile_after_fix(issues: &mut Vec<Issue>, fixed: Span, replacement_len: usize) -> Vec<Issue> {
    let mut invalidated = Vec::new();
    let mut kept = Vec::with_capacity(issues.len());
    for mut issue in issues.drain(..) {
        let span = Span::new(issue.start, issue.end);
        if span.end <= fixed.start {
            kept.push(issue);
        } else if span.start >= fixed.end {
            // new = old - fixed.len + replacement_len, never underflows since old >= fixed.end
            issue.start = issue.start - fixed.len() + replacement_len;
            issue.end = issue.end - fixed.len() + replacement_len;
            kept.push(issue);
        } else {
            invalidated.push(issue);
        }
    }
    *issues = kept;
    invalidated
}

/// True when `issues`, in their current order, are sorted by `start` and
/// pairwise non-overlapping.
pub fn is_disjoint_and_ordered(issues: &[Issue]) -> bool {
    issues.windows(2).all(|w| w[0].end <= w[1].start && w[0].start <= w[1].start)
}
