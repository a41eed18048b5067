// crates/core/src/lifecycle.rs
//! Issue lifecycle state machine.
//!
//! ```text
//! Pending ──accept──▶ Fixed (terminal)
//! Pending ──ignore──▶ Ignored ──unignore──▶ Pending
//! ```
//!
//! [`IssueBoard`] owns the live document together with its issues so that a
//! fix can rewrite the text and reconcile every other span in one step.
//! Issues are kept sorted by `start` and pairwise disjoint at all times.

use proofread_types::{CategoryFilter, Issue, IssueState, RawIssue};

use crate::document::{Document, Span};
use crate::mapper::{self, DropReason, DroppedIssue};

/// Result of a single state transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The issue exists but the transition does not apply to its state.
    NoOp,
    UnknownIssue,
}

#[derive(Debug, Clone, Default)]
pub struct IssueBoard {
    document: Document,
    issues: Vec<Issue>,
    next_id: u64,
    dropped: Vec<DroppedIssue>,
}

impl IssueBoard {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            document: Document::new(text),
            issues: Vec::new(),
            next_id: 1,
            dropped: Vec::new(),
        }
    }

    /// Rebuild a board from previously positioned issues (history restore).
    ///
    /// Every issue is reset to pending. Issues whose span no longer matches
    /// their `original`, or that overlap an earlier one, are dropped.
    pub fn restore(text: impl Into<String>, issues: impl IntoIterator<Item = Issue>) -> Self {
        let mut board = Self::new(text);
        let mut incoming: Vec<Issue> = issues.into_iter().collect();
        incoming.sort_by_key(|i| (i.start, i.id));
        for mut issue in incoming {
            let span = Span::new(issue.start, issue.end.max(issue.start));
            let matches = !span.is_empty()
                && board.document.slice(span) == Some(issue.original.as_str());
            let overlaps = board
                .issues
                .last()
                .is_some_and(|prev| Span::new(prev.start, prev.end).overlaps(&span));
            if !matches || overlaps {
                tracing::warn!(
                    issue_id = issue.id,
                    start = issue.start,
                    end = issue.end,
                    "restore: issue span does not match stored text, dropping"
                );
                continue;
            }
            issue.state = IssueState::Pending;
            board.next_id = board.next_id.max(issue.id + 1);
            board.issues.push(issue);
        }
        board
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> &str {
        self.document.as_str()
    }

    /// Issues in document order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue(&self, id: u64) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    pub fn dropped(&self) -> &[DroppedIssue] {
        &self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    fn claimed_spans(&self) -> Vec<Span> {
        self.issues.iter().map(|i| Span::new(i.start, i.end)).collect()
    }

    fn index_of(&self, id: u64) -> Option<usize> {
        self.issues.iter().position(|i| i.id == id)
    }

    fn insert_sorted(&mut self, issue: Issue) {
        let at = self.issues.partition_point(|i| i.start <= issue.start);
        self.issues.insert(at, issue);
    }

    /// Position a raw issue against the current document and add it as
    /// pending. Unpositionable issues are logged and kept for diagnostics.
    pub fn insert_raw(&mut self, raw: RawIssue) -> Result<u64, DropReason> {
        let claimed = self.claimed_spans();
        match mapper::position(&self.document, raw, &claimed, self.next_id) {
            Ok(issue) => {
                let id = issue.id;
                self.next_id += 1;
                self.insert_sorted(issue);
                Ok(id)
            }
            Err(dropped) => {
                tracing::warn!(
                    original = %dropped.raw.original,
                    category = %dropped.raw.category,
                    reason = ?dropped.reason,
                    "unpositionable issue dropped"
                );
                let reason = dropped.reason;
                self.dropped.push(dropped);
                Err(reason)
            }
        }
    }

    /// Accept a pending issue: replace its span with the suggestion and
    /// reconcile every other span against the new text.
    pub fn accept(&mut self, id: u64) -> Transition {
        let Some(idx) = self.index_of(id) else {
            return Transition::UnknownIssue;
        };
        if !self.issues[idx].is_pending() {
            return Transition::NoOp;
        }

        let mut fixed = self.issues.remove(idx);
        let span = Span::new(fixed.start, fixed.end);
        if !self.document.replace(span, &fixed.suggestion) {
            tracing::error!(issue_id = id, start = span.start, end = span.end, "fix span out of bounds");
            self.insert_sorted(fixed);
            return Transition::NoOp;
        }

        let replacement_len = fixed.suggestion.chars().count();
        let invalidated = mapper::reconcile_after_fix(&mut self.issues, span, replacement_len);
        for issue in invalidated {
            tracing::debug!(
                issue_id = issue.id,
                fixed_id = id,
                "issue invalidated by overlapping fix"
            );
            self.dropped.push(DroppedIssue {
                raw: RawIssue {
                    original: issue.original,
                    suggestion: issue.suggestion,
                    reason: issue.reason,
                    category: issue.category,
                },
                reason: DropReason::InvalidatedByFix { fixed_id: id },
            });
        }

        fixed.end = fixed.start + replacement_len;
        fixed.state = IssueState::Fixed;
        self.insert_sorted(fixed);
        Transition::Applied
    }

    pub fn ignore(&mut self, id: u64) -> Transition {
        self.set_state(id, IssueState::Pending, IssueState::Ignored)
    }

    pub fn unignore(&mut self, id: u64) -> Transition {
        self.set_state(id, IssueState::Ignored, IssueState::Pending)
    }

    fn set_state(&mut self, id: u64, from: IssueState, to: IssueState) -> Transition {
        match self.issues.iter_mut().find(|i| i.id == id) {
            None => Transition::UnknownIssue,
            Some(issue) if issue.state == from => {
                issue.state = to;
                Transition::Applied
            }
            Some(_) => Transition::NoOp,
        }
    }

    fn pending_ids(&self, filter: CategoryFilter) -> Vec<u64> {
        self.issues
            .iter()
            .filter(|i| i.is_pending() && filter.matches(i.category))
            .map(|i| i.id)
            .collect()
    }

    /// Accept every pending issue in `filter`, in ascending `start` order,
    /// reconciling offsets after each fix. Returns the number fixed.
    pub fn fix_category(&mut self, filter: CategoryFilter) -> usize {
        self.pending_ids(filter)
            .into_iter()
            .filter(|&id| self.accept(id) == Transition::Applied)
            .count()
    }

    /// Ignore every pending issue in `filter`. The text is not touched.
    pub fn ignore_category(&mut self, filter: CategoryFilter) -> usize {
        self.pending_ids(filter)
            .into_iter()
            .filter(|&id| self.ignore(id) == Transition::Applied)
            .count()
    }

    /// Replace the text wholesale (a direct user edit). Every span is
    /// invalidated, so all issues are discarded; ids keep counting up.
    pub fn replace_text(&mut self, text: impl Into<String>) {
        self.document = Document::new(text);
        self.issues.clear();
        self.dropped.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proofread_types::IssueCategory;

    fn raw(original: &str, suggestion: &str, category: IssueCategory) -> RawIssue {
        RawIssue {
            original: original.into(),
            suggestion: suggestion.into(),
            reason: "reason".into(),
            category,
        }
    }

    fn spans(board: &IssueBoard) -> Vec<(u64, usize, usize, IssueState)> {
        board.issues().iter().map(|i| (i.id, i.start, i.end, i.state)).collect()
    }

    #[test]
    fn test_accept_replaces_first_unclaimed_occurrence() {
        let mut board = IssueBoard::new("他慌张的穿上衣服，他的手在抖");
        let id = board
            .insert_raw(raw("的", "地", IssueCategory::Grammar))
            .unwrap();
        assert_eq!(board.accept(id), Transition::Applied);
        assert_eq!(board.text(), "他慌张地穿上衣服，他的手在抖");
        assert_eq!(board.issue(id).unwrap().state, IssueState::Fixed);
    }

    #[test]
    fn test_duplicate_original_with_single_occurrence_is_dropped() {
        let mut board = IssueBoard::new("我吃了饭");
        assert!(board.insert_raw(raw("了", "过", IssueCategory::Grammar)).is_ok());
        assert_eq!(
            board.insert_raw(raw("了", "完", IssueCategory::Style)),
            Err(DropReason::AllOccurrencesClaimed)
        );
        assert_eq!(board.issues().len(), 1);
        assert_eq!(board.dropped().len(), 1);
    }

    #[test]
    fn test_fix_shifts_later_issues() {
        let mut board = IssueBoard::new("帐号和密马");
        let a = board.insert_raw(raw("帐号", "账户号码", IssueCategory::Typo)).unwrap();
        let b = board.insert_raw(raw("密马", "密码", IssueCategory::Typo)).unwrap();
        board.accept(a);
        assert_eq!(board.text(), "账户号码和密马");
        let issue_b = board.issue(b).unwrap();
        assert_eq!((issue_b.start, issue_b.end), (5, 7));
        board.accept(b);
        assert_eq!(board.text(), "账户号码和密码");
    }

    #[test]
    fn test_fix_does_not_move_earlier_issues() {
        let mut board = IssueBoard::new("甲乙丙丁");
        let a = board.insert_raw(raw("甲", "A", IssueCategory::Typo)).unwrap();
        let d = board.insert_raw(raw("丁", "DDD", IssueCategory::Typo)).unwrap();
        board.accept(d);
        let issue_a = board.issue(a).unwrap();
        assert_eq!((issue_a.start, issue_a.end), (0, 1));
        assert_eq!(board.text(), "甲乙丙DDD");
    }

    #[test]
    fn test_terminal_transitions_are_noops() {
        let mut board = IssueBoard::new("错字");
        let id = board.insert_raw(raw("错", "对", IssueCategory::Typo)).unwrap();
        assert_eq!(board.accept(id), Transition::Applied);
        assert_eq!(board.accept(id), Transition::NoOp);
        assert_eq!(board.ignore(id), Transition::NoOp);
        assert_eq!(board.unignore(id), Transition::NoOp);
        assert_eq!(board.text(), "对字");
        assert_eq!(board.accept(99), Transition::UnknownIssue);
    }

    #[test]
    fn test_ignore_and_unignore() {
        let mut board = IssueBoard::new("错字");
        let id = board.insert_raw(raw("错", "对", IssueCategory::Typo)).unwrap();
        assert_eq!(board.ignore(id), Transition::Applied);
        assert_eq!(board.accept(id), Transition::NoOp);
        assert_eq!(board.unignore(id), Transition::Applied);
        assert_eq!(board.issue(id).unwrap().state, IssueState::Pending);
        assert_eq!(board.text(), "错字");
    }

    #[test]
    fn test_fix_category_only_touches_matching_pending() {
        let mut board = IssueBoard::new("他的跑得快，你好吗。");
        let grammar = board.insert_raw(raw("的", "地", IssueCategory::Grammar)).unwrap();
        let punct = board.insert_raw(raw("。", "？", IssueCategory::Punctuation)).unwrap();
        let fixed = board.fix_category(CategoryFilter::Only(IssueCategory::Punctuation));
        assert_eq!(fixed, 1);
        assert_eq!(board.text(), "他的跑得快，你好吗？");
        assert_eq!(board.issue(grammar).unwrap().state, IssueState::Pending);
        assert_eq!(board.issue(punct).unwrap().state, IssueState::Fixed);
    }

    #[test]
    fn test_fix_all_applies_in_start_order() {
        let mut board = IssueBoard::new("abc abc abc");
        for _ in 0..3 {
            board.insert_raw(raw("abc", "xy", IssueCategory::Style)).unwrap();
        }
        assert_eq!(board.fix_category(CategoryFilter::All), 3);
        assert_eq!(board.text(), "xy xy xy");
        let expected = vec![
            (1, 0, 2, IssueState::Fixed),
            (2, 3, 5, IssueState::Fixed),
            (3, 6, 8, IssueState::Fixed),
        ];
        assert_eq!(spans(&board), expected);
    }

    #[test]
    fn test_ignore_category_leaves_text_alone() {
        let mut board = IssueBoard::new("你好，世界。再见，朋友。");
        let a = board.insert_raw(raw("，", ",", IssueCategory::Punctuation)).unwrap();
        let b = board.insert_raw(raw("世界", "地球", IssueCategory::Style)).unwrap();
        let c = board.insert_raw(raw("，", ",", IssueCategory::Punctuation)).unwrap();
        board.accept(c);
        let before = board.text().to_string();

        let n = board.ignore_category(CategoryFilter::Only(IssueCategory::Punctuation));
        assert_eq!(n, 1);
        assert_eq!(board.text(), before);
        assert_eq!(board.issue(a).unwrap().state, IssueState::Ignored);
        assert_eq!(board.issue(b).unwrap().state, IssueState::Pending);
        assert_eq!(board.issue(c).unwrap().state, IssueState::Fixed);
    }

    #[test]
    fn test_positioning_after_fix_sees_new_text() {
        let mut board = IssueBoard::new("的的");
        let a = board.insert_raw(raw("的", "地", IssueCategory::Grammar)).unwrap();
        board.accept(a);
        // first char is now 地 and claimed by the fixed issue
        let b = board.insert_raw(raw("的", "得", IssueCategory::Grammar)).unwrap();
        let issue_b = board.issue(b).unwrap();
        assert_eq!((issue_b.start, issue_b.end), (1, 2));
    }

    #[test]
    fn test_restore_resets_states_and_drops_mismatches() {
        let text = "他慌张的穿上衣服";
        let mut fixed = Issue::from_raw(4, raw("的", "地", IssueCategory::Grammar), 3, 4);
        fixed.state = IssueState::Fixed;
        let stale = Issue::from_raw(5, raw("裤子", "裙子", IssueCategory::Typo), 6, 8);
        let board = IssueBoard::restore(text, vec![stale, fixed]);
        assert_eq!(spans(&board), vec![(4, 3, 4, IssueState::Pending)]);

        let mut board = board;
        let next = board.insert_raw(raw("衣服", "外套", IssueCategory::Style)).unwrap();
        assert_eq!(next, 5);
    }

    #[test]
    fn test_replace_text_discards_issues() {
        let mut board = IssueBoard::new("错字");
        board.insert_raw(raw("错", "对", IssueCategory::Typo)).unwrap();
        board.replace_text("新的文本");
        assert!(board.is_empty());
        let id = board.insert_raw(raw("新", "旧", IssueCategory::Typo)).unwrap();
        assert_eq!(id, 2);
    }
}
