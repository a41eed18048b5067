// crates/core/src/highlight.rs
//! Split the document into plain and highlighted runs for rendering.

use proofread_types::{CategoryFilter, Issue, IssueCategory, IssueState};

use crate::document::{Document, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Highlight {
        content: &'a str,
        issue_id: u64,
        category: IssueCategory,
        state: IssueState,
        /// False when a category filter is active and this issue is outside it.
        active: bool,
    },
}

impl Segment<'_> {
    pub fn content(&self) -> &str {
        match self {
            Segment::Text(s) => s,
            Segment::Highlight { content, .. } => content,
        }
    }
}

/// Linear scan over `issues`, which must be sorted by `start` and disjoint.
/// Issues that overlap an earlier one or fall outside the text are skipped.
pub fn segments<'a>(document: &'a Document, issues: &[Issue], filter: CategoryFilter) -> Vec<Segment<'a>> {
    let mut out = Vec::with_capacity(issues.len() * 2 + 1);
    let mut cursor = 0;
    for issue in issues {
        if issue.start < cursor {
            continue;
        }
        let (Some(gap), Some(content)) = (
            document.slice(Span::new(cursor, issue.start)),
            document.slice(Span::new(issue.start, issue.end)),
        ) else {
            continue;
        };
        if !gap.is_empty() {
            out.push(Segment::Text(gap));
        }
        out.push(Segment::Highlight {
            content,
            issue_id: issue.id,
            category: issue.category,
            state: issue.state,
            active: filter.matches(issue.category),
        });
        cursor = issue.end;
    }
    if let Some(rest) = document.slice(Span::new(cursor, document.char_len())) {
        if !rest.is_empty() {
            out.push(Segment::Text(rest));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::IssueBoard;
    use pretty_assertions::assert_eq;
    use proofread_types::RawIssue;

    fn raw(original: &str, category: IssueCategory) -> RawIssue {
        RawIssue {
            original: original.into(),
            suggestion: "?".into(),
            reason: "r".into(),
            category,
        }
    }

    #[test]
    fn test_segments_cover_text_in_order() {
        let mut board = IssueBoard::new("他慌张的穿上衣服，跑了出去");
        board.insert_raw(raw("跑了", IssueCategory::Style)).unwrap();
        board.insert_raw(raw("的", IssueCategory::Grammar)).unwrap();

        let segs = segments(board.document(), board.issues(), CategoryFilter::Only(IssueCategory::Grammar));
        let contents: Vec<&str> = segs.iter().map(Segment::content).collect();
        assert_eq!(contents, vec!["他慌张", "的", "穿上衣服，", "跑了", "出去"]);
        assert_eq!(contents.concat(), board.text());

        assert!(matches!(segs[1], Segment::Highlight { issue_id: 2, active: true, .. }));
        assert!(matches!(segs[3], Segment::Highlight { issue_id: 1, active: false, .. }));
    }

    #[test]
    fn test_no_issues_is_single_text() {
        let doc = Document::new("abc");
        assert_eq!(segments(&doc, &[], CategoryFilter::All), vec![Segment::Text("abc")]);
        assert!(segments(&Document::new(""), &[], CategoryFilter::All).is_empty());
    }

    #[test]
    fn test_highlight_at_edges() {
        let mut board = IssueBoard::new("ab");
        board.insert_raw(raw("a", IssueCategory::Typo)).unwrap();
        board.insert_raw(raw("b", IssueCategory::Typo)).unwrap();
        let segs = segments(board.document(), board.issues(), CategoryFilter::All);
        assert_eq!(segs.len(), 2);
        assert!(segs.iter().all(|s| matches!(s, Segment::Highlight { .. })));
    }
}
