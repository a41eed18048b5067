//! Plain-text rendering of issues, summaries and diffs for the terminal.

use std::collections::HashMap;
use std::fmt::Write;

use proofread_core::diff::{DiffItem, DiffKind, DiffStats};
use proofread_core::highlight::{self, Segment};
use proofread_core::Document;
use proofread_types::{CategoryFilter, Issue, IssueState, SessionPhase, SessionSummary};

const PREVIEW_CHARS: usize = 24;

fn state_label(state: IssueState) -> &'static str {
    match state {
        IssueState::Pending => "pending",
        IssueState::Fixed => "fixed",
        IssueState::Ignored => "ignored",
    }
}

pub fn issue_line(issue: &Issue) -> String {
    format!(
        "#{:<3} {:<7} [{}] {:?} → {:?}  {}",
        issue.id,
        state_label(issue.state),
        issue.category,
        issue.original,
        issue.suggestion,
        issue.reason
    )
}

/// The document with every pending issue marked as `{original→suggestion}`.
pub fn annotated(document: &Document, issues: &[Issue]) -> String {
    let suggestions: HashMap<u64, &str> = issues.iter().map(|i| (i.id, i.suggestion.as_str())).collect();
    let mut out = String::with_capacity(document.as_str().len());
    for segment in highlight::segments(document, issues, CategoryFilter::All) {
        match segment {
            Segment::Highlight {
                content,
                issue_id,
                state: IssueState::Pending,
                ..
            } => {
                let suggestion = suggestions.get(&issue_id).copied().unwrap_or_default();
                let _ = write!(out, "{{{content}→{suggestion}}}");
            }
            other => out.push_str(other.content()),
        }
    }
    out
}

pub fn summary_line(summary: &SessionSummary) -> String {
    let phase = match summary.phase {
        SessionPhase::Idle => "idle",
        SessionPhase::Streaming => "streaming",
        SessionPhase::Complete => "complete",
        SessionPhase::Aborted => "aborted",
        SessionPhase::Errored => "errored",
    };
    let counts = &summary.counts;
    let mut line = format!(
        "{phase}: {} issue(s) (错别字 {}, 语法错误 {}, 标点符号 {}, 表达优化 {}); {} fixed, {} ignored, {} unresolved",
        counts.total(),
        counts.typo,
        counts.grammar,
        counts.punctuation,
        counts.style,
        summary.fixed,
        summary.ignored,
        summary.unresolved,
    );
    if summary.dropped > 0 {
        let _ = write!(line, ", {} not located", summary.dropped);
    }
    if let Some(total_ms) = summary.total_ms {
        let _ = write!(line, " in {:.1}s", total_ms as f64 / 1000.0);
    }
    line
}

/// First few characters of `text` on one line.
pub fn preview(text: &str) -> String {
    let flat: String = text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }).collect();
    let mut chars = flat.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// wdiff-style markup: `[-deleted-]{+inserted+}`.
pub fn diff_markup(items: &[DiffItem]) -> String {
    let mut out = String::new();
    for item in items {
        match item.kind {
            DiffKind::Equal => out.push_str(&item.content),
            DiffKind::Delete => {
                let _ = write!(out, "[-{}-]", item.content);
            }
            DiffKind::Insert => {
                let _ = write!(out, "{{+{}+}}", item.content);
            }
        }
    }
    out
}

pub fn diff_stats_line(stats: &DiffStats) -> String {
    format!(
        "{} change(s): +{} -{} ={} chars",
        stats.changes, stats.inserted_chars, stats.deleted_chars, stats.unchanged_chars
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proofread_core::diff;
    use proofread_types::{IssueCategory, RawIssue};

    fn issue(id: u64, original: &str, suggestion: &str, start: usize, state: IssueState) -> Issue {
        let raw = RawIssue {
            original: original.into(),
            suggestion: suggestion.into(),
            reason: "r".into(),
            category: IssueCategory::Typo,
        };
        let mut issue = Issue::from_raw(id, raw, start, start + original.chars().count());
        issue.state = state;
        issue
    }

    #[test]
    fn test_annotated_marks_pending_only() {
        let doc = Document::new("的确需要先登陆账号");
        let issues = vec![
            issue(1, "的确", "确实", 0, IssueState::Ignored),
            issue(2, "登陆", "登录", 5, IssueState::Pending),
        ];
        assert_eq!(annotated(&doc, &issues), "的确需要先{登陆→登录}账号");
    }

    #[test]
    fn test_preview_truncates_and_flattens() {
        assert_eq!(preview("短\n文本"), "短 文本");
        let long = "字".repeat(30);
        assert_eq!(preview(&long), format!("{}…", "字".repeat(24)));
    }

    #[test]
    fn test_diff_markup() {
        let items = diff::diff("先登陆账号", "先登录账号");
        assert_eq!(diff_markup(&items), "先登[-陆-]{+录+}账号");
        assert_eq!(diff_stats_line(&diff::stats(&items)), "2 change(s): +1 -1 =4 chars");
    }
}
