// crates/core/src/diff.rs
//! Character-level comparison of two texts.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffItem {
    pub kind: DiffKind,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub inserted_chars: usize,
    pub deleted_chars: usize,
    pub unchanged_chars: usize,
    /// Number of non-equal runs.
    pub changes: usize,
}

/// Diff `old` against `new`. Adjacent items of the same kind are merged.
pub fn diff(old: &str, new: &str) -> Vec<DiffItem> {
    let text_diff = TextDiff::from_chars(old, new);
    let mut items: Vec<DiffItem> = Vec::new();
    for change in text_diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => DiffKind::Equal,
            ChangeTag::Insert => DiffKind::Insert,
            ChangeTag::Delete => DiffKind::Delete,
        };
        match items.last_mut() {
            Some(last) if last.kind == kind => last.content.push_str(change.value()),
            _ => items.push(DiffItem {
                kind,
                content: change.value().to_string(),
            }),
        }
    }
    items
}

pub fn stats(items: &[DiffItem]) -> DiffStats {
    items.iter().fold(DiffStats::default(), |mut s, item| {
        let n = item.content.chars().count();
        match item.kind {
            DiffKind::Equal => s.unchanged_chars += n,
            DiffKind::Insert => {
                s.inserted_chars += n;
                s.changes += 1;
            }
            DiffKind::Delete => {
                s.deleted_chars += n;
                s.changes += 1;
            }
        }
        s
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

/// Rebuild one side of the diff: `old` drops inserts, `new` drops deletes.
pub fn reconstruct(items: &[DiffItem], side: Side) -> String {
    let skip = match side {
        Side::Old => DiffKind::Insert,
        Side::New => DiffKind::Delete,
    };
    items
        .iter()
        .filter(|i| i.kind != skip)
        .map(|i| i.content.as_str())
        .collect()
}
