// crates/types/src/issue.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Issue taxonomy. Serialized with the Chinese labels the model is prompted
/// with; English names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub enum IssueCategory {
    #[serde(rename = "错别字", alias = "typo", alias = "Typo")]
    Typo,
    #[serde(rename = "语法错误", alias = "grammar", alias = "Grammar")]
    Grammar,
    #[serde(rename = "标点符号", alias = "punctuation", alias = "Punctuation")]
    Punctuation,
    #[serde(rename = "表达优化", alias = "style", alias = "Style")]
    Style,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::Typo,
        IssueCategory::Grammar,
        IssueCategory::Punctuation,
        IssueCategory::Style,
    ];

    /// Display label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            IssueCategory::Typo => "错别字",
            IssueCategory::Grammar => "语法错误",
            IssueCategory::Punctuation => "标点符号",
            IssueCategory::Style => "表达优化",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown issue category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for IssueCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "错别字" | "typo" | "Typo" => Ok(IssueCategory::Typo),
            "语法错误" | "grammar" | "Grammar" => Ok(IssueCategory::Grammar),
            "标点符号" | "punctuation" | "Punctuation" => Ok(IssueCategory::Punctuation),
            "表达优化" | "style" | "Style" => Ok(IssueCategory::Style),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Scope of a bulk operation: every category, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    All,
    Only(IssueCategory),
}

impl CategoryFilter {
    pub fn matches(self, category: IssueCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }
}

impl From<IssueCategory> for CategoryFilter {
    fn from(category: IssueCategory) -> Self {
        CategoryFilter::Only(category)
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "全部" => Ok(CategoryFilter::All),
            other => other.parse().map(CategoryFilter::Only),
        }
    }
}

/// Per-issue lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Pending,
    Fixed,
    Ignored,
}

impl IssueState {
    /// Fixed is the only state no transition leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, IssueState::Fixed)
    }
}

/// An issue as described by the model, before it is matched to a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct RawIssue {
    pub original: String,
    pub suggestion: String,
    pub reason: String,
    pub category: IssueCategory,
}

/// A positioned issue. `start`/`end` are character (Unicode scalar) offsets
/// forming the half-open span `[start, end)` in the live document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: u64,
    pub original: String,
    pub suggestion: String,
    pub reason: String,
    pub category: IssueCategory,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub state: IssueState,
}

impl Issue {
    pub fn from_raw(id: u64, raw: RawIssue, start: usize, end: usize) -> Self {
        Self {
            id,
            original: raw.original,
            suggestion: raw.suggestion,
            reason: raw.reason,
            category: raw.category,
            start,
            end,
            state: IssueState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == IssueState::Pending
    }

    pub fn is_fixed(&self) -> bool {
        self.state == IssueState::Fixed
    }

    pub fn is_ignored(&self) -> bool {
        self.state == IssueState::Ignored
    }

    /// Length of the span in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
