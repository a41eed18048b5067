// crates/types/src/history.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::issue::Issue;

/// A finished proofreading session.
///
/// `text` is the baseline text every issue span refers to: the document with
/// all accepted fixes reverted. Issue states are kept as a snapshot for
/// display and reset to pending when the entry is restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct HistoryEntry {
    pub text: String,
    pub issues: Vec<Issue>,
    /// RFC 3339 completion time. Also the entry's identity in the history list.
    pub timestamp: String,
}
