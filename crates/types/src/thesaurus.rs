// crates/types/src/thesaurus.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One user-defined `original → suggestion` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct Correction {
    pub original: String,
    pub suggestion: String,
}

impl Correction {
    pub fn new(original: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// A named, toggleable set of corrections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct ThesaurusGroup {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub corrections: Vec<Correction>,
}
