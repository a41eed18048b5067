// crates/core/src/thesaurus.rs
//! User-managed correction groups.
//!
//! Groups are independent of any check. The corrections of enabled groups
//! are merged into the system prompt (see [`crate::prompt`]).

use std::collections::HashSet;

use proofread_types::{Correction, ThesaurusGroup};

use crate::error::{StoreError, ThesaurusError};
use crate::store::{self, KeyValueStore, THESAURUS_KEY};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thesaurus {
    groups: Vec<ThesaurusGroup>,
}

fn normalize(correction: Correction) -> Result<Correction, ThesaurusError> {
    let original = correction.original.trim();
    let suggestion = correction.suggestion.trim();
    if original.is_empty() || suggestion.is_empty() {
        return Err(ThesaurusError::EmptyCorrection);
    }
    Ok(Correction::new(original, suggestion))
}

impl Thesaurus {
    pub fn new(groups: Vec<ThesaurusGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[ThesaurusGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&ThesaurusGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn group_mut(&mut self, id: &str) -> Result<&mut ThesaurusGroup, ThesaurusError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| ThesaurusError::GroupNotFound(id.to_string()))
    }

    /// Create an enabled, empty group and return its id.
    pub fn add_group(&mut self, name: &str) -> Result<String, ThesaurusError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ThesaurusError::EmptyName);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.groups.push(ThesaurusGroup {
            id: id.clone(),
            name: name.to_string(),
            enabled: true,
            corrections: Vec::new(),
        });
        Ok(id)
    }

    pub fn delete_group(&mut self, id: &str) -> Result<ThesaurusGroup, ThesaurusError> {
        let idx = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| ThesaurusError::GroupNotFound(id.to_string()))?;
        Ok(self.groups.remove(idx))
    }

    /// Flip a group's `enabled` flag and return the new value.
    pub fn toggle_group(&mut self, id: &str) -> Result<bool, ThesaurusError> {
        let group = self.group_mut(id)?;
        group.enabled = !group.enabled;
        Ok(group.enabled)
    }

    pub fn add_correction(&mut self, group_id: &str, correction: Correction) -> Result<(), ThesaurusError> {
        let correction = normalize(correction)?;
        let group = self.group_mut(group_id)?;
        if group.corrections.iter().any(|c| c.original == correction.original) {
            return Err(ThesaurusError::DuplicateCorrection {
                original: correction.original,
            });
        }
        group.corrections.push(correction);
        Ok(())
    }

    pub fn delete_correction(&mut self, group_id: &str, original: &str) -> Result<Correction, ThesaurusError> {
        let group = self.group_mut(group_id)?;
        let idx = group
            .corrections
            .iter()
            .position(|c| c.original == original)
            .ok_or_else(|| ThesaurusError::CorrectionNotFound {
                original: original.to_string(),
            })?;
        Ok(group.corrections.remove(idx))
    }

    /// Replace the correction keyed by `original` in place, keeping its
    /// position. Renaming onto another existing original is rejected.
    pub fn edit_correction(
        &mut self,
        group_id: &str,
        original: &str,
        correction: Correction,
    ) -> Result<(), ThesaurusError> {
        let correction = normalize(correction)?;
        let group = self.group_mut(group_id)?;
        let idx = group
            .corrections
            .iter()
            .position(|c| c.original == original)
            .ok_or_else(|| ThesaurusError::CorrectionNotFound {
                original: original.to_string(),
            })?;
        let clashes = group
            .corrections
            .iter()
            .enumerate()
            .any(|(i, c)| i != idx && c.original == correction.original);
        if clashes {
            return Err(ThesaurusError::DuplicateCorrection {
                original: correction.original,
            });
        }
        group.corrections[idx] = correction;
        Ok(())
    }

    /// Corrections of every enabled group, in group order. When several
    /// groups define the same original, the first one wins.
    pub fn enabled_corrections(&self) -> Vec<&Correction> {
        let mut seen = HashSet::new();
        self.groups
            .iter()
            .filter(|g| g.enabled)
            .flat_map(|g| g.corrections.iter())
            .filter(|c| seen.insert(c.original.as_str()))
            .collect()
    }

    pub async fn load(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        let groups: Option<Vec<ThesaurusGroup>> = store::load(store, THESAURUS_KEY).await?;
        Ok(Self::new(groups.unwrap_or_default()))
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store::save(store, THESAURUS_KEY, &self.groups).await
    }
}
