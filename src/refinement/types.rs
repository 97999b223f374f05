//! Data model for refinement sessions.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::analyzer::{AnalysisResult, SearchType, SuggestionId};

/// Character identifiers vetoed from future searches.
///
/// Iteration order is insertion order, so ids appear in the order their
/// exclude rounds happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ids: IndexSet<SuggestionId>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &SuggestionId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SuggestionId> {
        self.ids.iter()
    }

    pub fn to_vec(&self) -> Vec<SuggestionId> {
        self.ids.iter().cloned().collect()
    }

    /// This set followed by any of `extra` not already in it, without mutating.
    pub fn union_with(&self, extra: &[SuggestionId]) -> Vec<SuggestionId> {
        let mut merged = self.ids.clone();
        merged.extend(extra.iter().cloned());
        merged.into_iter().collect()
    }

    /// Insert `ids`, returning the ones that were not present before.
    pub fn extend_from<I>(&mut self, ids: I) -> Vec<SuggestionId>
    where
        I: IntoIterator<Item = SuggestionId>,
    {
        ids.into_iter()
            .filter(|id| self.ids.insert(id.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl FromIterator<SuggestionId> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = SuggestionId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// One completed refinement round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementRound {
    pub search_type: SearchType,
    pub result: AnalysisResult,
    /// Ids this round added to the exclusion set. Empty unless this was a
    /// successful exclude round.
    pub excluded_added: Vec<SuggestionId>,
}

/// What `rollback_to_step` does with the exclusion set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackMode {
    /// Keep every exclusion accumulated so far, including those from
    /// rounds that the rollback discards.
    #[default]
    Retain,
    /// Rebuild the exclusion set from the rounds that remain.
    Recompute,
}
