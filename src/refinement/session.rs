//! State owned by one uploaded image.

use tracing::{debug, info};

use crate::analyzer::{AnalysisResult, ImageData, ReExamineRequest, SearchType, SuggestionId};
use crate::error::GuesserError;

use super::types::{ExclusionSet, RefinementRound, RollbackMode};

/// Identifies a session for the lifetime of the process.
pub type SessionId = u64;

/// The original result plus every refinement round performed on it.
///
/// All operations here are synchronous and never touch the network;
/// `RefinementEngine` sequences them around the service calls.
#[derive(Debug, Clone)]
pub struct RefinementSession {
    id: SessionId,
    image: ImageData,
    original: AnalysisResult,
    history: Vec<RefinementRound>,
    excluded: ExclusionSet,
}

impl RefinementSession {
    pub fn new(id: SessionId, image: ImageData, original: AnalysisResult) -> Self {
        Self {
            id,
            image,
            original,
            history: Vec::new(),
            excluded: ExclusionSet::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn image(&self) -> &ImageData {
        &self.image
    }

    pub fn original(&self) -> &AnalysisResult {
        &self.original
    }

    pub fn history(&self) -> &[RefinementRound] {
        &self.history
    }

    pub fn excluded(&self) -> &ExclusionSet {
        &self.excluded
    }

    /// The last round's result, or the original when no rounds exist.
    pub fn current_result(&self) -> &AnalysisResult {
        self.history
            .last()
            .map(|round| &round.result)
            .unwrap_or(&self.original)
    }

    /// Number of completed rounds; 0 means the original is shown.
    pub fn step_number(&self) -> usize {
        self.history.len()
    }

    /// Build the `/api/re-examine` payload from the current state.
    ///
    /// Exclude folds the current suggestions into `exclude_ids`. Focus sends
    /// them as `focus_ids` and leaves `exclude_ids` as accumulated.
    pub fn build_request(&self, search_type: SearchType) -> ReExamineRequest {
        let current_ids = self.current_result().suggestion_ids();
        let (exclude_ids, focus_ids) = match search_type {
            SearchType::Exclude => (self.excluded.union_with(&current_ids), Vec::new()),
            SearchType::Focus => (self.excluded.to_vec(), current_ids),
        };

        debug!(
            "Built {} request for session {}: exclude_ids={:?}, focus_ids={:?}",
            search_type, self.id, exclude_ids, focus_ids
        );

        ReExamineRequest {
            image_data: self.image.clone(),
            search_type,
            exclude_ids,
            focus_ids,
        }
    }

    /// Append a completed round.
    ///
    /// `pre_round_ids` are the suggestion ids of the result that was current
    /// when the request was built. They join the exclusion set only when this
    /// is an exclude round and the service reported success.
    pub fn record_round(
        &mut self,
        search_type: SearchType,
        pre_round_ids: Vec<SuggestionId>,
        result: AnalysisResult,
    ) -> &AnalysisResult {
        let excluded_added = if search_type == SearchType::Exclude && result.success {
            self.excluded.extend_from(pre_round_ids)
        } else {
            Vec::new()
        };

        info!(
            "Session {} step {}: {} round, success={}, {} newly excluded ({} total)",
            self.id,
            self.history.len() + 1,
            search_type,
            result.success,
            excluded_added.len(),
            self.excluded.len()
        );

        self.history.push(RefinementRound {
            search_type,
            result,
            excluded_added,
        });
        self.current_result()
    }

    /// Drop every round and every exclusion.
    pub fn rollback_to_original(&mut self) {
        info!(
            "Session {}: back to original (dropping {} rounds, {} exclusions)",
            self.id,
            self.history.len(),
            self.excluded.len()
        );
        self.history.clear();
        self.excluded.clear();
    }

    /// Keep rounds `0..=index` and drop the rest.
    ///
    /// With `RollbackMode::Retain` the exclusion set is left as is, so ids
    /// vetoed by dropped rounds stay vetoed. `RollbackMode::Recompute`
    /// rebuilds it from the remaining rounds.
    pub fn rollback_to_step(&mut self, index: usize, mode: RollbackMode) -> Result<(), GuesserError> {
        let len = self.history.len();
        if index >= len {
            return Err(GuesserError::StepOutOfRange { index, len });
        }

        self.history.truncate(index + 1);
        if mode == RollbackMode::Recompute {
            self.excluded = self
                .history
                .iter()
                .flat_map(|round| round.excluded_added.iter().cloned())
                .collect();
        }

        info!(
            "Session {}: back to step {} ({:?} mode, {} exclusions)",
            self.id,
            index + 1,
            mode,
            self.excluded.len()
        );
        Ok(())
    }
}
