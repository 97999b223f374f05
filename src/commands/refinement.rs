//! Commands for refining the active session.

use tracing::info;

use crate::analyzer::{AnalysisResult, SearchType};
use crate::error::GuesserError;
use crate::refinement::Applied;

use super::AppState;

/// Run one focus or exclude round against the current result.
///
/// A second call while one is outstanding is rejected when single-flight
/// is enabled. Focus is rejected when the current result has no
/// candidates; exclude is still allowed and reruns the search with the
/// accumulated exclusions.
pub async fn refine(state: &AppState, search_type: SearchType) -> Result<AnalysisResult, String> {
    let ticket = {
        let mut engine = state.engine();
        let no_candidates = engine
            .current_result()
            .is_some_and(|current| !current.has_suggestions());
        if search_type == SearchType::Focus && no_candidates {
            return Err(GuesserError::NothingToFocus.into());
        }
        engine.begin_refinement(search_type)?
    };
    info!(
        "Re-examining ({}) for session {}",
        search_type,
        ticket.session_id()
    );

    let outcome = state.client().re_examine(ticket.request()).await;

    match state.engine().complete_refinement(ticket, outcome) {
        Applied::Current(result) => Ok(result),
        Applied::Stale(_) => Err(
            "Re-examination discarded: the session changed while it was running".to_string(),
        ),
    }
}

/// Show the original result again and forget every exclusion.
pub fn rollback_to_original(state: &AppState) -> Result<(), String> {
    state.engine().rollback_to_original()?;
    Ok(())
}

/// Return to round `index` (0-based), dropping later rounds.
pub fn rollback_to_step(state: &AppState, index: usize) -> Result<(), String> {
    state.engine().rollback_to_step(index)?;
    Ok(())
}
