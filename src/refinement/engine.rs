//! Sequencing of refinement rounds around the recognition service.
//!
//! Every network call is split into `begin_*` (build the payload, issue a
//! ticket) and `complete_*` (apply the response). No borrow of the engine is
//! held while the request is in flight, so callers sharing the engine behind
//! a lock can release it during the await.
//!
//! Each ticket carries the generation it was issued under. Submitting a new
//! image, starting over, and both rollbacks advance the generation; a
//! response for an older generation is discarded without touching state.

use tracing::{info, warn};

use crate::analyzer::{
    AnalysisResult, AnalyzeRequest, ImageData, ReExamineRequest, RecognitionClient, SearchType,
    SuggestionId, ANALYZE_FAILURE_MESSAGE, RE_EXAMINE_FAILURE_MESSAGE,
};
use crate::error::GuesserError;

use super::session::{RefinementSession, SessionId};
use super::types::{ExclusionSet, RollbackMode};

/// Engine behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub rollback_mode: RollbackMode,
    /// Reject a second refinement while one is outstanding.
    pub single_flight: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            rollback_mode: RollbackMode::Retain,
            single_flight: true,
        }
    }
}

/// Whether a completed response was applied to the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied<T> {
    /// Applied; this is what the user should now see.
    Current(T),
    /// Issued against a session or state that has since been replaced.
    Stale(T),
}

impl<T> Applied<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Applied::Stale(_))
    }

    /// The value if it was applied.
    pub fn current(self) -> Option<T> {
        match self {
            Applied::Current(value) => Some(value),
            Applied::Stale(_) => None,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Applied::Current(value) | Applied::Stale(value) => value,
        }
    }
}

/// An `/api/analyze` call waiting for its response.
#[derive(Debug)]
pub struct AnalysisTicket {
    generation: u64,
    request: AnalyzeRequest,
}

impl AnalysisTicket {
    pub fn request(&self) -> &AnalyzeRequest {
        &self.request
    }
}

/// An `/api/re-examine` call waiting for its response.
#[derive(Debug)]
pub struct RefinementTicket {
    generation: u64,
    session_id: SessionId,
    search_type: SearchType,
    pre_round_ids: Vec<SuggestionId>,
    request: ReExamineRequest,
}

impl RefinementTicket {
    pub fn request(&self) -> &ReExamineRequest {
        &self.request
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}

/// Owns the active session and applies service responses to it.
#[derive(Debug)]
pub struct RefinementEngine {
    options: EngineOptions,
    session: Option<RefinementSession>,
    generation: u64,
    next_session_id: SessionId,
    analysis_pending: bool,
    rounds_in_flight: usize,
}

impl Default for RefinementEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl RefinementEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            session: None,
            generation: 0,
            next_session_id: 1,
            analysis_pending: false,
            rounds_in_flight: 0,
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn session(&self) -> Option<&RefinementSession> {
        self.session.as_ref()
    }

    /// The result the presentation layer should show, if any.
    pub fn current_result(&self) -> Option<&AnalysisResult> {
        self.session.as_ref().map(RefinementSession::current_result)
    }

    pub fn step_number(&self) -> usize {
        self.session.as_ref().map_or(0, RefinementSession::step_number)
    }

    pub fn excluded(&self) -> Option<&ExclusionSet> {
        self.session.as_ref().map(RefinementSession::excluded)
    }

    /// True while an analysis or refinement for the current state is outstanding.
    pub fn is_busy(&self) -> bool {
        self.analysis_pending || self.rounds_in_flight > 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate every outstanding ticket.
    fn advance_generation(&mut self) {
        self.generation += 1;
        self.analysis_pending = false;
        self.rounds_in_flight = 0;
    }

    /// Discard the current session and prepare to analyze `image`.
    pub fn begin_analysis(&mut self, image: ImageData) -> AnalysisTicket {
        self.advance_generation();
        self.session = None;
        self.analysis_pending = true;
        info!("Submitting new image (generation {})", self.generation);

        AnalysisTicket {
            generation: self.generation,
            request: AnalyzeRequest { image_data: image },
        }
    }

    /// Start a new session from the analysis response.
    ///
    /// A transport failure becomes a failed result with the generic
    /// analyze message; the session is created either way.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<AnalysisResult, GuesserError>,
    ) -> Applied<AnalysisResult> {
        let result = outcome.unwrap_or_else(|e| {
            warn!("Analysis failed: {}", e);
            AnalysisResult::failure(ANALYZE_FAILURE_MESSAGE)
        });

        if ticket.generation != self.generation {
            warn!(
                "Discarding stale analysis (generation {}, current {})",
                ticket.generation, self.generation
            );
            return Applied::Stale(result);
        }

        let id = self.next_session_id;
        self.next_session_id += 1;
        self.analysis_pending = false;
        self.session = Some(RefinementSession::new(
            id,
            ticket.request.image_data,
            result.clone(),
        ));
        info!("Session {} started (success={})", id, result.success);
        Applied::Current(result)
    }

    /// Build the payload for the next round from the current result.
    ///
    /// # Errors
    /// - `NoSession` when no analysis has completed
    /// - `Busy` when single-flight is on and a round is outstanding
    pub fn begin_refinement(
        &mut self,
        search_type: SearchType,
    ) -> Result<RefinementTicket, GuesserError> {
        let session = self.session.as_ref().ok_or(GuesserError::NoSession)?;
        if self.options.single_flight && self.rounds_in_flight > 0 {
            return Err(GuesserError::Busy);
        }

        let request = session.build_request(search_type);
        let ticket = RefinementTicket {
            generation: self.generation,
            session_id: session.id(),
            search_type,
            pre_round_ids: session.current_result().suggestion_ids(),
            request,
        };
        self.rounds_in_flight += 1;
        Ok(ticket)
    }

    /// Append the round's response to the history.
    ///
    /// Transport failures are recorded as failed rounds carrying the
    /// generic re-examine message.
    pub fn complete_refinement(
        &mut self,
        ticket: RefinementTicket,
        outcome: Result<AnalysisResult, GuesserError>,
    ) -> Applied<AnalysisResult> {
        let result = outcome.unwrap_or_else(|e| {
            warn!("Re-examination failed: {}", e);
            AnalysisResult::failure(RE_EXAMINE_FAILURE_MESSAGE)
        });

        let session = match self.session.as_mut() {
            Some(session)
                if ticket.generation == self.generation && session.id() == ticket.session_id =>
            {
                session
            }
            _ => {
                warn!(
                    "Discarding stale {} round for session {} (generation {}, current {})",
                    ticket.search_type, ticket.session_id, ticket.generation, self.generation
                );
                return Applied::Stale(result);
            }
        };

        self.rounds_in_flight = self.rounds_in_flight.saturating_sub(1);
        let applied = session
            .record_round(ticket.search_type, ticket.pre_round_ids, result)
            .clone();
        Applied::Current(applied)
    }

    /// Analyze `image` and start a session from the response.
    pub async fn submit_original(
        &mut self,
        client: &dyn RecognitionClient,
        image: ImageData,
    ) -> AnalysisResult {
        let ticket = self.begin_analysis(image);
        let outcome = client.analyze(ticket.request()).await;
        self.complete_analysis(ticket, outcome).into_inner()
    }

    /// Run one refinement round end to end.
    ///
    /// Only `NoSession` and `Busy` are returned as errors; service and
    /// transport failures come back as a failed `AnalysisResult`.
    pub async fn request_refinement(
        &mut self,
        client: &dyn RecognitionClient,
        search_type: SearchType,
    ) -> Result<AnalysisResult, GuesserError> {
        let ticket = self.begin_refinement(search_type)?;
        let outcome = client.re_examine(ticket.request()).await;
        Ok(self.complete_refinement(ticket, outcome).into_inner())
    }

    /// Clear all rounds and exclusions.
    pub fn rollback_to_original(&mut self) -> Result<(), GuesserError> {
        let session = self.session.as_mut().ok_or(GuesserError::NoSession)?;
        session.rollback_to_original();
        self.advance_generation();
        Ok(())
    }

    /// Keep rounds `0..=index`. See `RollbackMode` for the exclusion set.
    pub fn rollback_to_step(&mut self, index: usize) -> Result<(), GuesserError> {
        let mode = self.options.rollback_mode;
        let session = self.session.as_mut().ok_or(GuesserError::NoSession)?;
        session.rollback_to_step(index, mode)?;
        self.advance_generation();
        Ok(())
    }

    /// Drop the session entirely, e.g. before picking another image.
    pub fn start_over(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Discarding session {}", session.id());
        }
        self.advance_generation();
    }
}
