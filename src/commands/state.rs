use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::analyzer::{
    AnalysisResult, HttpRecognitionClient, ImageOptions, RecognitionClient, SearchType,
    SuggestionId,
};
use crate::config::GuesserConfig;
use crate::error::GuesserError;
use crate::refinement::{EngineOptions, RefinementEngine, SessionId};

/// Shared state behind every command.
///
/// The engine lock is only held for synchronous engine calls, never across
/// a network await.
pub struct AppState {
    engine: Mutex<RefinementEngine>,
    client: Arc<dyn RecognitionClient>,
    image_options: ImageOptions,
}

impl AppState {
    pub fn new(
        client: Arc<dyn RecognitionClient>,
        options: EngineOptions,
        image_options: ImageOptions,
    ) -> Self {
        Self {
            engine: Mutex::new(RefinementEngine::new(options)),
            client,
            image_options,
        }
    }

    /// Wire up the HTTP client and engine from configuration.
    pub fn from_config(config: &GuesserConfig) -> Result<Self, GuesserError> {
        let client = HttpRecognitionClient::new(&config.service)?;
        let options = EngineOptions {
            rollback_mode: config.refinement.rollback_mode,
            single_flight: config.refinement.single_flight,
        };
        Ok(Self::new(Arc::new(client), options, config.image_options()))
    }

    pub(crate) fn engine(&self) -> MutexGuard<'_, RefinementEngine> {
        // Engine methods do not panic midway through a mutation.
        self.engine.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn client(&self) -> &dyn RecognitionClient {
        self.client.as_ref()
    }

    pub fn image_options(&self) -> ImageOptions {
        self.image_options
    }

    /// Read-only view of the engine for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.engine())
    }
}

/// Everything the presentation layer needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub step_number: usize,
    pub current: Option<AnalysisResult>,
    pub excluded_ids: Vec<SuggestionId>,
    pub steps: Vec<StepLabel>,
    pub busy: bool,
}

/// One entry of the step navigator: the original plus one per round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepLabel {
    pub label: String,
    /// `None` for the original analysis.
    pub search_type: Option<SearchType>,
    pub success: bool,
    pub active: bool,
}

impl SessionSnapshot {
    pub fn capture(engine: &RefinementEngine) -> Self {
        let busy = engine.is_busy();
        let Some(session) = engine.session() else {
            return Self {
                session_id: None,
                step_number: 0,
                current: None,
                excluded_ids: Vec::new(),
                steps: Vec::new(),
                busy,
            };
        };

        let step_number = session.step_number();
        let mut steps = vec![StepLabel {
            label: "Original".to_string(),
            search_type: None,
            success: session.original().success,
            active: step_number == 0,
        }];
        steps.extend(session.history().iter().enumerate().map(|(index, round)| StepLabel {
            label: format!("Step {}", index + 1),
            search_type: Some(round.search_type),
            success: round.result.success,
            active: step_number == index + 1,
        }));

        Self {
            session_id: Some(session.id()),
            step_number,
            current: Some(session.current_result().clone()),
            excluded_ids: session.excluded().to_vec(),
            steps,
            busy,
        }
    }
}
