//! Commands for submitting an image.
//!
//! `analyze_image`:
//! 1. Reads and encodes the picked file (off the async runtime)
//! 2. Discards any previous session
//! 3. Calls `/api/analyze` and starts a session from the response

use std::path::PathBuf;

use tracing::{info, warn};

use crate::analyzer::{prepare_image_file, AnalysisResult, IMAGE_FAILURE_MESSAGE};
use crate::refinement::Applied;

use super::AppState;

/// Analyze the image at `path` and make it the active session.
///
/// Service and transport failures come back as a failed `AnalysisResult`.
/// `Err` means the file itself could not be used, or a newer submission
/// replaced this one while it was running.
pub async fn analyze_image(state: &AppState, path: PathBuf) -> Result<AnalysisResult, String> {
    info!("Starting analysis of {:?}", path);

    let options = state.image_options();
    let image = tokio::task::spawn_blocking(move || prepare_image_file(&path, &options))
        .await
        .map_err(|e| format!("Image task panicked: {}", e))?
        .map_err(|e| {
            warn!("Image preparation failed: {}", e);
            format!("{} {}", IMAGE_FAILURE_MESSAGE, e)
        })?;

    let ticket = state.engine().begin_analysis(image);
    let outcome = state.client().analyze(ticket.request()).await;

    match state.engine().complete_analysis(ticket, outcome) {
        Applied::Current(result) => {
            info!(
                "Analysis complete: success={}, best match={:?}, {} suggestions",
                result.success,
                result.character.as_ref().map(|c| c.name.as_str()),
                result.suggestion_ids().len()
            );
            Ok(result)
        }
        Applied::Stale(_) => Err("Analysis was replaced by a newer image".to_string()),
    }
}

/// Forget the current image and all of its rounds.
pub fn start_over(state: &AppState) {
    state.engine().start_over();
}
