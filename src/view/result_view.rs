//! Plain-text rendering of the active result.
//!
//! Shows the best match, other possibilities, the refinement prompt, and
//! the vision diagnostics in a terminal-friendly layout.

use crate::analyzer::{confidence_percent, AnalysisResult, ResultKind, VisionData};
use crate::commands::SessionSnapshot;

/// How many suggestions are listed under "Other Possibilities".
pub const MAX_SUGGESTIONS_SHOWN: usize = 3;

/// Render the snapshot's current result with its header.
pub fn render_result(snapshot: &SessionSnapshot) -> String {
    let Some(current) = snapshot.current.as_ref() else {
        return "No image analyzed yet. Use `open <path>` to pick one.".to_string();
    };

    let mut lines = Vec::new();
    if snapshot.step_number > 0 {
        lines.push(format!(
            "== Re-examination Results (Step {}) ==",
            snapshot.step_number
        ));
        if !snapshot.excluded_ids.is_empty() {
            lines.push(format!(
                "{} characters excluded from search",
                snapshot.excluded_ids.len()
            ));
        }
    } else {
        lines.push("== Analysis Results ==".to_string());
    }
    lines.push(String::new());

    match current.kind() {
        ResultKind::Failed => {
            lines.push("Analysis Failed".to_string());
            lines.push(format!("  {}", current.error_message()));
            push_retry_hint(snapshot, &mut lines);
        }
        ResultKind::NoMatch => {
            lines.push("No Matches Found".to_string());
            lines.push(
                "  We couldn't identify this character. Try a clearer image or a more popular character."
                    .to_string(),
            );
            push_retry_hint(snapshot, &mut lines);
        }
        ResultKind::Match => render_match(current, snapshot, &mut lines),
    }

    if let Some(vision) = current.vision_data.as_ref() {
        lines.push(String::new());
        lines.extend(render_vision(vision));
    }

    lines.join("\n")
}

fn render_match(current: &AnalysisResult, snapshot: &SessionSnapshot, lines: &mut Vec<String>) {
    if let Some(character) = current.character.as_ref() {
        lines.push("Best Match".to_string());
        lines.push(format!("  {}", character.name));
        lines.push(format!("  from {}", character.anime));
        if !character.description.is_empty() {
            lines.push(format!("  {}", character.description));
        }
        lines.push(format!(
            "  Confidence: {}%",
            confidence_percent(character.confidence)
        ));
    }

    let suggestions = current.suggestions.as_deref().unwrap_or_default();
    if !suggestions.is_empty() {
        lines.push(String::new());
        lines.push("Other Possibilities".to_string());
        for suggestion in suggestions.iter().take(MAX_SUGGESTIONS_SHOWN) {
            lines.push(format!(
                "  {:<28} {:<24} {:>3}%",
                suggestion.name,
                suggestion.anime,
                confidence_percent(suggestion.confidence)
            ));
        }

        lines.push(String::new());
        if snapshot.step_number == 0 {
            lines.push("Not satisfied? Help find better matches:".to_string());
        } else {
            lines.push("Still not satisfied? Continue refining the results:".to_string());
        }
        lines.push("  focus    Yes, it's one of these".to_string());
        lines.push("  exclude  No, try different characters".to_string());
    }
}

/// Without candidates only `exclude` is useful: it reruns the search with
/// the accumulated exclusions. `focus` has nothing to narrow to.
fn push_retry_hint(snapshot: &SessionSnapshot, lines: &mut Vec<String>) {
    lines.push(String::new());
    if snapshot.excluded_ids.is_empty() {
        lines.push("  exclude  Search again".to_string());
    } else {
        lines.push(format!(
            "  exclude  Search again, still skipping {} excluded characters",
            snapshot.excluded_ids.len()
        ));
    }
    if snapshot.step_number > 0 {
        lines.push("  back <n> Return to an earlier step".to_string());
    }
}

fn render_vision(vision: &VisionData) -> Vec<String> {
    let mut lines = vec!["Debug Information".to_string()];
    if !vision.labels.is_empty() {
        lines.push(format!("  Detected Labels: {}", vision.labels.join(", ")));
    }
    if !vision.texts.is_empty() {
        lines.push(format!("  Detected Text: {}", vision.texts.join(", ")));
    }
    if !vision.web_entities.is_empty() {
        lines.push(format!("  Web Entities: {}", vision.web_entities.join(", ")));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{CharacterMatch, Suggestion};

    fn snapshot(current: AnalysisResult, step_number: usize, excluded: &[&str]) -> SessionSnapshot {
        SessionSnapshot {
            session_id: Some(1),
            step_number,
            current: Some(current),
            excluded_ids: excluded.iter().map(|s| (*s).into()).collect(),
            steps: Vec::new(),
            busy: false,
        }
    }

    fn naruto() -> AnalysisResult {
        AnalysisResult {
            success: true,
            error: None,
            character: Some(CharacterMatch {
                name: "Naruto Uzumaki".to_string(),
                anime: "Naruto".to_string(),
                description: "Ninja of the Leaf".to_string(),
                confidence: 0.92,
                image_url: None,
            }),
            suggestions: Some(
                (1..=5)
                    .map(|i| Suggestion {
                        id: format!("c{}", i).into(),
                        name: format!("Candidate {}", i),
                        anime: "Naruto".to_string(),
                        confidence: 0.9 - i as f64 * 0.1,
                    })
                    .collect(),
            ),
            vision_data: None,
        }
    }

    #[test]
    fn test_render_original_match() {
        let text = render_result(&snapshot(naruto(), 0, &[]));
        assert!(text.contains("Analysis Results"));
        assert!(text.contains("Naruto Uzumaki"));
        assert!(text.contains("Confidence: 92%"));
        assert!(text.contains("Candidate 3"));
        assert!(!text.contains("Candidate 4"), "only 3 suggestions shown: {}", text);
        assert!(text.contains("Help find better matches"));
    }

    #[test]
    fn test_render_step_shows_exclusion_count() {
        let text = render_result(&snapshot(naruto(), 2, &["a", "b", "c"]));
        assert!(text.contains("Re-examination Results (Step 2)"));
        assert!(text.contains("3 characters excluded from search"));
        assert!(text.contains("Still not satisfied"));
    }

    #[test]
    fn test_render_failure() {
        let text = render_result(&snapshot(
            AnalysisResult::failure("Failed to re-examine image. Please try again."),
            1,
            &[],
        ));
        assert!(text.contains("Analysis Failed"));
        assert!(text.contains("Failed to re-examine image"));
        assert!(!text.contains("focus"));
        assert!(text.contains("exclude  Search again"));
        assert!(text.contains("back <n>"));
    }

    #[test]
    fn test_failed_original_offers_retry_with_exclusion_count() {
        let text = render_result(&snapshot(
            AnalysisResult::failure("Failed to re-examine image. Please try again."),
            0,
            &["a", "b"],
        ));
        assert!(text.contains("still skipping 2 excluded characters"));
        assert!(!text.contains("back <n>"));
    }

    #[test]
    fn test_render_no_match() {
        let mut empty = naruto();
        empty.character = None;
        empty.suggestions = Some(Vec::new());
        let text = render_result(&snapshot(empty, 0, &[]));
        assert!(text.contains("No Matches Found"));
    }

    #[test]
    fn test_render_vision_data() {
        let mut result = naruto();
        result.vision_data = Some(VisionData {
            labels: vec!["Anime".to_string(), "Cartoon".to_string()],
            texts: Vec::new(),
            web_entities: vec!["Naruto".to_string()],
        });
        let text = render_result(&snapshot(result, 0, &[]));
        assert!(text.contains("Detected Labels: Anime, Cartoon"));
        assert!(text.contains("Web Entities: Naruto"));
        assert!(!text.contains("Detected Text"));
    }

    #[test]
    fn test_render_without_session() {
        let empty = SessionSnapshot {
            session_id: None,
            step_number: 0,
            current: None,
            excluded_ids: Vec::new(),
            steps: Vec::new(),
            busy: false,
        };
        assert!(render_result(&empty).contains("No image analyzed yet"));
    }
}
