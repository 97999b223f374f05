//! Wire types exchanged with the recognition service.
//!
//! `AnalysisResult` is both the response of `/api/analyze` and
//! `/api/re-examine` and the unit stored in the refinement history.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::image_prep::ImageData;

/// Shown when `/api/analyze` could not be reached or returned garbage.
pub const ANALYZE_FAILURE_MESSAGE: &str = "Failed to analyze image. Please try again.";
/// Shown when `/api/re-examine` could not be reached or returned garbage.
pub const RE_EXAMINE_FAILURE_MESSAGE: &str = "Failed to re-examine image. Please try again.";
/// Shown when the picked file could not be read or encoded.
pub const IMAGE_FAILURE_MESSAGE: &str = "Failed to process image file.";

/// Outcome of one recognition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Best match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterMatch>,
    /// Ranked candidates, highest confidence first. Order is kept as received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
    /// Diagnostics from the vision backend; never interpreted here.
    #[serde(
        default,
        rename = "visionData",
        alias = "vision_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub vision_data: Option<VisionData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterMatch {
    pub name: String,
    pub anime: String,
    #[serde(default)]
    pub description: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub name: String,
    pub anime: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub web_entities: Vec<String>,
}

/// How a result should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// A best match or at least one suggestion.
    Match,
    /// The service succeeded but found nothing.
    NoMatch,
    /// Logical or transport failure.
    Failed,
}

impl AnalysisResult {
    /// A failed result carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            character: None,
            suggestions: None,
            vision_data: None,
        }
    }

    /// Suggestion identifiers in relevance order; empty when absent.
    pub fn suggestion_ids(&self) -> Vec<SuggestionId> {
        self.suggestions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn has_suggestions(&self) -> bool {
        self.suggestions.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn kind(&self) -> ResultKind {
        if !self.success {
            ResultKind::Failed
        } else if self.character.is_none() && !self.has_suggestions() {
            ResultKind::NoMatch
        } else {
            ResultKind::Match
        }
    }

    /// Error text for display, falling back to a generic message.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }
}

/// Confidence in `[0, 1]` as a rounded whole percentage.
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Character identifier as sent by the service.
///
/// The service may use JSON numbers or strings. The original form is kept
/// so ids go back out with the type they arrived with; `17` and `"17"` are
/// different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionId::Number(n) => write!(f, "{}", n),
            SuggestionId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SuggestionId {
    fn from(n: i64) -> Self {
        SuggestionId::Number(n)
    }
}

impl From<&str> for SuggestionId {
    fn from(s: &str) -> Self {
        SuggestionId::Text(s.to_string())
    }
}

impl From<String> for SuggestionId {
    fn from(s: String) -> Self {
        SuggestionId::Text(s)
    }
}

impl PartialEq<&str> for SuggestionId {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, SuggestionId::Text(s) if s == other)
    }
}

impl PartialEq<i64> for SuggestionId {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, SuggestionId::Number(n) if n == other)
    }
}

/// Refinement mode requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// "Yes, it's one of these": narrow to the shown suggestions.
    Focus,
    /// "No, try different characters": veto the shown suggestions.
    Exclude,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Focus => "focus",
            SearchType::Exclude => "exclude",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(SearchType::Focus),
            "exclude" => Ok(SearchType::Exclude),
            other => Err(format!("Unknown search type: '{}'", other)),
        }
    }
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub image_data: ImageData,
}

/// Body of `POST /api/re-examine`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReExamineRequest {
    pub image_data: ImageData,
    pub search_type: SearchType,
    pub exclude_ids: Vec<SuggestionId>,
    pub focus_ids: Vec<SuggestionId>,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Response of `POST /api/refresh-db`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_result_deserialize_full() {
        let json = r#"{
            "success": true,
            "character": {"id": 17, "name": "Naruto Uzumaki", "anime": "Naruto",
                          "description": "A ninja", "image_url": "https://img/1.png",
                          "confidence": 0.92},
            "suggestions": [
                {"id": 17, "name": "Naruto Uzumaki", "anime": "Naruto", "confidence": 0.92},
                {"id": "c2", "name": "Boruto", "anime": "Boruto", "confidence": 0.4}
            ],
            "visionData": {"labels": ["Anime"], "texts": [], "web_entities": ["Naruto"]}
        }"#;

        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(result.success);
        assert_eq!(result.character.as_ref().unwrap().name, "Naruto Uzumaki");
        assert_eq!(
            result.character.as_ref().unwrap().image_url.as_deref(),
            Some("https://img/1.png")
        );
        assert_eq!(
            result.suggestion_ids(),
            vec![SuggestionId::Number(17), SuggestionId::from("c2")]
        );
        assert_eq!(result.vision_data.unwrap().web_entities, vec!["Naruto"]);
    }

    #[test]
    fn test_analysis_result_deserialize_failure_with_null_fields() {
        let json = r#"{"success": false, "character": null, "suggestions": [], "error": "boom"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.kind(), ResultKind::Failed);
        assert_eq!(result.error_message(), "boom");
        assert!(result.suggestion_ids().is_empty());
    }

    #[test]
    fn test_kind_no_match() {
        let json = r#"{"success": true, "suggestions": []}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.kind(), ResultKind::NoMatch);

        let bare: AnalysisResult = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(bare.kind(), ResultKind::NoMatch);
    }

    #[test]
    fn test_kind_match_with_only_suggestions() {
        let json = r#"{"success": true,
            "suggestions": [{"id": "a", "name": "A", "anime": "X", "confidence": 0.5}]}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.kind(), ResultKind::Match);
    }

    #[test]
    fn test_failure_constructor() {
        let result = AnalysisResult::failure(RE_EXAMINE_FAILURE_MESSAGE);
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Failed to re-examine image. Please try again.")
        );
        assert!(result.character.is_none());
        assert!(result.suggestions.is_none());
    }

    #[test]
    fn test_failure_serializes_without_empty_fields() {
        let json = serde_json::to_string(&AnalysisResult::failure("nope")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"nope"}"#);
    }

    #[test]
    fn test_confidence_percent_rounds_and_clamps() {
        assert_eq!(confidence_percent(0.92), 92);
        assert_eq!(confidence_percent(0.926), 93);
        assert_eq!(confidence_percent(1.7), 100);
        assert_eq!(confidence_percent(-0.2), 0);
    }

    #[test]
    fn test_search_type_wire_names() {
        assert_eq!(serde_json::to_string(&SearchType::Focus).unwrap(), r#""focus""#);
        assert_eq!(serde_json::to_string(&SearchType::Exclude).unwrap(), r#""exclude""#);
        assert_eq!("Exclude".parse::<SearchType>().unwrap(), SearchType::Exclude);
        assert!("normal".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_re_examine_request_serialize() {
        let request = ReExamineRequest {
            image_data: ImageData::from_data_url("data:image/png;base64,AAAA"),
            search_type: SearchType::Exclude,
            exclude_ids: vec!["c1".into(), SuggestionId::Number(23)],
            focus_ids: vec![],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["image_data"], "data:image/png;base64,AAAA");
        assert_eq!(value["search_type"], "exclude");
        assert_eq!(value["exclude_ids"], serde_json::json!(["c1", 23]));
        assert_eq!(value["focus_ids"], serde_json::json!([]));
    }

    #[test]
    fn test_suggestion_id_keeps_json_type() {
        let ids: Vec<SuggestionId> = serde_json::from_str(r#"[17, "17", "c3"]"#).unwrap();
        assert_eq!(ids[0], 17);
        assert_eq!(ids[1], "17");
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[0].to_string(), "17");
        assert_eq!(
            serde_json::to_string(&ids).unwrap(),
            r#"[17,"17","c3"]"#
        );
    }

    #[test]
    fn test_service_health() {
        let health: ServiceHealth =
            serde_json::from_str(r#"{"status":"healthy","service":"anime-guesser-api"}"#).unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.service.as_deref(), Some("anime-guesser-api"));
    }
}
