//! Request/response boundary to the recognition service.
//!
//! `RecognitionClient` is the seam the refinement engine talks through;
//! `HttpRecognitionClient` is the production implementation over HTTP+JSON.
//! Every `Err` returned here is a transport failure: the request could not
//! be completed or the reply was not an `AnalysisResult`. Logical failures
//! (`success: false`) come back as `Ok`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::GuesserError;

use super::types::{AnalysisResult, AnalyzeRequest, ReExamineRequest, RefreshOutcome, ServiceHealth};

#[async_trait]
pub trait RecognitionClient: Send + Sync {
    /// `POST /api/analyze`
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, GuesserError>;

    /// `POST /api/re-examine`
    async fn re_examine(&self, request: &ReExamineRequest)
        -> Result<AnalysisResult, GuesserError>;

    /// `GET /api/health`
    async fn health(&self) -> Result<ServiceHealth, GuesserError>;

    /// `POST /api/refresh-db`
    async fn refresh_database(&self) -> Result<RefreshOutcome, GuesserError>;
}

/// HTTP client for the recognition API.
pub struct HttpRecognitionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecognitionClient {
    /// Build a client from the `[service]` settings.
    pub fn new(config: &ServiceConfig) -> Result<Self, GuesserError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| GuesserError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GuesserError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        decode(&url, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GuesserError> {
        let url = self.endpoint(path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        decode(&url, response).await
    }
}

fn transport(url: &str, err: reqwest::Error) -> GuesserError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    warn!("Request to {} {}: {}", url, kind, err);
    GuesserError::Transport(format!("Request to {} {}: {}", url, kind, err))
}

async fn decode<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, GuesserError> {
    let status = response.status();
    if !status.is_success() {
        warn!("{} returned HTTP {}", url, status.as_u16());
        return Err(GuesserError::Transport(format!(
            "{} returned HTTP {} {}",
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport(url, e))?;
    serde_json::from_slice(&body).map_err(|e| {
        let preview = String::from_utf8_lossy(&body[..body.len().min(200)]).to_string();
        warn!("Malformed response from {}: {}", url, e);
        GuesserError::Transport(format!(
            "Malformed response from {}: {}. Body starts with: {}",
            url, e, preview
        ))
    })
}

#[async_trait]
impl RecognitionClient for HttpRecognitionClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, GuesserError> {
        info!("Analyzing image ({} bytes encoded)", request.image_data.len());
        self.post_json("analyze", request).await
    }

    async fn re_examine(
        &self,
        request: &ReExamineRequest,
    ) -> Result<AnalysisResult, GuesserError> {
        info!(
            "Re-examining image: search_type={}, exclude_ids={}, focus_ids={}",
            request.search_type,
            request.exclude_ids.len(),
            request.focus_ids.len()
        );
        self.post_json("re-examine", request).await
    }

    async fn health(&self) -> Result<ServiceHealth, GuesserError> {
        self.get_json("health").await
    }

    async fn refresh_database(&self) -> Result<RefreshOutcome, GuesserError> {
        info!("Requesting character database refresh");
        self.post_json("refresh-db", &serde_json::json!({})).await
    }
}
