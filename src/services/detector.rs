// Detection Client
// Single round-trip client for the AI content detection service.

use reqwest::Client;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info};

use crate::models::{AnalysisRequest, AnalysisResult};
use crate::services::config_store::{resolve_base_url, DETECTOR_SERVICE};
use crate::services::error::ClientError;

const DETECTOR_DEFAULT_URL: &str = "https://api.gptzero.me";
const PREDICT_PATH: &str = "/v2/predict/text";

/// Wire envelope for the detection endpoint.
#[derive(Debug, Deserialize)]
struct DetectionEnvelope {
    #[serde(default)]
    documents: Vec<AnalysisResult>,
    error: Option<String>,
}

pub struct DetectorClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DetectorClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url = resolve_base_url(DETECTOR_SERVICE)
            .unwrap_or_else(|| DETECTOR_DEFAULT_URL.to_string());
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Analyze a document in one round trip. No retries: a failed attempt
    /// is surfaced immediately.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::Validation(
                "no text to analyze (empty or whitespace-only input)".to_string(),
            ));
        }

        let request = AnalysisRequest::new(text);
        let url = format!("{}{}", self.base_url, PREDICT_PATH);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("X-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), latency_ms = start.elapsed().as_millis() as i64, "detector.response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<DetectionEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| "failed to analyze text".to_string());
            return Err(ClientError::upstream(status.as_u16(), message));
        }

        let envelope: DetectionEnvelope = response
            .json()
            .await
            .map_err(|e| ClientError::Json(e.to_string()))?;

        let result = envelope
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Protocol("response contained no documents".to_string()))?;

        info!(
            paragraphs = result.paragraphs.len(),
            completely_generated_prob = result.completely_generated_prob,
            "detector.analyzed"
        );
        Ok(result)
    }
}

/// Human-readable verdict for a generated probability.
pub fn score_label(score: f64) -> &'static str {
    if score < 0.1 {
        "Very likely human"
    } else if score < 0.3 {
        "Likely human"
    } else if score < 0.5 {
        "Possibly human"
    } else if score < 0.7 {
        "Uncertain"
    } else if score < 0.9 {
        "Likely AI"
    } else {
        "Very likely AI"
    }
}
