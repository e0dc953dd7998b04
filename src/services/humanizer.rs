// Humanization Client
// Submit and status endpoints of the humanization service, plus the
// normalization that folds its inconsistent response shapes into one
// canonical snapshot.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{
    HumanizeJob, HumanizeOptions, HumanizerModel, JobStatus, Purpose, Readability, StatusSnapshot,
    Strength,
};
use crate::services::config_store::{resolve_base_url, HUMANIZER_SERVICE};
use crate::services::error::ClientError;
use crate::services::polling::{poll_job, PollPolicy, StatusSource};

const HUMANIZER_DEFAULT_URL: &str = "https://humanize.undetectable.ai";

/// Character bounds enforced before any network call.
pub const MIN_CHARS: usize = 50;
pub const MAX_CHARS: usize = 15000;

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    content: &'a str,
    readability: Readability,
    purpose: Purpose,
    strength: Strength,
    model: HumanizerModel,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    document_id: Option<String>,
    id: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// Raw status shape as the service actually sends it. The humanized text
/// may arrive at the top level or nested under `result`.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: Option<String>,
    humanized_text: Option<String>,
    result: Option<StatusResultBody>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResultBody {
    humanized_text: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Fold a raw status response into the canonical snapshot. Direct text
/// placement wins over the nested one; a missing status defaults to
/// `processing`, or `completed` once text is present.
fn normalize_status(raw: StatusResponse) -> StatusSnapshot {
    let nested = raw.result.and_then(|r| r.humanized_text);
    let humanized_text = non_empty(raw.humanized_text).or(non_empty(nested));

    let status = match raw.status.as_deref() {
        Some(s) => JobStatus::parse(s),
        None if humanized_text.is_some() => JobStatus::Completed,
        None => JobStatus::Processing,
    };

    StatusSnapshot {
        status,
        raw_status: raw.status,
        humanized_text,
        error: raw.error,
        message: raw.message,
    }
}

pub struct HumanizerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HumanizerClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url = resolve_base_url(HUMANIZER_SERVICE)
            .unwrap_or_else(|| HUMANIZER_DEFAULT_URL.to_string());
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

    /// Submit text for humanization and return the job handle.
    pub async fn submit(
        &self,
        text: &str,
        options: &HumanizeOptions,
    ) -> Result<HumanizeJob, ClientError> {
        let chars = text.chars().count();
        if text.trim().is_empty() || chars < MIN_CHARS {
            return Err(ClientError::Validation(format!(
                "text too short (minimum {} characters)",
                MIN_CHARS
            )));
        }
        if chars > MAX_CHARS {
            return Err(ClientError::Validation(format!(
                "text too long (maximum {} characters)",
                MAX_CHARS
            )));
        }

        let request = SubmitRequest {
            content: text,
            readability: options.readability,
            purpose: options.purpose,
            strength: options.strength,
            model: options.model,
        };

        let url = format!("{}/submit", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("apikey", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SubmitResponse>(&body)
                .ok()
                .and_then(|r| r.message.or(r.error))
                .unwrap_or_else(|| "failed to submit text for humanizing".to_string());
            return Err(ClientError::upstream(status.as_u16(), message));
        }

        let data: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Json(e.to_string()))?;

        // The service answers with either `document_id` or `id`;
        // `document_id` wins when both are present.
        let document_id = data
            .document_id
            .or(data.id)
            .ok_or_else(|| ClientError::Protocol("no identifier returned".to_string()))?;

        info!(document_id = %document_id, chars, "humanizer.submitted");
        Ok(HumanizeJob { document_id })
    }

    /// Fetch and normalize the current status of a job.
    pub async fn check_status(&self, document_id: &str) -> Result<StatusSnapshot, ClientError> {
        let url = format!("{}/status/{}", self.base_url, document_id);
        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .header("apikey", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // A non-2xx status check is a terminal job failure, not a
            // transient fetch error; only transport/parse failures are
            // retried by the polling loop.
            let body = response.text().await.unwrap_or_default();
            warn!(
                document_id = %document_id,
                status = status.as_u16(),
                "humanizer.status_http_error"
            );
            return Ok(StatusSnapshot {
                status: JobStatus::Error,
                raw_status: Some("error".to_string()),
                humanized_text: None,
                error: Some(format!("API returned {}: {}", status.as_u16(), body)),
                message: None,
            });
        }

        let raw: StatusResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Json(e.to_string()))?;

        let snapshot = normalize_status(raw);
        debug!(
            document_id = %document_id,
            status = ?snapshot.status,
            has_text = snapshot.humanized_text.is_some(),
            "humanizer.status"
        );
        Ok(snapshot)
    }

    /// Full job lifecycle: submit, then poll until a terminal outcome,
    /// returning the humanized text.
    pub async fn humanize(
        &self,
        text: &str,
        options: &HumanizeOptions,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<String, ClientError> {
        let job = self.submit(text, options).await?;
        let outcome = poll_job(self, &job.document_id, policy, cancel).await;
        outcome.into_result()
    }
}

impl StatusSource for HumanizerClient {
    async fn fetch_status(&self, document_id: &str) -> Result<StatusSnapshot, ClientError> {
        self.check_status(document_id).await
    }
}
