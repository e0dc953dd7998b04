// Veritext Data Models
// Wire shapes for the detection and humanization services, plus the
// canonical normalized status snapshot used by the polling loop.

use serde::{Deserialize, Serialize};

// ============ Detection ============

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl AnalysisRequest {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            version: None,
        }
    }
}

/// Per-document detection scores. Upstream values are trusted as-is;
/// no range validation is applied on the client side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub completely_generated_prob: f64,
    pub average_generated_prob: f64,
    pub overall_burstiness: f64,
    #[serde(default)]
    pub paragraphs: Vec<ParagraphResult>,
}

/// One entry per paragraph, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphResult {
    pub generated_prob: f64,
    pub burstiness: f64,
    pub text: String,
}

// ============ Humanization Options ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readability {
    #[serde(rename = "High School")]
    HighSchool,
    University,
    Doctorate,
    Journalist,
    Marketing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    #[serde(rename = "General Writing")]
    GeneralWriting,
    Essay,
    Article,
    #[serde(rename = "Marketing Material")]
    MarketingMaterial,
    Story,
    #[serde(rename = "Cover Letter")]
    CoverLetter,
    Report,
    #[serde(rename = "Business Material")]
    BusinessMaterial,
    #[serde(rename = "Legal Material")]
    LegalMaterial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Quality,
    Balanced,
    #[serde(rename = "More Human")]
    MoreHuman,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HumanizerModel {
    #[default]
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "v11")]
    V11,
}

/// Options sent with every humanization submit. Immutable per request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HumanizeOptions {
    pub readability: Readability,
    pub purpose: Purpose,
    pub strength: Strength,
    #[serde(default)]
    pub model: HumanizerModel,
}

impl Default for HumanizeOptions {
    fn default() -> Self {
        Self {
            readability: Readability::University,
            purpose: Purpose::GeneralWriting,
            strength: Strength::Balanced,
            model: HumanizerModel::V2,
        }
    }
}

// ============ Humanization Job ============

/// Handle to a submitted humanization job. The identifier is assigned
/// exactly once by the upstream service and never re-used across jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanizeJob {
    pub document_id: String,
}

/// Job status as reported by the humanization service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
    /// Any status string the client does not recognize. Treated as
    /// non-terminal: the loop keeps polling until the attempt cap.
    Unknown,
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "processing" | "" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "error" => JobStatus::Error,
            _ => JobStatus::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// Canonical status shape produced by normalizing a raw status response.
/// Each poll yields a fresh snapshot; snapshots are never patched in place.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    /// Raw status string as received, kept for logging unknown values.
    pub raw_status: Option<String>,
    pub humanized_text: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl StatusSnapshot {
    /// Best available failure description: the upstream `message` when
    /// present, otherwise the `error` field.
    pub fn failure_message(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}
