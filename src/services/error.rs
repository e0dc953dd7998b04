// Client Error Taxonomy
// Every failure in the crate resolves to one of these values; nothing
// here is fatal to the process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Input precondition violated. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// Non-2xx HTTP response, carrying the upstream message when the
    /// error body was parseable.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// 2xx response missing an expected field.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(String),

    /// The humanization service declared the job failed.
    #[error("humanization failed: {0}")]
    JobFailed(String),

    /// Attempt budget reached without a terminal status.
    #[error("humanization did not finish after {0} attempts")]
    Exhausted(u32),

    /// The caller cancelled the job mid-poll.
    #[error("humanization cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        ClientError::Upstream {
            status,
            message: message.into(),
        }
    }
}
