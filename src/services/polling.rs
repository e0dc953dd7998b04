// Status Polling Orchestrator
// Timer-driven retry loop for humanization jobs: submit happened
// elsewhere; this drives status fetches on a fixed interval until a
// terminal outcome or the attempt budget runs out. Fetches are strictly
// sequential, so snapshots are never observed out of order.

use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::{JobStatus, StatusSnapshot};
use crate::services::error::ClientError;

/// Fixed-delay schedule for one job. No backoff, no jitter; the attempt
/// cap is the only backstop against a service that never turns terminal.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Wait after a successful submit before the first status fetch.
    pub initial_delay: Duration,
    /// Wait between consecutive status fetches.
    pub interval: Duration,
    /// Total fetches (including failed ones) before giving up.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            interval: Duration::from_secs(10),
            max_attempts: 60,
        }
    }
}

/// Seam between the state machine and the HTTP client, so the loop can
/// be driven by a scripted source in tests.
#[allow(async_fn_in_trait)]
pub trait StatusSource {
    async fn fetch_status(&self, document_id: &str) -> Result<StatusSnapshot, ClientError>;
}

/// Why a job ended without humanized text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// The service said "completed" but sent no text.
    #[error("job completed but no humanized text was returned")]
    MissingText,
    /// The service declared the job failed.
    #[error("upstream reported failure: {0}")]
    Upstream(String),
}

/// Terminal outcome of one job, with the number of status fetches spent.
#[derive(Debug)]
pub enum JobOutcome {
    Succeeded { text: String, attempts: u32 },
    Failed { failure: JobFailure, attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl JobOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            JobOutcome::Succeeded { attempts, .. }
            | JobOutcome::Failed { attempts, .. }
            | JobOutcome::Exhausted { attempts }
            | JobOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn into_result(self) -> Result<String, ClientError> {
        match self {
            JobOutcome::Succeeded { text, .. } => Ok(text),
            JobOutcome::Failed {
                failure: JobFailure::MissingText,
                ..
            } => Err(ClientError::Protocol(JobFailure::MissingText.to_string())),
            JobOutcome::Failed {
                failure: JobFailure::Upstream(message),
                ..
            } => Err(ClientError::JobFailed(message)),
            JobOutcome::Exhausted { attempts } => Err(ClientError::Exhausted(attempts)),
            JobOutcome::Cancelled { .. } => Err(ClientError::Cancelled),
        }
    }
}

/// Wait for `duration` unless the token fires first.
async fn wait_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = sleep(duration) => true,
    }
}

/// Interpret one snapshot. `None` means keep polling.
fn evaluate(snapshot: &StatusSnapshot, document_id: &str) -> Option<Result<String, JobFailure>> {
    // Presence of text is the authoritative success signal, whatever the
    // status field claims.
    if let Some(text) = &snapshot.humanized_text {
        return Some(Ok(text.clone()));
    }

    match snapshot.status {
        JobStatus::Completed => Some(Err(JobFailure::MissingText)),
        JobStatus::Error => Some(Err(JobFailure::Upstream(
            snapshot
                .failure_message()
                .unwrap_or("unknown error")
                .to_string(),
        ))),
        JobStatus::Processing | JobStatus::Unknown => {
            if snapshot.error.is_some() {
                return Some(Err(JobFailure::Upstream(
                    snapshot.failure_message().unwrap_or("unknown error").to_string(),
                )));
            }
            if snapshot.status == JobStatus::Unknown {
                info!(
                    document_id = %document_id,
                    raw_status = snapshot.raw_status.as_deref().unwrap_or(""),
                    "polling.unknown_status"
                );
            }
            None
        }
    }
}

/// Drive a job from submitted to terminal. One fetch in flight at a time;
/// transient fetch failures are retried on the same schedule and consume
/// attempts from the same pool as ordinary polls.
pub async fn poll_job<S: StatusSource>(
    source: &S,
    document_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> JobOutcome {
    if !wait_or_cancel(policy.initial_delay, cancel).await {
        return JobOutcome::Cancelled { attempts: 0 };
    }

    let mut attempts: u32 = 0;
    loop {
        if attempts >= policy.max_attempts {
            warn!(document_id = %document_id, attempts, "polling.exhausted");
            return JobOutcome::Exhausted { attempts };
        }
        attempts += 1;

        match source.fetch_status(document_id).await {
            Ok(snapshot) => match evaluate(&snapshot, document_id) {
                Some(Ok(text)) => {
                    info!(document_id = %document_id, attempts, "polling.succeeded");
                    return JobOutcome::Succeeded { text, attempts };
                }
                Some(Err(failure)) => {
                    warn!(document_id = %document_id, attempts, %failure, "polling.failed");
                    return JobOutcome::Failed { failure, attempts };
                }
                None => {
                    info!(
                        document_id = %document_id,
                        attempt = attempts,
                        max_attempts = policy.max_attempts,
                        "polling.still_processing"
                    );
                }
            },
            // Transport or parse failure: the attempt is spent, the
            // schedule continues.
            Err(e) => {
                warn!(document_id = %document_id, attempt = attempts, error = %e, "polling.fetch_failed");
            }
        }

        if !wait_or_cancel(policy.interval, cancel).await {
            return JobOutcome::Cancelled { attempts };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            initial_delay: Duration::ZERO,
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    fn processing() -> StatusSnapshot {
        StatusSnapshot {
            status: JobStatus::Processing,
            raw_status: Some("processing".to_string()),
            humanized_text: None,
            error: None,
            message: None,
        }
    }

    fn with_text(text: &str, status: JobStatus) -> StatusSnapshot {
        StatusSnapshot {
            status,
            raw_status: None,
            humanized_text: Some(text.to_string()),
            error: None,
            message: None,
        }
    }

    /// Replays a fixed script of fetch results, then keeps reporting
    /// `processing`. Counts every fetch.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<StatusSnapshot, ClientError>>>,
        fetches: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<StatusSnapshot, ClientError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fetches: AtomicU32::new(0),
            }
        }

        fn fetches(&self) -> u32 {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _document_id: &str) -> Result<StatusSnapshot, ClientError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(processing()))
        }
    }

    fn fresh_token() -> CancellationToken {
        CancellationToken::new()
    }

    #[tokio::test]
    async fn test_text_on_final_attempt_succeeds() {
        let mut script: Vec<_> = (0..59).map(|_| Ok(processing())).collect();
        script.push(Ok(with_text("X", JobStatus::Processing)));
        let source = ScriptedSource::new(script);

        let outcome = poll_job(&source, "doc", &fast_policy(60), &fresh_token()).await;
        match outcome {
            JobOutcome::Succeeded { text, attempts } => {
                assert_eq!(text, "X");
                assert_eq!(attempts, 60);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_text_overrides_non_terminal_status() {
        let source = ScriptedSource::new(vec![Ok(with_text("done", JobStatus::Unknown))]);
        let outcome = poll_job(&source, "doc", &fast_policy(5), &fresh_token()).await;
        assert!(matches!(outcome, JobOutcome::Succeeded { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_completed_without_text_fails_as_protocol_inconsistency() {
        let snapshot = StatusSnapshot {
            status: JobStatus::Completed,
            raw_status: Some("completed".to_string()),
            humanized_text: None,
            error: None,
            message: None,
        };
        let source = ScriptedSource::new(vec![Ok(snapshot)]);

        let outcome = poll_job(&source, "doc", &fast_policy(5), &fresh_token()).await;
        match outcome {
            JobOutcome::Failed { failure, attempts } => {
                assert_eq!(failure, JobFailure::MissingText);
                assert_eq!(attempts, 1);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(matches!(
            JobOutcome::Failed {
                failure: JobFailure::MissingText,
                attempts: 1
            }
            .into_result(),
            Err(ClientError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_error_status_fails_with_upstream_message() {
        let snapshot = StatusSnapshot {
            status: JobStatus::Error,
            raw_status: Some("error".to_string()),
            humanized_text: None,
            error: Some("E42".to_string()),
            message: Some("document rejected".to_string()),
        };
        let source = ScriptedSource::new(vec![Ok(snapshot)]);

        let outcome = poll_job(&source, "doc", &fast_policy(5), &fresh_token()).await;
        match outcome {
            JobOutcome::Failed { failure, .. } => {
                assert_eq!(failure, JobFailure::Upstream("document rejected".to_string()));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_field_fails_even_while_processing() {
        let snapshot = StatusSnapshot {
            status: JobStatus::Processing,
            raw_status: Some("processing".to_string()),
            humanized_text: None,
            error: Some("quota exceeded".to_string()),
            message: None,
        };
        let source = ScriptedSource::new(vec![Ok(snapshot)]);

        let outcome = poll_job(&source, "doc", &fast_policy(5), &fresh_token()).await;
        match outcome {
            JobOutcome::Failed { failure, .. } => {
                assert_eq!(failure, JobFailure::Upstream("quota exceeded".to_string()));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_spends_exactly_max_attempts() {
        let script: Vec<_> = (0..61).map(|_| Ok(processing())).collect();
        let source = ScriptedSource::new(script);

        let outcome = poll_job(&source, "doc", &fast_policy(60), &fresh_token()).await;
        assert!(matches!(outcome, JobOutcome::Exhausted { attempts: 60 }));
        // No 61st fetch.
        assert_eq!(source.fetches(), 60);
    }

    #[tokio::test]
    async fn test_transient_fetch_failures_consume_attempts_without_failing() {
        let mut script: Vec<Result<StatusSnapshot, ClientError>> = (0..5)
            .map(|i| Err(ClientError::Json(format!("bad payload {}", i))))
            .collect();
        script.push(Ok(processing()));
        let source = ScriptedSource::new(script);

        // Budget of 6: five network/parse failures plus one ordinary poll,
        // all from the same pool. The job must not fail prematurely.
        let outcome = poll_job(&source, "doc", &fast_policy(6), &fresh_token()).await;
        assert!(matches!(outcome, JobOutcome::Exhausted { attempts: 6 }));
        assert_eq!(source.fetches(), 6);
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let unknown = StatusSnapshot {
            status: JobStatus::Unknown,
            raw_status: Some("queued".to_string()),
            humanized_text: None,
            error: None,
            message: None,
        };
        let source = ScriptedSource::new(vec![
            Ok(unknown),
            Ok(with_text("Z", JobStatus::Completed)),
        ]);

        let outcome = poll_job(&source, "doc", &fast_policy(10), &fresh_token()).await;
        match outcome {
            JobOutcome::Succeeded { text, attempts } => {
                assert_eq!(text, "Z");
                assert_eq!(attempts, 2);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_before_first_fetch() {
        let source = ScriptedSource::new(vec![]);
        let token = fresh_token();
        token.cancel();

        let policy = PollPolicy {
            initial_delay: Duration::from_secs(3600),
            ..fast_policy(60)
        };
        let outcome = poll_job(&source, "doc", &policy, &token).await;
        assert!(matches!(outcome, JobOutcome::Cancelled { attempts: 0 }));
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_between_polls() {
        let source = ScriptedSource::new(vec![Ok(processing())]);
        let token = fresh_token();

        let policy = PollPolicy {
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(3600),
            max_attempts: 60,
        };
        let job = tokio::spawn({
            let token = token.clone();
            async move { poll_job(&source, "doc", &policy, &token).await }
        });

        // Give the first fetch time to land, then cancel the wait.
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let outcome = job.await.unwrap();
        assert!(matches!(outcome, JobOutcome::Cancelled { attempts: 1 }));
    }

    #[test]
    fn test_default_policy_matches_designed_values() {
        let policy = PollPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(3));
        assert_eq!(policy.interval, Duration::from_secs(10));
        assert_eq!(policy.max_attempts, 60);
    }
}
