// Veritext Core Services
// Thin client orchestration around the two upstream services:
// - detector: one-shot detection scoring
// - humanizer: submit + status clients with response normalization
// - polling: timer-driven retry loop until a terminal job outcome
// - input: reading uploaded text into the buffer
// - config_store: API keys and base-URL overrides

pub mod config_store;
pub mod detector;
pub mod error;
pub mod humanizer;
pub mod input;
pub mod polling;

pub use config_store::{
    load_or_default, resolve_api_key, resolve_base_url, AppConfig, ConfigStore, DETECTOR_SERVICE,
    HUMANIZER_SERVICE,
};
pub use detector::{score_label, DetectorClient};
pub use error::ClientError;
pub use humanizer::{HumanizerClient, MAX_CHARS, MIN_CHARS};
pub use input::load_text_file;
pub use polling::{poll_job, JobFailure, JobOutcome, PollPolicy, StatusSource};
