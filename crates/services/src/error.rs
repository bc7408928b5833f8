//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{ConfigurationError, OptionId, PayloadError, QuestionId, ResultError};

use crate::exam::ExamPhase;

/// Errors emitted by `ExamBackend` adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("backend returned an invalid test: {0}")]
    InvalidTest(#[from] PayloadError),
    #[error("backend returned an invalid grading result: {0}")]
    InvalidResult(#[from] ResultError),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `ExamSessionController`.
///
/// None of these are fatal to the host; each is scoped to one session and
/// recovered from by retrying or resetting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(#[from] ConfigurationError),
    #[error("could not start the test: {0}")]
    SubmissionFailed(#[source] BackendError),
    #[error("could not grade the test: {0}")]
    GradingFailed(#[source] BackendError),
    #[error("response belongs to an abandoned session")]
    StaleResponse,
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("{operation} is not allowed while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: ExamPhase,
    },
    #[error("question {0} is not part of this test")]
    UnknownQuestion(QuestionId),
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error("time is up for this test")]
    TimeExpired,
}

impl ExamError {
    /// True for failures the user can recover from by pressing retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SubmissionFailed(_) | Self::GradingFailed(_))
    }
}

/// Errors emitted while reading service configuration from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {raw}")]
    InvalidUrl {
        var: &'static str,
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} must be an http(s) base URL: {raw}")]
    UnsupportedUrl { var: &'static str, raw: String },
    #[error("invalid {var} value: {raw}")]
    InvalidValue { var: &'static str, raw: String },
}
