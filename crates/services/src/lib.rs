#![forbid(unsafe_code)]

pub mod backend;
pub mod config;
pub mod error;
pub mod exam;

pub use exam_core::Clock;

pub use backend::{ExamBackend, HttpExamBackend, InMemoryExamBackend};
pub use config::{BackendConfig, ExamServiceConfig, GradingMode};
pub use error::{BackendError, ConfigError, ExamError};
pub use exam::{
    ExamPhase, ExamProgress, ExamSessionController, ExamState, GradingStep, GradingTicket,
    SubmissionTicket,
};
