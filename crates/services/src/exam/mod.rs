mod controller;
mod progress;
mod state;

// Public API of the exam session subsystem.
pub use crate::error::ExamError;
pub use controller::{ExamSessionController, GradingStep, GradingTicket, SubmissionTicket};
pub use progress::ExamProgress;
pub use state::{ExamPhase, ExamState};
