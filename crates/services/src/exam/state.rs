use std::fmt;

use exam_core::model::{AnswerRecord, ExamConfiguration, SessionResult, TestSession};

/// Data-free tag of the controller state, for display and error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExamPhase {
    Configuring,
    Submitting,
    SubmitFailed,
    Active,
    Grading,
    Completed,
}

impl ExamPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuring => "configuring",
            Self::Submitting => "submitting",
            Self::SubmitFailed => "submit failed",
            Self::Active => "active",
            Self::Grading => "grading",
            Self::Completed => "completed",
        }
    }

    /// A request is in flight and submit controls must stay disabled.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Submitting | Self::Grading)
    }
}

impl fmt::Display for ExamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller state. Each variant carries only the data valid in it.
#[derive(Debug, Clone, Default)]
pub enum ExamState {
    #[default]
    Configuring,
    Submitting {
        config: ExamConfiguration,
    },
    SubmitFailed {
        config: ExamConfiguration,
        reason: String,
    },
    Active {
        config: ExamConfiguration,
        session: TestSession,
        answers: AnswerRecord,
    },
    Grading {
        config: ExamConfiguration,
        session: TestSession,
        answers: AnswerRecord,
    },
    Completed {
        config: ExamConfiguration,
        session: TestSession,
        result: SessionResult,
    },
}

impl ExamState {
    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        match self {
            Self::Configuring => ExamPhase::Configuring,
            Self::Submitting { .. } => ExamPhase::Submitting,
            Self::SubmitFailed { .. } => ExamPhase::SubmitFailed,
            Self::Active { .. } => ExamPhase::Active,
            Self::Grading { .. } => ExamPhase::Grading,
            Self::Completed { .. } => ExamPhase::Completed,
        }
    }

    #[must_use]
    pub fn configuration(&self) -> Option<&ExamConfiguration> {
        match self {
            Self::Configuring => None,
            Self::Submitting { config }
            | Self::SubmitFailed { config, .. }
            | Self::Active { config, .. }
            | Self::Grading { config, .. }
            | Self::Completed { config, .. } => Some(config),
        }
    }

    #[must_use]
    pub fn test_session(&self) -> Option<&TestSession> {
        match self {
            Self::Active { session, .. }
            | Self::Grading { session, .. }
            | Self::Completed { session, .. } => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn answers(&self) -> Option<&AnswerRecord> {
        match self {
            Self::Active { answers, .. } | Self::Grading { answers, .. } => Some(answers),
            _ => None,
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        match self {
            Self::Completed { result, .. } => Some(result),
            _ => None,
        }
    }
}
