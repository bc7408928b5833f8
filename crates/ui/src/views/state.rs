use dioxus::prelude::*;
use exam_core::model::ConfigurationError;
use services::ExamError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    SubjectsUnavailable,
    NoSubjectSelected,
    InvalidConfiguration,
    SubmissionFailed,
    GradingFailed,
    TimeUp,
}

impl ViewError {
    /// Map a controller error to what the user sees. Stale responses and
    /// double submissions are silent.
    #[must_use]
    pub fn from_exam(err: &ExamError) -> Option<Self> {
        match err {
            ExamError::StaleResponse | ExamError::SubmissionInFlight => None,
            ExamError::ConfigurationInvalid(ConfigurationError::NoSubjects) => {
                Some(Self::NoSubjectSelected)
            }
            ExamError::ConfigurationInvalid(_) => Some(Self::InvalidConfiguration),
            ExamError::SubmissionFailed(_) => Some(Self::SubmissionFailed),
            ExamError::GradingFailed(_) => Some(Self::GradingFailed),
            ExamError::TimeExpired => Some(Self::TimeUp),
            _ => Some(Self::Unknown),
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Unknown => "Something went wrong. Please try again.",
            Self::SubjectsUnavailable => "Subjects could not be loaded.",
            Self::NoSubjectSelected => "Select at least one subject to start.",
            Self::InvalidConfiguration => "This test is not set up correctly. Check the test settings.",
            Self::SubmissionFailed => "The test could not be started. Please try again.",
            Self::GradingFailed => "Your answers could not be submitted. Please try again.",
            Self::TimeUp => "Time is up. Answers can no longer be changed.",
        }
    }

    /// Whether a retry button makes sense for this error.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Unknown | Self::SubjectsUnavailable | Self::SubmissionFailed | Self::GradingFailed
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
