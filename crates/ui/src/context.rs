use std::sync::Arc;

use exam_core::model::{ExamConfiguration, TestId, UserId};
use services::{Clock, ExamBackend, ExamSessionController, GradingMode};

pub trait UiApp: Send + Sync {
    fn user_id(&self) -> UserId;
    fn test_id(&self) -> TestId;
    fn grading_mode(&self) -> GradingMode;
    fn shuffle_questions(&self) -> bool;
    fn clock(&self) -> Clock;

    fn exam_backend(&self) -> Arc<dyn ExamBackend>;
}

#[derive(Clone)]
pub struct AppContext {
    user_id: UserId,
    test_id: TestId,
    grading: GradingMode,
    shuffle_questions: bool,
    clock: Clock,

    backend: Arc<dyn ExamBackend>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            user_id: app.user_id(),
            test_id: app.test_id(),
            grading: app.grading_mode(),
            shuffle_questions: app.shuffle_questions(),
            clock: app.clock(),
            backend: app.exam_backend(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn grading_mode(&self) -> GradingMode {
        self.grading
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn ExamBackend> {
        Arc::clone(&self.backend)
    }

    /// An empty draft for the configured user and test.
    #[must_use]
    pub fn new_configuration(&self) -> ExamConfiguration {
        ExamConfiguration::new(self.user_id, self.test_id.clone())
    }

    /// A fresh controller per mounted exam view.
    #[must_use]
    pub fn new_controller(&self) -> ExamSessionController {
        ExamSessionController::new(self.clock, self.backend(), self.user_id, self.grading)
            .with_shuffle_questions(self.shuffle_questions)
    }
}

// This context is provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
