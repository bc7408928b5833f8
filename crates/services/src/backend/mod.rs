mod http;
mod memory;
mod wire;

use async_trait::async_trait;

use exam_core::model::{SubjectSelector, TestId};

use crate::error::BackendError;

pub use http::HttpExamBackend;
pub use memory::InMemoryExamBackend;
pub use wire::{
    AnswerPayload, CorrectionPayload, GenerateTestRequest, GradeResponse, GradeTestRequest,
    QuestionPayload, TestPayload,
};

/// Contract for the remote service that generates and grades tests.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Subjects that can be selected for a test.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn list_subjects(&self, test_id: &TestId) -> Result<Vec<SubjectSelector>, BackendError>;

    /// Generate a question set for the requested subjects.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn generate_test(&self, request: &GenerateTestRequest)
    -> Result<TestPayload, BackendError>;

    /// Score a submitted answer record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn grade_test(&self, request: &GradeTestRequest) -> Result<GradeResponse, BackendError>;
}
