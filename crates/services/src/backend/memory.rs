use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use exam_core::model::{SubjectSelector, TestId};

use super::ExamBackend;
use super::wire::{
    CorrectionPayload, GenerateTestRequest, GradeResponse, GradeTestRequest, QuestionPayload,
    TestPayload,
};
use crate::error::BackendError;

#[derive(Debug, Default)]
struct BankState {
    subjects: Vec<SubjectSelector>,
    questions: Vec<QuestionPayload>,
    duration_seconds: u32,
    ship_answer_key: bool,
    generate_failures: VecDeque<String>,
    grade_failures: VecDeque<String>,
    generate_calls: usize,
    grade_calls: usize,
    last_generate: Option<GenerateTestRequest>,
    last_grade: Option<GradeTestRequest>,
}

/// In-process `ExamBackend` backed by a fixed question bank.
///
/// Generated tests contain every bank question whose subject was requested.
/// Failures can be scripted per call for exercising retry paths.
#[derive(Clone, Default)]
pub struct InMemoryExamBackend {
    state: Arc<Mutex<BankState>>,
}

impl InMemoryExamBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subject(self, subject: SubjectSelector) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.subjects.push(subject);
        }
        self
    }

    /// Add a question to the bank. Its answer key is kept server-side unless
    /// `with_answer_key(true)` is set.
    #[must_use]
    pub fn with_question(self, question: QuestionPayload) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.questions.push(question);
        }
        self
    }

    #[must_use]
    pub fn with_duration_seconds(self, duration_seconds: u32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.duration_seconds = duration_seconds;
        }
        self
    }

    /// Ship `correctOptionId` with generated questions.
    #[must_use]
    pub fn with_answer_key(self, ship: bool) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.ship_answer_key = ship;
        }
        self
    }

    /// Make the next `generate_test` call fail with `BackendError::Unavailable`.
    pub fn fail_next_generate(&self, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.generate_failures.push_back(message.into());
        }
    }

    /// Make the next `grade_test` call fail with `BackendError::Unavailable`.
    pub fn fail_next_grade(&self, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.grade_failures.push_back(message.into());
        }
    }

    #[must_use]
    pub fn generate_calls(&self) -> usize {
        self.state.lock().map_or(0, |state| state.generate_calls)
    }

    #[must_use]
    pub fn grade_calls(&self) -> usize {
        self.state.lock().map_or(0, |state| state.grade_calls)
    }

    #[must_use]
    pub fn last_generate_request(&self) -> Option<GenerateTestRequest> {
        self.state.lock().ok().and_then(|state| state.last_generate.clone())
    }

    #[must_use]
    pub fn last_grade_request(&self) -> Option<GradeTestRequest> {
        self.state.lock().ok().and_then(|state| state.last_grade.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BankState>, BackendError> {
        self.state
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl ExamBackend for InMemoryExamBackend {
    async fn list_subjects(&self, _test_id: &TestId) -> Result<Vec<SubjectSelector>, BackendError> {
        Ok(self.lock()?.subjects.clone())
    }

    async fn generate_test(
        &self,
        request: &GenerateTestRequest,
    ) -> Result<TestPayload, BackendError> {
        let mut state = self.lock()?;
        state.generate_calls += 1;
        state.last_generate = Some(request.clone());
        if let Some(message) = state.generate_failures.pop_front() {
            return Err(BackendError::Unavailable(message));
        }

        let ship_answer_key = state.ship_answer_key;
        let questions = state
            .questions
            .iter()
            .filter(|question| {
                request
                    .subjects
                    .iter()
                    .any(|subject| subject.subject_id == question.subject_id)
            })
            .map(|question| QuestionPayload {
                correct_option_id: question.correct_option_id.filter(|_| ship_answer_key),
                ..question.clone()
            })
            .collect();

        Ok(TestPayload {
            test_id: request.test_id.clone(),
            questions,
            duration_seconds: state.duration_seconds,
        })
    }

    async fn grade_test(&self, request: &GradeTestRequest) -> Result<GradeResponse, BackendError> {
        let mut state = self.lock()?;
        state.grade_calls += 1;
        state.last_grade = Some(request.clone());
        if let Some(message) = state.grade_failures.pop_front() {
            return Err(BackendError::Unavailable(message));
        }

        // Grades whatever questions were generated for the requested subjects; the
        // controller rejects corrections for questions outside its session.
        let subjects: Vec<_> = state
            .last_generate
            .as_ref()
            .map(|generate| generate.subjects.iter().map(|s| s.subject_id).collect())
            .unwrap_or_default();

        let mut corrections = Vec::new();
        for question in state
            .questions
            .iter()
            .filter(|question| subjects.contains(&question.subject_id))
        {
            let Some(correct) = question.correct_option_id else {
                return Err(BackendError::Unavailable(format!(
                    "question {} has no answer key",
                    question.id
                )));
            };
            let selected = request
                .answers
                .iter()
                .find(|answer| answer.question_id == question.id)
                .map(|answer| answer.option_id);
            corrections.push(CorrectionPayload {
                question_id: question.id,
                selected,
                correct,
            });
        }

        let score = corrections
            .iter()
            .filter(|c| c.selected == Some(c.correct))
            .count();
        Ok(GradeResponse {
            score: u32::try_from(score).unwrap_or(u32::MAX),
            total_questions: u32::try_from(corrections.len()).unwrap_or(u32::MAX),
            corrections,
        })
    }
}
