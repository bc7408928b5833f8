//! JSON shapes exchanged with the exam backend.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use exam_core::model::{
    AnswerRecord, AttemptId, Correction, ExamConfiguration, OptionId, PayloadError, Question,
    QuestionId, QuizOption, SessionResult, SubjectId, SubjectSelector, TestId, TestSession, UserId,
};

use crate::error::BackendError;

/// Body of the test generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestRequest {
    pub user_id: UserId,
    pub test_id: TestId,
    pub subjects: Vec<SubjectSelector>,
}

impl GenerateTestRequest {
    #[must_use]
    pub fn from_configuration(config: &ExamConfiguration) -> Self {
        Self {
            user_id: config.user_id(),
            test_id: config.test_id().clone(),
            subjects: config.selected_subjects().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub id: QuestionId,
    pub subject_id: SubjectId,
    pub prompt: String,
    pub options: Vec<QuizOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<OptionId>,
}

/// A generated test as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPayload {
    pub test_id: TestId,
    pub questions: Vec<QuestionPayload>,
    #[serde(default)]
    pub duration_seconds: u32,
}

impl TestPayload {
    /// Validate the payload against the configuration that requested it.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` for malformed questions or a question set that does
    /// not match the configuration.
    pub fn into_session(
        self,
        config: &ExamConfiguration,
        started_at: DateTime<Utc>,
    ) -> Result<TestSession, PayloadError> {
        let questions = self
            .questions
            .into_iter()
            .map(|q| Question::new(q.id, q.subject_id, q.prompt, q.options, q.correct_option_id))
            .collect::<Result<Vec<_>, _>>()?;
        TestSession::from_payload(
            config,
            self.test_id,
            questions,
            self.duration_seconds,
            started_at,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

/// Body of the grading request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeTestRequest {
    pub test_id: TestId,
    pub attempt_id: AttemptId,
    pub answers: Vec<AnswerPayload>,
}

impl GradeTestRequest {
    /// Answers are sorted by question id so the body is stable.
    #[must_use]
    pub fn new(session: &TestSession, answers: &AnswerRecord) -> Self {
        let mut answers: Vec<_> = answers
            .iter()
            .map(|(question_id, option_id)| AnswerPayload {
                question_id,
                option_id,
            })
            .collect();
        answers.sort_by_key(|answer| answer.question_id);
        Self {
            test_id: session.test_id().clone(),
            attempt_id: session.attempt_id(),
            answers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionPayload {
    pub question_id: QuestionId,
    #[serde(default)]
    pub selected: Option<OptionId>,
    pub correct: OptionId,
}

/// Scored result as returned by the grading endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResponse {
    pub score: u32,
    pub total_questions: u32,
    pub corrections: Vec<CorrectionPayload>,
}

impl GradeResponse {
    /// Turn the backend's corrections into a `SessionResult`, cross-checking the
    /// reported totals.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidResult` when corrections are incomplete,
    /// contradict the submitted answers, or disagree with the reported score.
    pub fn into_result(
        self,
        config: &ExamConfiguration,
        session: &TestSession,
        answers: &AnswerRecord,
        completed_at: DateTime<Utc>,
    ) -> Result<SessionResult, BackendError> {
        let corrections: BTreeMap<_, _> = self
            .corrections
            .into_iter()
            .map(|c| {
                (
                    c.question_id,
                    Correction {
                        selected: c.selected,
                        correct: c.correct,
                    },
                )
            })
            .collect();
        let result = SessionResult::from_corrections(config, session, answers, corrections, completed_at)?;
        result.verify_reported(self.score, self.total_questions)?;
        Ok(result)
    }
}
