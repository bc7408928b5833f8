use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{
    AttemptId, ExamConfiguration, Question, QuestionError, QuestionId, SubjectId, TestId,
};

/// Reasons a generated test returned by the backend cannot start a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("the generated test contains no questions")]
    NoQuestions,

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {question} belongs to subject {subject}, which was not selected")]
    UnexpectedSubject {
        question: QuestionId,
        subject: SubjectId,
    },

    #[error("expected test {expected}, backend returned {actual}")]
    TestMismatch { expected: TestId, actual: TestId },

    #[error("question {0} was sent without its answer key")]
    MissingAnswerKey(QuestionId),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// The concrete question set and timing of one attempt.
///
/// Read-only once created; answers are tracked separately in `AnswerRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSession {
    attempt_id: AttemptId,
    test_id: TestId,
    questions: Vec<Question>,
    duration_seconds: u32,
    started_at: DateTime<Utc>,
}

impl TestSession {
    /// Build a session from a generated test, checking it against the configuration
    /// that requested it.
    ///
    /// The question count is taken from the payload as-is; subjects without
    /// available questions simply contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` if the test is empty, question ids repeat, the test id
    /// differs from the configured one, or a question belongs to a subject that was
    /// not selected.
    pub fn from_payload(
        config: &ExamConfiguration,
        test_id: TestId,
        questions: Vec<Question>,
        duration_seconds: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Self, PayloadError> {
        if &test_id != config.test_id() {
            return Err(PayloadError::TestMismatch {
                expected: config.test_id().clone(),
                actual: test_id,
            });
        }
        if questions.is_empty() {
            return Err(PayloadError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(PayloadError::DuplicateQuestion(question.id()));
            }
            if !config.is_selected(question.subject_id()) {
                return Err(PayloadError::UnexpectedSubject {
                    question: question.id(),
                    subject: question.subject_id(),
                });
            }
        }

        Ok(Self {
            attempt_id: AttemptId::generate(),
            test_id,
            questions,
            duration_seconds,
            started_at,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id() == id)
    }

    #[must_use]
    pub fn contains_question(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }

    /// Zero means the session is untimed.
    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.duration_seconds > 0
    }

    /// # Errors
    ///
    /// Returns `PayloadError::MissingAnswerKey` for the first question without one.
    pub fn require_answer_key(&self) -> Result<(), PayloadError> {
        match self
            .questions
            .iter()
            .find(|question| question.correct_option_id().is_none())
        {
            Some(question) => Err(PayloadError::MissingAnswerKey(question.id())),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.is_timed()
            .then(|| self.started_at + Duration::seconds(i64::from(self.duration_seconds)))
    }

    /// Whole seconds left at `now`, saturating at zero. `None` when untimed.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<u32> {
        let deadline = self.deadline()?;
        let left = (deadline - now).num_seconds().max(0);
        Some(u32::try_from(left).unwrap_or(self.duration_seconds))
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Reorder questions, keeping the set unchanged.
    pub fn reorder_questions(&mut self, reorder: impl FnOnce(&mut [Question])) {
        reorder(&mut self.questions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OptionId, QuizOption, SubjectSelector, UserId};
    use crate::time::fixed_now;

    fn config() -> ExamConfiguration {
        ExamConfiguration::new(UserId::new(7), TestId::new("abc"))
            .with_subject(SubjectSelector::new(SubjectId::new(1), "Maths"))
    }

    fn question(id: u64, subject: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            SubjectId::new(subject),
            format!("Q{id}"),
            vec![
                QuizOption::new(OptionId::new(1), "a"),
                QuizOption::new(OptionId::new(2), "b"),
            ],
            Some(OptionId::new(1)),
        )
        .unwrap()
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = TestSession::from_payload(&config(), TestId::new("abc"), Vec::new(), 60, fixed_now())
            .unwrap_err();
        assert_eq!(err, PayloadError::NoQuestions);
    }

    #[test]
    fn unselected_subject_is_rejected() {
        let err = TestSession::from_payload(
            &config(),
            TestId::new("abc"),
            vec![question(1, 1), question(2, 5)],
            60,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PayloadError::UnexpectedSubject {
                question: QuestionId::new(2),
                subject: SubjectId::new(5),
            }
        );
    }

    #[test]
    fn duplicate_questions_are_rejected() {
        let err = TestSession::from_payload(
            &config(),
            TestId::new("abc"),
            vec![question(1, 1), question(1, 1)],
            60,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, PayloadError::DuplicateQuestion(QuestionId::new(1)));
    }

    #[test]
    fn other_test_id_is_rejected() {
        let err = TestSession::from_payload(
            &config(),
            TestId::new("xyz"),
            vec![question(1, 1)],
            60,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, PayloadError::TestMismatch { .. }));
    }

    #[test]
    fn countdown_saturates_at_zero() {
        let session = TestSession::from_payload(
            &config(),
            TestId::new("abc"),
            vec![question(1, 1)],
            90,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(session.remaining_seconds(fixed_now()), Some(90));
        assert_eq!(
            session.remaining_seconds(fixed_now() + Duration::seconds(30)),
            Some(60)
        );
        assert!(!session.is_expired_at(fixed_now() + Duration::seconds(89)));
        assert!(session.is_expired_at(fixed_now() + Duration::seconds(90)));
        assert_eq!(
            session.remaining_seconds(fixed_now() + Duration::seconds(500)),
            Some(0)
        );
    }

    #[test]
    fn untimed_session_never_expires() {
        let session = TestSession::from_payload(
            &config(),
            TestId::new("abc"),
            vec![question(1, 1)],
            0,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(session.deadline(), None);
        assert_eq!(session.remaining_seconds(fixed_now()), None);
        assert!(!session.is_expired_at(fixed_now() + Duration::days(3)));
    }
}
