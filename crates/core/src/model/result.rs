use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{
    AnswerRecord, AttemptId, ExamConfiguration, OptionId, QuestionId, SubjectId, TestSession,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("question {0} has no answer key")]
    MissingAnswerKey(QuestionId),

    #[error("no correction returned for question {0}")]
    MissingCorrection(QuestionId),

    #[error("correction returned for unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("reported score {reported} does not match {computed} correct answers")]
    ScoreMismatch { reported: u32, computed: u32 },

    #[error("reported total {reported} does not match {actual} questions")]
    TotalMismatch { reported: u32, actual: u32 },

    #[error("correction for question {0} does not match the recorded answer")]
    SelectionMismatch(QuestionId),

    #[error("correct option {option} is not an option of question {question}")]
    UnknownCorrectOption {
        question: QuestionId,
        option: OptionId,
    },
}

/// What the test-taker picked for a question versus the right answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub selected: Option<OptionId>,
    pub correct: OptionId,
}

impl Correction {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.selected == Some(self.correct)
    }

    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        self.selected.is_none()
    }
}

/// Score for one configured subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectScore {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub correct: u32,
    pub total: u32,
}

/// Final scored outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    attempt_id: AttemptId,
    score: u32,
    total_questions: u32,
    per_subject: Vec<SubjectScore>,
    corrections: BTreeMap<QuestionId, Correction>,
    completed_at: DateTime<Utc>,
}

impl SessionResult {
    /// Grade locally using the answer key shipped with the test.
    ///
    /// Unanswered questions count as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::MissingAnswerKey` if any question lacks a correct option.
    pub fn grade(
        config: &ExamConfiguration,
        session: &TestSession,
        answers: &AnswerRecord,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        let mut corrections = BTreeMap::new();
        for question in session.questions() {
            let correct = question
                .correct_option_id()
                .ok_or(ResultError::MissingAnswerKey(question.id()))?;
            corrections.insert(
                question.id(),
                Correction {
                    selected: answers.selected(question.id()),
                    correct,
                },
            );
        }
        Self::from_corrections(config, session, answers, corrections, completed_at)
    }

    /// Assemble a result from per-question corrections (e.g. returned by a grading
    /// backend). Score and subject breakdown are derived from the corrections.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` when corrections are missing for a question, refer to
    /// a question outside the session, disagree with `answers`, or name a correct
    /// option the question does not have.
    pub fn from_corrections(
        config: &ExamConfiguration,
        session: &TestSession,
        answers: &AnswerRecord,
        corrections: BTreeMap<QuestionId, Correction>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if let Some(unknown) = corrections
            .keys()
            .find(|id| !session.contains_question(**id))
        {
            return Err(ResultError::UnknownQuestion(*unknown));
        }

        let mut per_subject: Vec<SubjectScore> = config
            .selected_subjects()
            .iter()
            .map(|subject| SubjectScore {
                subject_id: subject.subject_id,
                subject_name: subject.subject_name.clone(),
                correct: 0,
                total: 0,
            })
            .collect();

        let mut score = 0_u32;
        for question in session.questions() {
            let correction = corrections
                .get(&question.id())
                .ok_or(ResultError::MissingCorrection(question.id()))?;
            if correction.selected != answers.selected(question.id()) {
                return Err(ResultError::SelectionMismatch(question.id()));
            }
            if !question.has_option(correction.correct) {
                return Err(ResultError::UnknownCorrectOption {
                    question: question.id(),
                    option: correction.correct,
                });
            }
            let hit = correction.is_correct();
            if hit {
                score = score.saturating_add(1);
            }
            if let Some(subject) = per_subject
                .iter_mut()
                .find(|subject| subject.subject_id == question.subject_id())
            {
                subject.total = subject.total.saturating_add(1);
                if hit {
                    subject.correct = subject.correct.saturating_add(1);
                }
            }
        }

        let total_questions = u32::try_from(session.question_count()).unwrap_or(u32::MAX);

        Ok(Self {
            attempt_id: session.attempt_id(),
            score,
            total_questions,
            per_subject,
            corrections,
            completed_at,
        })
    }

    /// Check totals reported by a grading backend against the derived ones.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::ScoreMismatch` or `ResultError::TotalMismatch`.
    pub fn verify_reported(&self, score: u32, total_questions: u32) -> Result<(), ResultError> {
        if total_questions != self.total_questions {
            return Err(ResultError::TotalMismatch {
                reported: total_questions,
                actual: self.total_questions,
            });
        }
        if score != self.score {
            return Err(ResultError::ScoreMismatch {
                reported: score,
                computed: self.score,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn per_subject(&self) -> &[SubjectScore] {
        &self.per_subject
    }

    #[must_use]
    pub fn corrections(&self) -> &BTreeMap<QuestionId, Correction> {
        &self.corrections
    }

    #[must_use]
    pub fn correction(&self, question_id: QuestionId) -> Option<&Correction> {
        self.corrections.get(&question_id)
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn unanswered(&self) -> u32 {
        let count = self
            .corrections
            .values()
            .filter(|correction| correction.is_unanswered())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Score as a percentage in `0.0..=100.0`.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.total_questions)
    }
}
