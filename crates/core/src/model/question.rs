use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{OptionId, QuestionId, SubjectId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {question} lists option {option} more than once")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("question {question} marks unknown option {option} as correct")]
    UnknownCorrectOption {
        question: QuestionId,
        option: OptionId,
    },
}

/// One selectable answer of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    pub text: String,
}

impl QuizOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// A multiple-choice question of a generated test.
///
/// `correct_option_id` is only known when the backend ships the answer key
/// with the test; otherwise grading happens server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    subject_id: SubjectId,
    prompt: String,
    options: Vec<QuizOption>,
    correct_option_id: Option<OptionId>,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError` if there are no options, option ids repeat,
    /// or the correct option is not one of the options.
    pub fn new(
        id: QuestionId,
        subject_id: SubjectId,
        prompt: impl Into<String>,
        options: Vec<QuizOption>,
        correct_option_id: Option<OptionId>,
    ) -> Result<Self, QuestionError> {
        if options.is_empty() {
            return Err(QuestionError::NoOptions(id));
        }
        for (index, option) in options.iter().enumerate() {
            if options[..index].iter().any(|earlier| earlier.id == option.id) {
                return Err(QuestionError::DuplicateOption {
                    question: id,
                    option: option.id,
                });
            }
        }
        if let Some(correct) = correct_option_id {
            if !options.iter().any(|option| option.id == correct) {
                return Err(QuestionError::UnknownCorrectOption {
                    question: id,
                    option: correct,
                });
            }
        }

        Ok(Self {
            id,
            subject_id,
            prompt: prompt.into(),
            options,
            correct_option_id,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_option_id(&self) -> Option<OptionId> {
        self.correct_option_id
    }

    #[must_use]
    pub fn has_option(&self, option_id: OptionId) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }

    /// `None` when no answer key was shipped for this question.
    #[must_use]
    pub fn is_correct(&self, selected: OptionId) -> Option<bool> {
        self.correct_option_id.map(|correct| correct == selected)
    }
}
