use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{SubjectId, TestId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("select at least one subject")]
    NoSubjects,

    #[error("test id is missing")]
    MissingTestId,

    #[error("subject {0} is selected more than once")]
    DuplicateSubject(SubjectId),
}

/// A subject the test-taker can include in a generated test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSelector {
    pub subject_id: SubjectId,
    pub subject_name: String,
}

impl SubjectSelector {
    #[must_use]
    pub fn new(subject_id: SubjectId, subject_name: impl Into<String>) -> Self {
        Self {
            subject_id,
            subject_name: subject_name.into(),
        }
    }
}

/// Parameters picked on the selection form that define which test to generate.
///
/// Subjects keep the order in which they were selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfiguration {
    user_id: UserId,
    test_id: TestId,
    selected_subjects: Vec<SubjectSelector>,
}

impl ExamConfiguration {
    /// Create a configuration with no subjects selected yet.
    #[must_use]
    pub fn new(user_id: UserId, test_id: TestId) -> Self {
        Self {
            user_id,
            test_id,
            selected_subjects: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: SubjectSelector) -> Self {
        self.select_subject(subject);
        self
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
    pub fn selected_subjects(&self) -> &[SubjectSelector] {
        &self.selected_subjects
    }

    #[must_use]
    pub fn is_selected(&self, subject_id: SubjectId) -> bool {
        self.selected_subjects
            .iter()
            .any(|subject| subject.subject_id == subject_id)
    }

    /// Add a subject unless one with the same id is already selected.
    ///
    /// Returns `true` when the subject was added.
    pub fn select_subject(&mut self, subject: SubjectSelector) -> bool {
        if self.is_selected(subject.subject_id) {
            return false;
        }
        self.selected_subjects.push(subject);
        true
    }

    /// Remove a subject by id. Returns `true` when something was removed.
    pub fn deselect_subject(&mut self, subject_id: SubjectId) -> bool {
        let before = self.selected_subjects.len();
        self.selected_subjects
            .retain(|subject| subject.subject_id != subject_id);
        before != self.selected_subjects.len()
    }

    /// Select the subject if absent, deselect it if present.
    pub fn toggle_subject(&mut self, subject: SubjectSelector) {
        if !self.deselect_subject(subject.subject_id) {
            self.selected_subjects.push(subject);
        }
    }

    /// Name of a configured subject, if present.
    #[must_use]
    pub fn subject_name(&self, subject_id: SubjectId) -> Option<&str> {
        self.selected_subjects
            .iter()
            .find(|subject| subject.subject_id == subject_id)
            .map(|subject| subject.subject_name.as_str())
    }

    /// Check the configuration can be submitted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingTestId` for a blank test id,
    /// `ConfigurationError::NoSubjects` for an empty subject list and
    /// `ConfigurationError::DuplicateSubject` if a subject id repeats.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.test_id.is_blank() {
            return Err(ConfigurationError::MissingTestId);
        }
        if self.selected_subjects.is_empty() {
            return Err(ConfigurationError::NoSubjects);
        }
        for (index, subject) in self.selected_subjects.iter().enumerate() {
            if self.selected_subjects[..index]
                .iter()
                .any(|earlier| earlier.subject_id == subject.subject_id)
            {
                return Err(ConfigurationError::DuplicateSubject(subject.subject_id));
            }
        }
        Ok(())
    }
}
