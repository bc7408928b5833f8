use std::collections::HashMap;

use crate::model::{OptionId, QuestionId};

/// The test-taker's in-progress selections, one option per question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerRecord {
    selections: HashMap<QuestionId, OptionId>,
}

impl AnswerRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the selection for a question, replacing any earlier one.
    ///
    /// Returns the previous selection, if any.
    pub fn record(&mut self, question_id: QuestionId, option_id: OptionId) -> Option<OptionId> {
        self.selections.insert(question_id, option_id)
    }

    #[must_use]
    pub fn selected(&self, question_id: QuestionId) -> Option<OptionId> {
        self.selections.get(&question_id).copied()
    }

    #[must_use]
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.selections.contains_key(&question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, OptionId)> + '_ {
        self.selections.iter().map(|(q, o)| (*q, *o))
    }
}
