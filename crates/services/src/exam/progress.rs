/// Aggregated view of an active attempt, sized from the questions actually returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    /// `None` for untimed tests.
    pub remaining_seconds: Option<u32>,
    pub is_time_up: bool,
}
