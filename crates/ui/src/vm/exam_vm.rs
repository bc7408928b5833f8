use exam_core::model::{
    AnswerRecord, ExamConfiguration, OptionId, QuestionId, SessionResult, SubjectId,
    SubjectSelector, TestSession,
};
use services::{ExamPhase, ExamProgress, ExamSessionController};

use crate::vm::markdown_vm::markdown_to_html;
use crate::vm::time_fmt::{format_countdown, format_datetime};

/// Countdown turns urgent below this many seconds.
pub const URGENT_SECONDS: u32 = 60;

//
// ─── SUBJECT PICKER ────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectOptionVm {
    pub id: SubjectId,
    pub name: String,
    pub selected: bool,
}

impl SubjectOptionVm {
    #[must_use]
    pub fn selector(&self) -> SubjectSelector {
        SubjectSelector::new(self.id, self.name.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectPickerVm {
    pub options: Vec<SubjectOptionVm>,
    pub selected_count: usize,
    pub can_start: bool,
    pub summary_label: String,
}

/// Offered subjects in listing order, followed by any selected subject the
/// listing did not include.
#[must_use]
pub fn map_subject_picker(
    available: &[SubjectSelector],
    draft: &ExamConfiguration,
    busy: bool,
) -> SubjectPickerVm {
    let mut options: Vec<SubjectOptionVm> = available
        .iter()
        .map(|subject| SubjectOptionVm {
            id: subject.subject_id,
            name: subject.subject_name.clone(),
            selected: draft.is_selected(subject.subject_id),
        })
        .collect();
    for subject in draft.selected_subjects() {
        if !available.iter().any(|s| s.subject_id == subject.subject_id) {
            options.push(SubjectOptionVm {
                id: subject.subject_id,
                name: subject.subject_name.clone(),
                selected: true,
            });
        }
    }

    let selected_count = draft.selected_subjects().len();
    let summary_label = match selected_count {
        0 => "No subjects selected".to_string(),
        1 => "1 subject selected".to_string(),
        n => format!("{n} subjects selected"),
    };
    SubjectPickerVm {
        options,
        selected_count,
        can_start: selected_count > 0 && !busy,
        summary_label,
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub id: OptionId,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionCardVm {
    pub id: QuestionId,
    pub number_label: String,
    pub subject_name: String,
    pub prompt_html: String,
    pub options: Vec<OptionVm>,
    pub answered: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizVm {
    pub questions: Vec<QuestionCardVm>,
    pub progress_label: String,
    /// `None` for untimed tests.
    pub countdown_label: Option<String>,
    pub is_urgent: bool,
    pub is_time_up: bool,
    /// Grading is in flight.
    pub is_submitting: bool,
}

impl QuizVm {
    /// Options stop accepting clicks once time is up or grading started.
    #[must_use]
    pub fn answers_locked(&self) -> bool {
        self.is_time_up || self.is_submitting
    }
}

#[must_use]
pub fn progress_label(progress: &ExamProgress) -> String {
    format!("{} / {} answered", progress.answered, progress.total)
}

#[must_use]
pub fn map_question_cards(
    config: &ExamConfiguration,
    session: &TestSession,
    answers: &AnswerRecord,
) -> Vec<QuestionCardVm> {
    let total = session.question_count();
    session
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = answers.selected(question.id());
            QuestionCardVm {
                id: question.id(),
                number_label: format!("Question {} of {total}", index + 1),
                subject_name: config
                    .subject_name(question.subject_id())
                    .unwrap_or_default()
                    .to_string(),
                prompt_html: markdown_to_html(question.prompt()),
                options: question
                    .options()
                    .iter()
                    .map(|option| OptionVm {
                        id: option.id,
                        text: option.text.clone(),
                        selected: selected == Some(option.id),
                    })
                    .collect(),
                answered: selected.is_some(),
            }
        })
        .collect()
}

#[must_use]
pub fn map_quiz(
    config: &ExamConfiguration,
    session: &TestSession,
    answers: &AnswerRecord,
    progress: &ExamProgress,
    is_submitting: bool,
) -> QuizVm {
    QuizVm {
        questions: map_question_cards(config, session, answers),
        progress_label: progress_label(progress),
        countdown_label: progress.remaining_seconds.map(format_countdown),
        is_urgent: progress
            .remaining_seconds
            .is_some_and(|secs| secs < URGENT_SECONDS),
        is_time_up: progress.is_time_up,
        is_submitting,
    }
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionStatus {
    Correct,
    Incorrect,
    Unanswered,
}

impl CorrectionStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
            Self::Unanswered => "Unanswered",
        }
    }

    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Correct => "correction correct",
            Self::Incorrect => "correction incorrect",
            Self::Unanswered => "correction unanswered",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrectionRowVm {
    pub id: QuestionId,
    pub number_label: String,
    pub prompt_html: String,
    pub selected_text: String,
    pub correct_text: String,
    pub status: CorrectionStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectRowVm {
    pub name: String,
    pub score_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultVm {
    pub score_label: String,
    pub percentage_label: String,
    pub breakdown_label: String,
    pub completed_label: String,
    pub subjects: Vec<SubjectRowVm>,
    pub corrections: Vec<CorrectionRowVm>,
}

/// Build the result screen. Corrections follow the order questions were shown.
#[must_use]
pub fn map_result(session: &TestSession, result: &SessionResult) -> ResultVm {
    let total = result.total_questions();
    let unanswered = result.unanswered();
    let incorrect = total.saturating_sub(result.score()).saturating_sub(unanswered);

    let corrections = session
        .questions()
        .iter()
        .enumerate()
        .filter_map(|(index, question)| {
            let correction = result.correction(question.id())?;
            let option_text = |id: OptionId| {
                question
                    .options()
                    .iter()
                    .find(|option| option.id == id)
                    .map_or_else(|| id.to_string(), |option| option.text.clone())
            };
            let status = if correction.is_unanswered() {
                CorrectionStatus::Unanswered
            } else if correction.is_correct() {
                CorrectionStatus::Correct
            } else {
                CorrectionStatus::Incorrect
            };
            Some(CorrectionRowVm {
                id: question.id(),
                number_label: format!("Question {}", index + 1),
                prompt_html: markdown_to_html(question.prompt()),
                selected_text: correction
                    .selected
                    .map_or_else(|| "No answer".to_string(), option_text),
                correct_text: option_text(correction.correct),
                status,
            })
        })
        .collect();

    ResultVm {
        score_label: format!("{} / {total}", result.score()),
        percentage_label: format!("{:.0}%", result.percentage()),
        breakdown_label: format!(
            "{} correct, {incorrect} incorrect, {unanswered} unanswered",
            result.score()
        ),
        completed_label: format!("Completed {}", format_datetime(result.completed_at())),
        subjects: result
            .per_subject()
            .iter()
            .map(|subject| SubjectRowVm {
                name: subject.subject_name.clone(),
                score_label: format!("{} / {}", subject.correct, subject.total),
            })
            .collect(),
        corrections,
    }
}

//
// ─── SCREEN ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamScreenVm {
    Configure {
        picker: SubjectPickerVm,
        /// The last submission failed and can be retried as-is.
        can_retry: bool,
    },
    Starting,
    Quiz(QuizVm),
    Result(ResultVm),
}

/// Pick the screen for the controller's current phase.
#[must_use]
pub fn map_exam_screen(
    controller: &ExamSessionController,
    available: &[SubjectSelector],
    draft: &ExamConfiguration,
) -> ExamScreenVm {
    let phase = controller.phase();
    let state = controller.state();
    match phase {
        ExamPhase::Configuring | ExamPhase::SubmitFailed => ExamScreenVm::Configure {
            picker: map_subject_picker(available, draft, false),
            can_retry: phase == ExamPhase::SubmitFailed,
        },
        ExamPhase::Submitting => ExamScreenVm::Starting,
        ExamPhase::Active | ExamPhase::Grading => {
            match (
                state.configuration(),
                state.test_session(),
                state.answers(),
                controller.progress(),
            ) {
                (Some(config), Some(session), Some(answers), Some(progress)) => {
                    ExamScreenVm::Quiz(map_quiz(
                        config,
                        session,
                        answers,
                        &progress,
                        phase == ExamPhase::Grading,
                    ))
                }
                _ => ExamScreenVm::Starting,
            }
        }
        ExamPhase::Completed => match (state.test_session(), state.result()) {
            (Some(session), Some(result)) => ExamScreenVm::Result(map_result(session, result)),
            _ => ExamScreenVm::Starting,
        },
    }
}
