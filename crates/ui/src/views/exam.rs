#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;
use std::time::Duration;

use dioxus::prelude::*;
use exam_core::model::{ExamConfiguration, OptionId, QuestionId, SubjectSelector};
use services::{ExamPhase, ExamSessionController, GradingStep};
use tracing::{info, warn};

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    ExamScreenVm, QuestionCardVm, QuizVm, ResultVm, SubjectOptionVm, SubjectPickerVm,
    map_exam_screen,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamIntent {
    ToggleSubject(SubjectSelector),
    Start,
    RetrySubmission,
    CancelSubmission,
    Answer {
        question: QuestionId,
        option: OptionId,
    },
    SubmitAnswers,
    Retake,
    NewTest,
}

/// Signals shared by the exam view and the tasks it spawns.
#[derive(Clone, Copy)]
struct ExamSignals {
    controller: Signal<ExamSessionController>,
    draft: Signal<ExamConfiguration>,
    error: Signal<Option<ViewError>>,
}

impl ExamSignals {
    fn apply(mut self, ctx: &AppContext, intent: ExamIntent) {
        match intent {
            ExamIntent::ToggleSubject(subject) => {
                if !self.controller.read().is_busy() {
                    self.draft.write().toggle_subject(subject);
                    if *self.error.peek() == Some(ViewError::NoSubjectSelected) {
                        self.error.set(None);
                    }
                }
            }
            ExamIntent::Start => {
                let config = self.draft.read().clone();
                self.start(config);
            }
            ExamIntent::RetrySubmission => {
                let previous = self.controller.read().configuration().cloned();
                if let Some(config) = previous {
                    self.start(config);
                }
            }
            ExamIntent::CancelSubmission => {
                self.controller.write().abandon();
                self.error.set(None);
            }
            ExamIntent::Answer { question, option } => {
                let recorded = self.controller.write().record_answer(question, option);
                if let Err(err) = recorded {
                    self.error.set(ViewError::from_exam(&err));
                }
            }
            ExamIntent::SubmitAnswers => self.submit_answers(),
            ExamIntent::Retake => {
                let previous = self.controller.read().configuration().cloned();
                let reset = self.controller.write().reset_session();
                match (reset, previous) {
                    (Ok(()), Some(config)) => self.start(config),
                    (Ok(()), None) => {}
                    (Err(err), _) => self.error.set(ViewError::from_exam(&err)),
                }
            }
            ExamIntent::NewTest => {
                let reset = self.controller.write().reset_session();
                match reset {
                    Ok(()) => {
                        self.draft.set(ctx.new_configuration());
                        self.error.set(None);
                    }
                    Err(err) => self.error.set(ViewError::from_exam(&err)),
                }
            }
        }
    }

    fn start(mut self, config: ExamConfiguration) {
        let begun = self.controller.write().begin_submission(config);
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(err) => {
                self.error.set(ViewError::from_exam(&err));
                return;
            }
        };
        self.error.set(None);

        let backend = self.controller.read().backend();
        let mut signals = self;
        spawn(async move {
            let outcome = backend.generate_test(&ticket.request).await;
            let applied = signals
                .controller
                .write()
                .complete_submission(ticket.generation, outcome);
            if let Err(err) = applied {
                signals.error.set(ViewError::from_exam(&err));
            }
        });
    }

    /// Refresh the countdown and submit once it reaches zero. A grading failure
    /// waits for the user to retry.
    fn countdown_tick(self, mut tick: Signal<u64>) {
        let (active, time_up) = {
            let controller = self.controller.read();
            (controller.phase() == ExamPhase::Active, controller.is_time_up())
        };
        if !active {
            return;
        }
        *tick.write() += 1;
        let grading_failed = matches!(*self.error.peek(), Some(ViewError::GradingFailed));
        if time_up && !grading_failed {
            info!("time is up, submitting answers");
            self.submit_answers();
        }
    }

    fn submit_answers(mut self) {
        let step = self.controller.write().begin_grading();
        match step {
            Ok(GradingStep::Completed) => self.error.set(None),
            Ok(GradingStep::Pending(ticket)) => {
                self.error.set(None);
                let backend = self.controller.read().backend();
                let mut signals = self;
                spawn(async move {
                    let outcome = backend.grade_test(&ticket.request).await;
                    let applied = signals
                        .controller
                        .write()
                        .complete_grading(ticket.generation, outcome);
                    if let Err(err) = applied {
                        signals.error.set(ViewError::from_exam(&err));
                    }
                });
            }
            Err(err) => self.error.set(ViewError::from_exam(&err)),
        }
    }
}

#[component]
pub fn ExamView() -> Element {
    let ctx = use_context::<AppContext>();

    let controller = {
        let ctx = ctx.clone();
        use_signal(move || ctx.new_controller())
    };
    let draft = {
        let ctx = ctx.clone();
        use_signal(move || ctx.new_configuration())
    };
    let error = use_signal(|| None::<ViewError>);
    let tick = use_signal(|| 0_u64);
    let signals = ExamSignals {
        controller,
        draft,
        error,
    };

    let subjects = {
        let ctx = ctx.clone();
        use_resource(move || {
            let backend = ctx.backend();
            let test_id = ctx.test_id().clone();
            async move {
                backend.list_subjects(&test_id).await.map_err(|err| {
                    warn!(test_id = %test_id, error = %err, "failed to list subjects");
                    ViewError::SubjectsUnavailable
                })
            }
        })
    };

    let dispatch_intent = {
        let ctx = ctx.clone();
        use_callback(move |intent: ExamIntent| signals.apply(&ctx, intent))
    };

    let countdown_tick = use_callback(move |()| signals.countdown_tick(tick));

    // Drives the countdown once per second.
    use_future(move || async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            countdown_tick.call(());
        }
    });

    // Leaving the view discards the attempt; late responses are then stale.
    use_drop(move || {
        let mut controller = controller;
        if let Ok(mut controller) = controller.try_write() {
            controller.abandon();
        }
    });

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<ExamTestHandles>() {
                handles.register(dispatch_intent, countdown_tick, controller);
            }
        }
    }

    // Subscribe to the countdown tick; remaining time is read from the clock.
    let _ = tick();
    let subjects_state = view_state_from_resource(subjects);
    let available = match &subjects_state {
        ViewState::Ready(subjects) => subjects.clone(),
        _ => Vec::new(),
    };
    let screen = map_exam_screen(&controller.read(), &available, &draft.read());
    let current_error = *error.read();
    let can_resubmit = matches!(screen, ExamScreenVm::Quiz(_))
        && current_error.is_some_and(ViewError::is_retryable);

    rsx! {
        div { class: "page exam-page",
            header { class: "exam-header",
                h2 { class: "exam-title", "Test {ctx.test_id()}" }
            }
            if let Some(err) = current_error {
                div { class: "exam-error", role: "alert",
                    p { "{err.message()}" }
                    if can_resubmit {
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| dispatch_intent.call(ExamIntent::SubmitAnswers),
                            "Retry"
                        }
                    }
                }
            }
            match screen {
                ExamScreenVm::Configure { picker, can_retry } => rsx! {
                    match subjects_state {
                        ViewState::Idle | ViewState::Loading => rsx! {
                            p { class: "exam-loading", "Loading subjects..." }
                        },
                        ViewState::Error(err) => rsx! {
                            p { "{err.message()}" }
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| {
                                    let mut subjects = subjects;
                                    subjects.restart();
                                },
                                "Retry"
                            }
                        },
                        ViewState::Ready(_) => rsx! {},
                    }
                    SubjectPicker { picker, can_retry, on_intent: dispatch_intent }
                },
                ExamScreenVm::Starting => rsx! {
                    div { class: "exam-loading",
                        p { "Preparing your test..." }
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| dispatch_intent.call(ExamIntent::CancelSubmission),
                            "Cancel"
                        }
                    }
                },
                ExamScreenVm::Quiz(quiz) => rsx! {
                    QuizPanel { quiz, on_intent: dispatch_intent }
                },
                ExamScreenVm::Result(result) => rsx! {
                    ResultPanel { result, on_intent: dispatch_intent }
                },
            }
        }
    }
}

#[component]
fn SubjectPicker(
    picker: SubjectPickerVm,
    can_retry: bool,
    on_intent: Callback<ExamIntent>,
) -> Element {
    rsx! {
        section { class: "exam-config",
            h3 { "Choose subjects" }
            ul { class: "subject-list",
                for option in picker.options.clone() {
                    SubjectRow { key: "{option.id}", option, on_intent }
                }
            }
            p { class: "subject-summary", "{picker.summary_label}" }
            div { class: "exam-actions",
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: !picker.can_start,
                    onclick: move |_| on_intent.call(ExamIntent::Start),
                    "Start test"
                }
                if can_retry {
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| on_intent.call(ExamIntent::RetrySubmission),
                        "Retry"
                    }
                }
            }
        }
    }
}

#[component]
fn SubjectRow(option: SubjectOptionVm, on_intent: Callback<ExamIntent>) -> Element {
    let subject = option.selector();
    rsx! {
        li {
            label { class: "subject-option",
                input {
                    r#type: "checkbox",
                    checked: option.selected,
                    onchange: move |_| on_intent.call(ExamIntent::ToggleSubject(subject.clone())),
                }
                span { "{option.name}" }
            }
        }
    }
}

#[component]
fn QuizPanel(quiz: QuizVm, on_intent: Callback<ExamIntent>) -> Element {
    let locked = quiz.answers_locked();
    let submit_label = if quiz.is_submitting {
        "Submitting..."
    } else {
        "Submit answers"
    };
    let countdown_class = if quiz.is_urgent {
        "exam-countdown urgent"
    } else {
        "exam-countdown"
    };

    rsx! {
        section { class: "exam-quiz",
            div { class: "exam-status",
                span { class: "exam-progress", "{quiz.progress_label}" }
                if let Some(countdown) = quiz.countdown_label.clone() {
                    span { class: countdown_class, "Time left: {countdown}" }
                }
            }
            if quiz.is_time_up {
                p { class: "exam-time-up", "Time is up." }
            }
            for question in quiz.questions.clone() {
                QuestionCard { key: "{question.id}", question, locked, on_intent }
            }
            div { class: "exam-actions",
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: quiz.is_submitting,
                    onclick: move |_| on_intent.call(ExamIntent::SubmitAnswers),
                    "{submit_label}"
                }
            }
        }
    }
}

#[component]
fn QuestionCard(question: QuestionCardVm, locked: bool, on_intent: Callback<ExamIntent>) -> Element {
    let question_id = question.id;
    let card_class = if question.answered {
        "question-card answered"
    } else {
        "question-card"
    };

    rsx! {
        article { class: card_class,
            header { class: "question-card__header",
                span { class: "question-card__number", "{question.number_label}" }
                if !question.subject_name.is_empty() {
                    span { class: "question-card__subject", "{question.subject_name}" }
                }
            }
            div { class: "question-card__prompt", dangerous_inner_html: "{question.prompt_html}" }
            ul { class: "question-card__options",
                for option in question.options.clone() {
                    li { key: "{option.id}",
                        button {
                            class: option_class(option.selected),
                            r#type: "button",
                            disabled: locked,
                            onclick: move |_| on_intent.call(ExamIntent::Answer {
                                question: question_id,
                                option: option.id,
                            }),
                            "{option.text}"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn ResultPanel(result: ResultVm, on_intent: Callback<ExamIntent>) -> Element {
    rsx! {
        section { class: "exam-result",
            h3 { "Your score" }
            p { class: "exam-result__score", "{result.score_label}" }
            p { class: "exam-result__percentage", "{result.percentage_label}" }
            p { class: "exam-result__breakdown", "{result.breakdown_label}" }
            p { class: "exam-result__completed", "{result.completed_label}" }

            if !result.subjects.is_empty() {
                table { class: "exam-result__subjects",
                    thead {
                        tr {
                            th { "Subject" }
                            th { "Score" }
                        }
                    }
                    tbody {
                        for subject in result.subjects.clone() {
                            tr {
                                td { "{subject.name}" }
                                td { "{subject.score_label}" }
                            }
                        }
                    }
                }
            }

            h4 { "Corrections" }
            ol { class: "exam-result__corrections",
                for row in result.corrections.clone() {
                    li { key: "{row.id}", class: row.status.css_class(),
                        span { class: "correction__number", "{row.number_label}" }
                        div { class: "correction__prompt", dangerous_inner_html: "{row.prompt_html}" }
                        p { "Your answer: {row.selected_text}" }
                        p { "Correct answer: {row.correct_text}" }
                        span { class: "correction__status", "{row.status.label()}" }
                    }
                }
            }

            div { class: "exam-actions",
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    onclick: move |_| on_intent.call(ExamIntent::Retake),
                    "Retake test"
                }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| on_intent.call(ExamIntent::NewTest),
                    "New test"
                }
            }
        }
    }
}

fn option_class(selected: bool) -> &'static str {
    if selected { "option selected" } else { "option" }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct ExamTestHandles {
    dispatch: Rc<RefCell<Option<Callback<ExamIntent>>>>,
    tick: Rc<RefCell<Option<Callback<()>>>>,
    controller: Rc<RefCell<Option<Signal<ExamSessionController>>>>,
}

#[cfg(test)]
impl ExamTestHandles {
    pub(crate) fn register(
        &self,
        dispatch: Callback<ExamIntent>,
        tick: Callback<()>,
        controller: Signal<ExamSessionController>,
    ) {
        *self.dispatch.borrow_mut() = Some(dispatch);
        *self.tick.borrow_mut() = Some(tick);
        *self.controller.borrow_mut() = Some(controller);
    }

    pub(crate) fn dispatch(&self) -> Callback<ExamIntent> {
        (*self.dispatch.borrow()).expect("exam dispatch registered")
    }

    pub(crate) fn tick(&self) -> Callback<()> {
        (*self.tick.borrow()).expect("exam tick registered")
    }

    pub(crate) fn controller(&self) -> Signal<ExamSessionController> {
        (*self.controller.borrow()).expect("exam controller registered")
    }
}
