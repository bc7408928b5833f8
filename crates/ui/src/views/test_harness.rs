use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use exam_core::model::{OptionId, QuestionId, QuizOption, SubjectId, SubjectSelector, TestId, UserId};
use exam_core::time::fixed_now;
use services::backend::QuestionPayload;
use services::{Clock, ExamBackend, GradingMode, InMemoryExamBackend};

use crate::context::{UiApp, build_app_context};
use crate::views::exam::ExamTestHandles;
use crate::views::{ExamView, HomeView};

pub const RIGHT: u64 = 1;
pub const WRONG: u64 = 2;

struct TestApp {
    backend: Arc<dyn ExamBackend>,
    grading: GradingMode,
}

impl UiApp for TestApp {
    fn user_id(&self) -> UserId {
        UserId::new(7)
    }

    fn test_id(&self) -> TestId {
        TestId::new("abc")
    }

    fn grading_mode(&self) -> GradingMode {
        self.grading
    }

    fn shuffle_questions(&self) -> bool {
        false
    }

    fn clock(&self) -> Clock {
        Clock::fixed(fixed_now())
    }

    fn exam_backend(&self) -> Arc<dyn ExamBackend> {
        Arc::clone(&self.backend)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Exam,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
    exam_handles: ExamTestHandles,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    use_context_provider(|| props.exam_handles.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Exam => rsx! { ExamView {} },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub exam_handles: ExamTestHandles,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn maths() -> SubjectSelector {
    SubjectSelector::new(SubjectId::new(1), "Maths")
}

pub fn english() -> SubjectSelector {
    SubjectSelector::new(SubjectId::new(2), "English")
}

fn question(id: u64, subject: SubjectId) -> QuestionPayload {
    QuestionPayload {
        id: QuestionId::new(id),
        subject_id: subject,
        prompt: format!("Question **{id}**"),
        options: vec![
            QuizOption::new(OptionId::new(RIGHT), "right"),
            QuizOption::new(OptionId::new(WRONG), "wrong"),
        ],
        correct_option_id: Some(OptionId::new(RIGHT)),
    }
}

/// Ten Maths questions, two English ones, fifteen minutes.
pub fn question_bank() -> InMemoryExamBackend {
    let backend = InMemoryExamBackend::new()
        .with_subject(maths())
        .with_subject(english())
        .with_duration_seconds(900);
    let backend = (1..=10).fold(backend, |b, id| b.with_question(question(id, SubjectId::new(1))));
    (11..=12).fold(backend, |b, id| b.with_question(question(id, SubjectId::new(2))))
}

pub fn setup_view_harness(
    view: ViewKind,
    backend: Arc<dyn ExamBackend>,
    grading: GradingMode,
) -> ViewHarness {
    let app = Arc::new(TestApp { backend, grading });
    let exam_handles = ExamTestHandles::default();
    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app,
            view,
            exam_handles: exam_handles.clone(),
        },
    );
    ViewHarness { dom, exam_handles }
}
