use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use dioxus::prelude::WritableExt;
use exam_core::model::{OptionId, QuestionId, SubjectSelector, TestId};
use exam_core::time::fixed_now;
use services::backend::{GenerateTestRequest, GradeResponse, GradeTestRequest, TestPayload};
use services::{BackendError, Clock, ExamBackend, GradingMode};

use super::ExamIntent;
use super::test_harness::{
    RIGHT, ViewHarness, ViewKind, WRONG, english, maths, question_bank, setup_view_harness,
};

async fn start_maths_test(harness: &mut ViewHarness) {
    harness.rebuild();
    harness.drive_async().await;
    let dispatch = harness.exam_handles.dispatch();
    dispatch.call(ExamIntent::ToggleSubject(maths()));
    harness.drive_async().await;
    dispatch.call(ExamIntent::Start);
    harness.drive_async().await;
    harness.drive_async().await;
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_renders_candidate_and_test() {
    let mut harness = setup_view_harness(
        ViewKind::Home,
        Arc::new(question_bank()),
        GradingMode::Server,
    );
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Candidate: 7"), "missing candidate in {html}");
    assert!(html.contains("Test: abc"), "missing test id in {html}");
    assert!(html.contains("graded by the exam server"), "missing grading note in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_lists_subjects() {
    let mut harness = setup_view_harness(
        ViewKind::Exam,
        Arc::new(question_bank()),
        GradingMode::Server,
    );
    harness.rebuild();
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Choose subjects"), "missing heading in {html}");
    assert!(html.contains("Maths"), "missing Maths in {html}");
    assert!(html.contains("English"), "missing English in {html}");
    assert!(html.contains("No subjects selected"), "missing summary in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_runs_a_local_test_to_its_result() {
    let bank = question_bank().with_answer_key(true);
    let mut harness = setup_view_harness(ViewKind::Exam, Arc::new(bank.clone()), GradingMode::Local);
    start_maths_test(&mut harness).await;

    let html = harness.render();
    assert!(html.contains("Question 1 of 10"), "missing first question in {html}");
    assert!(html.contains("0 / 10 answered"), "missing progress in {html}");
    assert!(html.contains("Time left: 15:00"), "missing countdown in {html}");
    assert!(html.contains("<strong>1</strong>"), "prompt not rendered as markdown in {html}");
    assert!(!html.contains("English"), "unselected subject leaked into {html}");
    assert_eq!(bank.generate_calls(), 1);

    let dispatch = harness.exam_handles.dispatch();
    dispatch.call(ExamIntent::Answer {
        question: QuestionId::new(1),
        option: OptionId::new(RIGHT),
    });
    dispatch.call(ExamIntent::Answer {
        question: QuestionId::new(2),
        option: OptionId::new(WRONG),
    });
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("2 / 10 answered"), "missing progress in {html}");

    dispatch.call(ExamIntent::SubmitAnswers);
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Your score"), "missing result in {html}");
    assert!(html.contains("1 / 10"), "missing score in {html}");
    assert!(html.contains("1 correct, 1 incorrect, 8 unanswered"), "missing breakdown in {html}");
    assert!(html.contains("Retake test"), "missing retake in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_grades_on_the_server() {
    let bank = question_bank();
    let mut harness = setup_view_harness(ViewKind::Exam, Arc::new(bank.clone()), GradingMode::Server);
    start_maths_test(&mut harness).await;

    let dispatch = harness.exam_handles.dispatch();
    dispatch.call(ExamIntent::Answer {
        question: QuestionId::new(3),
        option: OptionId::new(RIGHT),
    });
    dispatch.call(ExamIntent::SubmitAnswers);
    harness.drive_async().await;
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("Your score"), "missing result in {html}");
    assert!(html.contains("1 / 10"), "missing score in {html}");
    assert_eq!(bank.grade_calls(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_shows_retry_after_failed_start() {
    let bank = question_bank();
    bank.fail_next_generate("connection reset");
    let mut harness = setup_view_harness(ViewKind::Exam, Arc::new(bank.clone()), GradingMode::Server);
    start_maths_test(&mut harness).await;

    let html = harness.render();
    assert!(html.contains("could not be started"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
    assert!(html.contains("Choose subjects"), "configuration lost in {html}");

    harness.exam_handles.dispatch().call(ExamIntent::RetrySubmission);
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Question 1 of 10"), "retry did not start the test: {html}");
    assert_eq!(bank.generate_calls(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_locks_answers_when_time_is_up() {
    let mut harness = setup_view_harness(
        ViewKind::Exam,
        Arc::new(question_bank()),
        GradingMode::Server,
    );
    start_maths_test(&mut harness).await;

    let mut controller = harness.exam_handles.controller();
    controller
        .write()
        .set_clock(Clock::fixed(fixed_now() + Duration::seconds(901)));
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Time is up."), "missing time-up notice in {html}");
    assert!(html.contains("Time left: 0:00"), "countdown not at zero in {html}");

    harness.exam_handles.dispatch().call(ExamIntent::Answer {
        question: QuestionId::new(1),
        option: OptionId::new(RIGHT),
    });
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("can no longer be changed"), "answer accepted after time up: {html}");
    assert!(html.contains("0 / 10 answered"), "answer recorded after time up: {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_submits_automatically_at_zero() {
    let bank = question_bank();
    let mut harness = setup_view_harness(ViewKind::Exam, Arc::new(bank.clone()), GradingMode::Server);
    start_maths_test(&mut harness).await;

    harness.exam_handles.dispatch().call(ExamIntent::Answer {
        question: QuestionId::new(4),
        option: OptionId::new(RIGHT),
    });
    harness.drive_async().await;

    let tick = harness.exam_handles.tick();
    tick.call(());
    harness.drive_async().await;
    assert_eq!(bank.grade_calls(), 0, "submitted before the deadline");

    let mut controller = harness.exam_handles.controller();
    controller
        .write()
        .set_clock(Clock::fixed(fixed_now() + Duration::seconds(901)));
    tick.call(());
    harness.drive_async().await;
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("Your score"), "time-up did not submit: {html}");
    assert!(html.contains("1 / 10"), "missing score in {html}");
    assert_eq!(bank.grade_calls(), 1);

    tick.call(());
    harness.drive_async().await;
    assert_eq!(bank.grade_calls(), 1, "result screen resubmitted");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_waits_for_retry_after_failed_auto_submit() {
    let bank = question_bank();
    bank.fail_next_grade("gateway timeout");
    let mut harness = setup_view_harness(ViewKind::Exam, Arc::new(bank.clone()), GradingMode::Server);
    start_maths_test(&mut harness).await;

    let mut controller = harness.exam_handles.controller();
    controller
        .write()
        .set_clock(Clock::fixed(fixed_now() + Duration::seconds(901)));
    let tick = harness.exam_handles.tick();
    tick.call(());
    harness.drive_async().await;
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("could not be submitted"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
    assert!(html.contains("Question 1 of 10"), "answers lost in {html}");
    assert_eq!(bank.grade_calls(), 1);

    for _ in 0..3 {
        tick.call(());
        harness.drive_async().await;
    }
    assert_eq!(bank.grade_calls(), 1, "failed grading was retried without the user");

    harness.exam_handles.dispatch().call(ExamIntent::SubmitAnswers);
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Your score"), "manual retry did not grade: {html}");
    assert_eq!(bank.grade_calls(), 2);
}

struct FailingBackend;

#[async_trait]
impl ExamBackend for FailingBackend {
    async fn list_subjects(&self, _test_id: &TestId) -> Result<Vec<SubjectSelector>, BackendError> {
        Err(BackendError::Unavailable("fail".to_string()))
    }

    async fn generate_test(
        &self,
        _request: &GenerateTestRequest,
    ) -> Result<TestPayload, BackendError> {
        Err(BackendError::Unavailable("fail".to_string()))
    }

    async fn grade_test(&self, _request: &GradeTestRequest) -> Result<GradeResponse, BackendError> {
        Err(BackendError::Unavailable("fail".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_renders_subject_error_state() {
    let mut harness = setup_view_harness(ViewKind::Exam, Arc::new(FailingBackend), GradingMode::Server);
    harness.rebuild();
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Subjects could not be loaded."), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
    assert!(!html.contains(&english().subject_name), "unexpected subject in {html}");
}
