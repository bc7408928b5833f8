use std::fmt;
use std::mem;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use exam_core::Clock;
use exam_core::model::{
    AnswerRecord, ExamConfiguration, OptionId, QuestionId, SessionResult, TestId, TestSession,
    UserId,
};

use super::progress::ExamProgress;
use super::state::{ExamPhase, ExamState};
use crate::backend::{ExamBackend, GenerateTestRequest, GradeResponse, GradeTestRequest, TestPayload};
use crate::config::GradingMode;
use crate::error::{BackendError, ExamError};

//
// ─── TICKETS ───────────────────────────────────────────────────────────────────
//

/// Issued when a configuration submission starts.
///
/// The caller performs the request and hands the outcome back together with
/// `generation`; outcomes for an older generation are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub generation: u64,
    pub request: GenerateTestRequest,
}

/// Issued when server-side grading starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingTicket {
    pub generation: u64,
    pub request: GradeTestRequest,
}

/// What `begin_grading` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradingStep {
    /// Graded locally; the controller is `Completed`.
    Completed,
    /// Waiting for the backend; the controller is `Grading`.
    Pending(GradingTicket),
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Lifecycle of one CBT practice attempt:
/// `Configuring → Submitting → Active → Grading → Completed`, with
/// `SubmitFailed` reachable from `Submitting`.
///
/// Owns all session state. Network calls go through the injected backend; the
/// split `begin_*`/`complete_*` methods let event-driven hosts run the request
/// themselves, while `submit_configuration`/`submit_session` do both halves.
pub struct ExamSessionController {
    clock: Clock,
    backend: Arc<dyn ExamBackend>,
    user_id: UserId,
    grading: GradingMode,
    shuffle_questions: bool,
    state: ExamState,
    generation: u64,
    last_error: Option<String>,
}

impl ExamSessionController {
    #[must_use]
    pub fn new(
        clock: Clock,
        backend: Arc<dyn ExamBackend>,
        user_id: UserId,
        grading: GradingMode,
    ) -> Self {
        Self {
            clock,
            backend,
            user_id,
            grading,
            shuffle_questions: false,
            state: ExamState::Configuring,
            generation: 0,
            last_error: None,
        }
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn ExamBackend> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn grading_mode(&self) -> GradingMode {
        self.grading
    }

    /// Empty configuration for this controller's user.
    #[must_use]
    pub fn new_configuration(&self, test_id: TestId) -> ExamConfiguration {
        ExamConfiguration::new(self.user_id, test_id)
    }

    //
    // ─── READ ACCESSORS ────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn state(&self) -> &ExamState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase().is_busy()
    }

    /// Current request generation. Increases whenever a request starts or the
    /// session is abandoned.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn configuration(&self) -> Option<&ExamConfiguration> {
        self.state.configuration()
    }

    #[must_use]
    pub fn test_session(&self) -> Option<&TestSession> {
        self.state.test_session()
    }

    #[must_use]
    pub fn answers(&self) -> Option<&AnswerRecord> {
        self.state.answers()
    }

    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        self.state.result()
    }

    /// Message of the most recent recoverable failure, cleared on the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn progress(&self) -> Option<ExamProgress> {
        let session = self.state.test_session()?;
        let answers = self.state.answers()?;
        let now = self.clock.now();
        let total = session.question_count();
        let answered = answers.len();
        Some(ExamProgress {
            total,
            answered,
            unanswered: total.saturating_sub(answered),
            remaining_seconds: session.remaining_seconds(now),
            is_time_up: session.is_expired_at(now),
        })
    }

    /// True when an active session has run out of time and should be submitted.
    #[must_use]
    pub fn is_time_up(&self) -> bool {
        match &self.state {
            ExamState::Active { session, .. } => session.is_expired_at(self.clock.now()),
            _ => false,
        }
    }

    //
    // ─── CONFIGURATION SUBMISSION ──────────────────────────────────────────────
    //

    /// Validate `config` and move to `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::ConfigurationInvalid` without leaving the current state,
    /// `ExamError::SubmissionInFlight` while another request is pending, and
    /// `ExamError::InvalidState` once a session is active or completed.
    pub fn begin_submission(
        &mut self,
        config: ExamConfiguration,
    ) -> Result<SubmissionTicket, ExamError> {
        match self.phase() {
            ExamPhase::Configuring | ExamPhase::SubmitFailed => {}
            ExamPhase::Submitting | ExamPhase::Grading => {
                return Err(ExamError::SubmissionInFlight);
            }
            phase => {
                return Err(ExamError::InvalidState {
                    operation: "submit configuration",
                    phase,
                });
            }
        }
        config.validate()?;

        self.generation += 1;
        let request = GenerateTestRequest::from_configuration(&config);
        info!(
            test_id = %config.test_id(),
            subjects = config.selected_subjects().len(),
            generation = self.generation,
            "submitting exam configuration"
        );
        self.state = ExamState::Submitting { config };
        Ok(SubmissionTicket {
            generation: self.generation,
            request,
        })
    }

    /// Apply the backend's answer to a submission.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::StaleResponse` for an abandoned or superseded request and
    /// `ExamError::SubmissionFailed` (controller now `SubmitFailed`) when the request
    /// failed or the returned test is unusable.
    pub fn complete_submission(
        &mut self,
        generation: u64,
        outcome: Result<TestPayload, BackendError>,
    ) -> Result<(), ExamError> {
        if generation != self.generation || self.phase() != ExamPhase::Submitting {
            debug!(generation, current = self.generation, "discarding stale test response");
            return Err(ExamError::StaleResponse);
        }
        let ExamState::Submitting { config } = mem::take(&mut self.state) else {
            return Err(ExamError::StaleResponse);
        };

        match outcome.and_then(|payload| self.start_session(&config, payload)) {
            Ok(session) => {
                info!(
                    test_id = %session.test_id(),
                    attempt_id = %session.attempt_id(),
                    questions = session.question_count(),
                    duration_seconds = session.duration_seconds(),
                    "exam session started"
                );
                self.last_error = None;
                self.state = ExamState::Active {
                    config,
                    session,
                    answers: AnswerRecord::new(),
                };
                Ok(())
            }
            Err(err) => {
                warn!(test_id = %config.test_id(), error = %err, "exam configuration submission failed");
                let reason = err.to_string();
                self.last_error = Some(reason.clone());
                self.state = ExamState::SubmitFailed { config, reason };
                Err(ExamError::SubmissionFailed(err))
            }
        }
    }

    fn start_session(
        &self,
        config: &ExamConfiguration,
        payload: TestPayload,
    ) -> Result<TestSession, BackendError> {
        let mut session = payload.into_session(config, self.clock.now())?;
        if self.grading == GradingMode::Local {
            session.require_answer_key()?;
        }
        if self.shuffle_questions {
            session.reorder_questions(|questions| questions.shuffle(&mut rand::rng()));
        }
        Ok(session)
    }

    /// Submit a configuration and wait for the generated test.
    ///
    /// # Errors
    ///
    /// See `begin_submission` and `complete_submission`.
    pub async fn submit_configuration(&mut self, config: ExamConfiguration) -> Result<(), ExamError> {
        let ticket = self.begin_submission(config)?;
        let outcome = self.backend.generate_test(&ticket.request).await;
        self.complete_submission(ticket.generation, outcome)
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Record the selected option for a question; a later call for the same
    /// question replaces the earlier selection.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidState` outside `Active`, `ExamError::TimeExpired`
    /// after the countdown ended, and `ExamError::UnknownQuestion` /
    /// `ExamError::UnknownOption` for ids outside the current test.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<(), ExamError> {
        let now = self.clock.now();
        let phase = self.phase();
        let ExamState::Active {
            session, answers, ..
        } = &mut self.state
        else {
            return Err(ExamError::InvalidState {
                operation: "record answer",
                phase,
            });
        };

        if session.is_expired_at(now) {
            return Err(ExamError::TimeExpired);
        }
        let question = session
            .question(question_id)
            .ok_or(ExamError::UnknownQuestion(question_id))?;
        if !question.has_option(option_id) {
            return Err(ExamError::UnknownOption {
                question: question_id,
                option: option_id,
            });
        }

        answers.record(question_id, option_id);
        Ok(())
    }

    //
    // ─── GRADING ───────────────────────────────────────────────────────────────
    //

    /// Finish the active session.
    ///
    /// With `GradingMode::Local` the result is computed immediately; with
    /// `GradingMode::Server` the controller waits in `Grading` for
    /// `complete_grading`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::SubmissionInFlight` while grading is pending and
    /// `ExamError::InvalidState` in any other non-active phase.
    pub fn begin_grading(&mut self) -> Result<GradingStep, ExamError> {
        match self.phase() {
            ExamPhase::Active => {}
            ExamPhase::Submitting | ExamPhase::Grading => {
                return Err(ExamError::SubmissionInFlight);
            }
            phase => {
                return Err(ExamError::InvalidState {
                    operation: "submit session",
                    phase,
                });
            }
        }
        let ExamState::Active {
            config,
            session,
            answers,
        } = mem::take(&mut self.state)
        else {
            return Err(ExamError::StaleResponse);
        };

        self.generation += 1;
        info!(
            attempt_id = %session.attempt_id(),
            answered = answers.len(),
            questions = session.question_count(),
            mode = %self.grading,
            "submitting exam session"
        );

        match self.grading {
            GradingMode::Local => {
                let completed_at = self.clock.now();
                match SessionResult::grade(&config, &session, &answers, completed_at) {
                    Ok(result) => {
                        self.finish(config, session, result);
                        Ok(GradingStep::Completed)
                    }
                    Err(err) => {
                        let err = BackendError::from(err);
                        self.restore_active(config, session, answers, &err);
                        Err(ExamError::GradingFailed(err))
                    }
                }
            }
            GradingMode::Server => {
                let request = GradeTestRequest::new(&session, &answers);
                self.state = ExamState::Grading {
                    config,
                    session,
                    answers,
                };
                Ok(GradingStep::Pending(GradingTicket {
                    generation: self.generation,
                    request,
                }))
            }
        }
    }

    /// Apply the grading backend's answer.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::StaleResponse` for an abandoned or superseded request and
    /// `ExamError::GradingFailed` (controller back in `Active`, answers kept) when
    /// grading failed or returned an inconsistent result.
    pub fn complete_grading(
        &mut self,
        generation: u64,
        outcome: Result<GradeResponse, BackendError>,
    ) -> Result<(), ExamError> {
        if generation != self.generation || self.phase() != ExamPhase::Grading {
            debug!(generation, current = self.generation, "discarding stale grading response");
            return Err(ExamError::StaleResponse);
        }
        let ExamState::Grading {
            config,
            session,
            answers,
        } = mem::take(&mut self.state)
        else {
            return Err(ExamError::StaleResponse);
        };

        let completed_at = self.clock.now();
        let graded = outcome
            .and_then(|response| response.into_result(&config, &session, &answers, completed_at));
        match graded {
            Ok(result) => {
                self.finish(config, session, result);
                Ok(())
            }
            Err(err) => {
                self.restore_active(config, session, answers, &err);
                Err(ExamError::GradingFailed(err))
            }
        }
    }

    /// Submit the active session and wait for its result.
    ///
    /// # Errors
    ///
    /// See `begin_grading` and `complete_grading`.
    pub async fn submit_session(&mut self) -> Result<(), ExamError> {
        match self.begin_grading()? {
            GradingStep::Completed => Ok(()),
            GradingStep::Pending(ticket) => {
                let outcome = self.backend.grade_test(&ticket.request).await;
                self.complete_grading(ticket.generation, outcome)
            }
        }
    }

    fn finish(&mut self, config: ExamConfiguration, session: TestSession, result: SessionResult) {
        info!(
            attempt_id = %session.attempt_id(),
            score = result.score(),
            total = result.total_questions(),
            "exam session completed"
        );
        self.last_error = None;
        self.state = ExamState::Completed {
            config,
            session,
            result,
        };
    }

    fn restore_active(
        &mut self,
        config: ExamConfiguration,
        session: TestSession,
        answers: AnswerRecord,
        err: &BackendError,
    ) {
        warn!(attempt_id = %session.attempt_id(), error = %err, "exam grading failed");
        self.last_error = Some(err.to_string());
        self.state = ExamState::Active {
            config,
            session,
            answers,
        };
    }

    //
    // ─── RESET ─────────────────────────────────────────────────────────────────
    //

    /// Discard the session and its configuration after completion or a failed
    /// submission.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidState` from any other phase.
    pub fn reset_session(&mut self) -> Result<(), ExamError> {
        match self.phase() {
            ExamPhase::Completed | ExamPhase::SubmitFailed => {
                debug!("resetting exam session");
                self.state = ExamState::Configuring;
                self.last_error = None;
                Ok(())
            }
            phase => Err(ExamError::InvalidState {
                operation: "reset session",
                phase,
            }),
        }
    }

    /// Drop everything regardless of phase, e.g. when the user navigates away.
    ///
    /// Any response still in flight will be discarded as stale.
    pub fn abandon(&mut self) {
        if self.phase() != ExamPhase::Configuring {
            info!(phase = %self.phase(), "abandoning exam session");
        }
        self.generation += 1;
        self.state = ExamState::Configuring;
        self.last_error = None;
    }
}

impl fmt::Debug for ExamSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSessionController")
            .field("user_id", &self.user_id)
            .field("grading", &self.grading)
            .field("phase", &self.phase())
            .field("generation", &self.generation)
            .field("shuffle_questions", &self.shuffle_questions)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::backend::{CorrectionPayload, InMemoryExamBackend, QuestionPayload};
    use exam_core::model::{QuizOption, ResultError, SubjectId, SubjectSelector};
    use exam_core::time::{fixed_clock, fixed_now};

    fn maths() -> SubjectSelector {
        SubjectSelector::new(SubjectId::new(1), "Maths")
    }

    fn question(id: u64) -> QuestionPayload {
        QuestionPayload {
            id: QuestionId::new(id),
            subject_id: SubjectId::new(1),
            prompt: format!("Q{id}"),
            options: vec![
                QuizOption::new(OptionId::new(1), "right"),
                QuizOption::new(OptionId::new(2), "wrong"),
            ],
            correct_option_id: Some(OptionId::new(1)),
        }
    }

    fn backend(count: u64) -> InMemoryExamBackend {
        (1..=count)
            .fold(InMemoryExamBackend::new().with_subject(maths()), |b, id| {
                b.with_question(question(id))
            })
            .with_duration_seconds(120)
            .with_answer_key(true)
    }

    fn controller(backend: &InMemoryExamBackend, grading: GradingMode) -> ExamSessionController {
        ExamSessionController::new(
            fixed_clock(),
            Arc::new(backend.clone()),
            UserId::new(7),
            grading,
        )
    }

    fn config(controller: &ExamSessionController) -> ExamConfiguration {
        controller
            .new_configuration(TestId::new("abc"))
            .with_subject(maths())
    }

    fn payload(count: u64) -> TestPayload {
        TestPayload {
            test_id: TestId::new("abc"),
            questions: (1..=count).map(question).collect(),
            duration_seconds: 120,
        }
    }

    #[test]
    fn second_submission_while_pending_is_rejected() {
        let backend = backend(2);
        let mut controller = controller(&backend, GradingMode::Local);
        let cfg = config(&controller);

        let ticket = controller.begin_submission(cfg.clone()).unwrap();
        let err = controller.begin_submission(cfg).unwrap_err();
        assert!(matches!(err, ExamError::SubmissionInFlight));
        assert_eq!(controller.generation(), ticket.generation);
        assert_eq!(controller.phase(), ExamPhase::Submitting);
    }

    #[test]
    fn invalid_configuration_keeps_state() {
        let backend = backend(1);
        let mut controller = controller(&backend, GradingMode::Local);
        let empty = controller.new_configuration(TestId::new("abc"));

        let err = controller.begin_submission(empty).unwrap_err();
        assert!(matches!(err, ExamError::ConfigurationInvalid(_)));
        assert_eq!(controller.phase(), ExamPhase::Configuring);
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn response_after_abandon_is_discarded() {
        let backend = backend(1);
        let mut controller = controller(&backend, GradingMode::Local);
        let ticket = controller.begin_submission(config(&controller)).unwrap();

        controller.abandon();
        let err = controller
            .complete_submission(ticket.generation, Ok(payload(1)))
            .unwrap_err();
        assert!(matches!(err, ExamError::StaleResponse));
        assert_eq!(controller.phase(), ExamPhase::Configuring);
        assert!(controller.test_session().is_none());
    }

    #[test]
    fn superseded_response_is_discarded() {
        let backend = backend(1);
        let mut controller = controller(&backend, GradingMode::Local);
        let first = controller.begin_submission(config(&controller)).unwrap();
        controller.abandon();
        let second = controller.begin_submission(config(&controller)).unwrap();

        assert!(matches!(
            controller.complete_submission(first.generation, Ok(payload(1))),
            Err(ExamError::StaleResponse)
        ));
        assert_eq!(controller.phase(), ExamPhase::Submitting);
        controller
            .complete_submission(second.generation, Ok(payload(1)))
            .unwrap();
        assert_eq!(controller.phase(), ExamPhase::Active);
    }

    #[test]
    fn local_mode_requires_answer_key() {
        let backend = backend(1);
        let mut controller = controller(&backend, GradingMode::Local);
        let ticket = controller.begin_submission(config(&controller)).unwrap();
        let mut unkeyed = payload(1);
        unkeyed.questions[0].correct_option_id = None;

        let err = controller
            .complete_submission(ticket.generation, Ok(unkeyed))
            .unwrap_err();
        assert!(matches!(
            err,
            ExamError::SubmissionFailed(BackendError::InvalidTest(_))
        ));
        assert_eq!(controller.phase(), ExamPhase::SubmitFailed);
    }

    #[test]
    fn answers_are_validated_against_the_session() {
        let backend = backend(2);
        let mut controller = controller(&backend, GradingMode::Local);
        let ticket = controller.begin_submission(config(&controller)).unwrap();
        controller
            .complete_submission(ticket.generation, Ok(payload(2)))
            .unwrap();

        assert!(matches!(
            controller.record_answer(QuestionId::new(99), OptionId::new(1)),
            Err(ExamError::UnknownQuestion(_))
        ));
        assert!(matches!(
            controller.record_answer(QuestionId::new(1), OptionId::new(9)),
            Err(ExamError::UnknownOption { .. })
        ));
        controller
            .record_answer(QuestionId::new(1), OptionId::new(1))
            .unwrap();
        controller
            .record_answer(QuestionId::new(1), OptionId::new(2))
            .unwrap();
        let answers = controller.answers().unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.selected(QuestionId::new(1)), Some(OptionId::new(2)));
    }

    #[test]
    fn answers_after_deadline_are_rejected() {
        let backend = backend(1);
        let mut controller = controller(&backend, GradingMode::Local);
        let ticket = controller.begin_submission(config(&controller)).unwrap();
        controller
            .complete_submission(ticket.generation, Ok(payload(1)))
            .unwrap();

        let mut clock = fixed_clock();
        clock.advance_secs(120);
        controller.set_clock(clock);

        assert!(controller.is_time_up());
        assert!(matches!(
            controller.record_answer(QuestionId::new(1), OptionId::new(1)),
            Err(ExamError::TimeExpired)
        ));
        let progress = controller.progress().unwrap();
        assert_eq!(progress.remaining_seconds, Some(0));
        assert!(progress.is_time_up);
        assert!(matches!(controller.begin_grading(), Ok(GradingStep::Completed)));
    }

    #[test]
    fn server_grading_failure_preserves_answers() {
        let backend = backend(2);
        let mut controller = controller(&backend, GradingMode::Server);
        let ticket = controller.begin_submission(config(&controller)).unwrap();
        controller
            .complete_submission(ticket.generation, Ok(payload(2)))
            .unwrap();
        controller
            .record_answer(QuestionId::new(2), OptionId::new(1))
            .unwrap();

        let GradingStep::Pending(grading) = controller.begin_grading().unwrap() else {
            panic!("server grading should be pending");
        };
        assert!(controller.is_busy());
        assert!(matches!(
            controller.begin_grading(),
            Err(ExamError::SubmissionInFlight)
        ));

        let err = controller
            .complete_grading(
                grading.generation,
                Err(BackendError::Unavailable("offline".into())),
            )
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(controller.phase(), ExamPhase::Active);
        assert_eq!(
            controller.answers().unwrap().selected(QuestionId::new(2)),
            Some(OptionId::new(1))
        );
        assert!(controller.last_error().is_some());
    }

    #[test]
    fn reset_is_only_allowed_after_completion_or_failure() {
        let backend = backend(1);
        let mut controller = controller(&backend, GradingMode::Local);
        assert!(matches!(
            controller.reset_session(),
            Err(ExamError::InvalidState { .. })
        ));

        let ticket = controller.begin_submission(config(&controller)).unwrap();
        controller
            .complete_submission(ticket.generation, Ok(payload(1)))
            .unwrap();
        assert!(matches!(
            controller.reset_session(),
            Err(ExamError::InvalidState {
                phase: ExamPhase::Active,
                ..
            })
        ));

        controller.begin_grading().unwrap();
        assert_eq!(controller.result().unwrap().completed_at(), fixed_now());
        controller.reset_session().unwrap();
        assert_eq!(controller.phase(), ExamPhase::Configuring);
        assert!(controller.configuration().is_none());
        assert!(controller.result().is_none());
    }

    #[test]
    fn server_corrections_must_match_the_submitted_answers() {
        let backend = backend(2);
        let mut controller = controller(&backend, GradingMode::Server);
        let ticket = controller.begin_submission(config(&controller)).unwrap();
        controller
            .complete_submission(ticket.generation, Ok(payload(2)))
            .unwrap();

        let GradingStep::Pending(grading) = controller.begin_grading().unwrap() else {
            panic!("server grading should be pending");
        };
        let invented = GradeResponse {
            score: 1,
            total_questions: 2,
            corrections: vec![
                CorrectionPayload {
                    question_id: QuestionId::new(1),
                    selected: Some(OptionId::new(1)),
                    correct: OptionId::new(1),
                },
                CorrectionPayload {
                    question_id: QuestionId::new(2),
                    selected: None,
                    correct: OptionId::new(1),
                },
            ],
        };
        let err = controller
            .complete_grading(grading.generation, Ok(invented))
            .unwrap_err();
        assert!(matches!(
            err,
            ExamError::GradingFailed(BackendError::InvalidResult(
                ResultError::SelectionMismatch(_)
            ))
        ));
        assert_eq!(controller.phase(), ExamPhase::Active);
        assert!(controller.result().is_none());
        assert!(controller.answers().unwrap().is_empty());

        let GradingStep::Pending(grading) = controller.begin_grading().unwrap() else {
            panic!("server grading should be pending");
        };
        let unknown_key = GradeResponse {
            score: 0,
            total_questions: 2,
            corrections: vec![
                CorrectionPayload {
                    question_id: QuestionId::new(1),
                    selected: None,
                    correct: OptionId::new(1),
                },
                CorrectionPayload {
                    question_id: QuestionId::new(2),
                    selected: None,
                    correct: OptionId::new(99),
                },
            ],
        };
        let err = controller
            .complete_grading(grading.generation, Ok(unknown_key))
            .unwrap_err();
        assert!(matches!(
            err,
            ExamError::GradingFailed(BackendError::InvalidResult(
                ResultError::UnknownCorrectOption { .. }
            ))
        ));
        assert_eq!(controller.phase(), ExamPhase::Active);
    }

    #[test]
    fn shuffled_session_keeps_every_question_and_grades_by_id() {
        let backend = backend(10);
        let mut controller =
            controller(&backend, GradingMode::Local).with_shuffle_questions(true);
        let ticket = controller.begin_submission(config(&controller)).unwrap();
        controller
            .complete_submission(ticket.generation, Ok(payload(10)))
            .unwrap();

        let session = controller.test_session().unwrap();
        let shown: BTreeSet<_> = session.questions().iter().map(|q| q.id()).collect();
        let sent: BTreeSet<_> = payload(10).questions.iter().map(|q| q.id).collect();
        assert_eq!(shown, sent);
        assert_eq!(session.question_count(), 10);

        for id in 1..=4 {
            controller
                .record_answer(QuestionId::new(id), OptionId::new(1))
                .unwrap();
        }
        controller
            .record_answer(QuestionId::new(5), OptionId::new(2))
            .unwrap();
        assert!(matches!(controller.begin_grading(), Ok(GradingStep::Completed)));

        let result = controller.result().unwrap();
        assert_eq!(result.score(), 4);
        assert_eq!(result.total_questions(), 10);
        assert_eq!(result.unanswered(), 5);
        assert!(!result.correction(QuestionId::new(5)).unwrap().is_correct());
    }
}
