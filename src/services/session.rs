use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{ErrorResponse, SessionError, SessionResult};
use crate::models::domain::question::{Question, QuestionId};
use crate::models::domain::result::AssessmentResult;
use crate::models::domain::session::{
    format_remaining, NavigationMode, SessionSnapshot, SessionStatus, SubmissionPayload,
    SubmitGate, SubmitTrigger, TickEvent,
};
use crate::models::dto::response::{QuestionSetResponse, SubmitAnswersResponse};
use crate::services::answer_store::AnswerStore;
use crate::services::countdown::{Countdown, CountdownTick};
use crate::services::normalizer::QuestionNormalizer;
use crate::services::result_renderer::ResultRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureStage {
    Loading,
    Submitting,
}

/// Lifecycle of one quiz attempt on the client.
///
/// `loading → active → submitting → completed`, with `failed` reachable from
/// `loading` and `submitting`. Every method is synchronous; the async
/// controller serialises calls through a mutex, so checking and changing
/// `status` inside one method is the single-transition guard that lets only
/// one of "user submit" and "timer expiry" leave `active`.
#[derive(Debug)]
pub struct AssessmentSession {
    id: Uuid,
    attempt_id: String,
    status: SessionStatus,
    mode: NavigationMode,
    questions: Vec<Question>,
    answers: AnswerStore,
    current_index: usize,
    time_limit_override: Option<u32>,
    time_limit_seconds: Option<u32>,
    countdown: Option<Countdown>,
    pending: Option<SubmissionPayload>,
    result: Option<AssessmentResult>,
    error: Option<SessionError>,
    failure_stage: Option<FailureStage>,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
}

impl AssessmentSession {
    /// A new session in `loading`. `time_limit_seconds`, when set, replaces
    /// the limit the backend sends with the questions.
    pub fn new(
        attempt_id: impl Into<String>,
        mode: NavigationMode,
        time_limit_seconds: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            attempt_id: attempt_id.into(),
            status: SessionStatus::Loading,
            mode,
            questions: Vec::new(),
            answers: AnswerStore::default(),
            current_index: 0,
            time_limit_override: time_limit_seconds,
            time_limit_seconds: None,
            countdown: None,
            pending: None,
            result: None,
            error: None,
            failure_stage: None,
            started_at: None,
            submitted_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn time_limit_seconds(&self) -> Option<u32> {
        self.time_limit_seconds
    }

    pub fn seconds_remaining(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    pub fn is_timer_armed(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_armed)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// `loading → active`. Questions are normalized, stale answers dropped and
    /// the countdown armed when a limit applies.
    pub fn load(&mut self, response: QuestionSetResponse) -> SessionResult<()> {
        self.expect_status(SessionStatus::Loading, "load questions")?;

        self.questions = QuestionNormalizer::normalize_all(&response.questions);
        self.answers.reset(&self.questions);
        self.current_index = 0;
        self.time_limit_seconds = self
            .time_limit_override
            .or_else(|| response.time_limit_seconds())
            .filter(|secs| *secs > 0);
        let session_id = self.id;
        self.countdown = self.time_limit_seconds.map(|secs| {
            let mut countdown = Countdown::with_on_expire(secs, move || {
                log::info!("Session {} reached its {}s time limit", session_id, secs);
            });
            countdown.arm();
            countdown
        });
        self.status = SessionStatus::Active;
        self.started_at = Some(Utc::now());

        log::info!(
            "Session {} active with {} questions (time limit: {:?}s)",
            self.id,
            self.questions.len(),
            self.time_limit_seconds
        );
        Ok(())
    }

    /// `loading → failed`. Terminal; the user goes back to retry.
    pub fn fail_loading(&mut self, reason: impl Into<String>) -> SessionResult<()> {
        self.expect_status(SessionStatus::Loading, "fail loading")?;
        let err = SessionError::FetchFailed(reason.into());
        log::error!("Session {} failed to load: {}", self.id, err);
        self.error = Some(err);
        self.failure_stage = Some(FailureStage::Loading);
        self.status = SessionStatus::Failed;
        Ok(())
    }

    /// Records an answer. Choice answers are stored by option key; a value
    /// matching an option label is translated to that option's key.
    pub fn answer(&mut self, id: &QuestionId, value: impl Into<String>) -> SessionResult<()> {
        self.expect_status(SessionStatus::Active, "answer")?;
        let value = value.into();
        let question = self
            .question(id)
            .ok_or_else(|| SessionError::UnknownQuestion(id.to_string()))?;

        let stored = if question.kind.is_choice() && !value.trim().is_empty() {
            question
                .resolve_key(&value)
                .map(str::to_string)
                .ok_or_else(|| SessionError::InvalidOption {
                    question: id.to_string(),
                    value: value.clone(),
                })?
        } else {
            value
        };
        self.answers.set(id, stored)
    }

    pub fn clear_answer(&mut self, id: &QuestionId) -> SessionResult<()> {
        self.expect_status(SessionStatus::Active, "clear answer")?;
        self.answers.clear(id)
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.mode {
            NavigationMode::OnePerScreen => self.questions.get(self.current_index),
            NavigationMode::AllAtOnce => None,
        }
    }

    pub fn go_to(&mut self, index: usize) -> SessionResult<usize> {
        self.expect_status(SessionStatus::Active, "navigate")?;
        if self.mode == NavigationMode::AllAtOnce {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                action: "navigate in all-at-once mode",
            });
        }
        if index >= self.questions.len() {
            return Err(SessionError::UnknownQuestion(format!("index {}", index)));
        }
        self.current_index = index;
        Ok(self.current_index)
    }

    /// Moves forward, staying on the last question.
    pub fn next(&mut self) -> SessionResult<usize> {
        let last = self.questions.len().saturating_sub(1);
        let target = (self.current_index + 1).min(last);
        self.go_to(target)
    }

    /// Moves back, staying on the first question.
    pub fn previous(&mut self) -> SessionResult<usize> {
        self.go_to(self.current_index.saturating_sub(1))
    }

    /// Gate for leaving `active`.
    ///
    /// A plain user trigger with unanswered questions asks for confirmation
    /// and changes nothing. Otherwise the session enters `submitting`: the
    /// countdown is disarmed and answers frozen in the same step, and the
    /// payload to send is returned. Triggers arriving after that are
    /// reported as `AlreadySubmitting`.
    pub fn request_submit(&mut self, trigger: SubmitTrigger) -> SessionResult<SubmitGate> {
        match self.status {
            SessionStatus::Active => {}
            SessionStatus::Submitting | SessionStatus::Completed => {
                log::debug!(
                    "Session {} ignoring {:?} submit while {}",
                    self.id,
                    trigger,
                    self.status
                );
                return Ok(SubmitGate::AlreadySubmitting);
            }
            from => {
                return Err(SessionError::InvalidTransition {
                    from,
                    action: "submit",
                })
            }
        }

        if trigger.requires_confirmation_when_incomplete() && !self.answers.is_complete() {
            return Ok(SubmitGate::NeedsConfirmation {
                answered: self.answers.completion_count(),
                total: self.questions.len(),
            });
        }

        Ok(SubmitGate::Proceed(self.enter_submitting(trigger)))
    }

    /// One second of wall-clock time. On expiry the session is moved to
    /// `submitting` with no confirmation.
    pub fn tick(&mut self) -> TickEvent {
        if self.status != SessionStatus::Active {
            return TickEvent::Idle;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return TickEvent::Idle;
        };

        match countdown.tick() {
            CountdownTick::Idle => TickEvent::Idle,
            CountdownTick::Running(seconds_remaining) => {
                log::debug!("Session {} {}s remaining", self.id, seconds_remaining);
                TickEvent::Running { seconds_remaining }
            }
            CountdownTick::Expired => {
                TickEvent::Expired(self.enter_submitting(SubmitTrigger::Expired))
            }
        }
    }

    /// `submitting → completed`.
    pub fn complete(&mut self, response: SubmitAnswersResponse) -> SessionResult<&AssessmentResult> {
        self.expect_status(SessionStatus::Submitting, "complete")?;
        let payload = self.pending.take().map(|p| p.answers).unwrap_or_default();
        let result = ResultRenderer::build(&self.questions, &payload, &response);

        log::info!(
            "Session {} completed with score {}",
            self.id,
            result.percentage_text()
        );
        self.status = SessionStatus::Completed;
        self.error = None;
        self.failure_stage = None;
        Ok(&*self.result.insert(result))
    }

    /// `submitting → failed`. Answers stay in place and are unfrozen so a
    /// retry sends them again.
    pub fn fail_submission(&mut self, reason: impl Into<String>) -> SessionResult<()> {
        self.expect_status(SessionStatus::Submitting, "fail submission")?;
        let err = SessionError::SubmitFailed(reason.into());
        log::error!("Session {} submission failed: {}", self.id, err);
        self.answers.unfreeze();
        self.pending = None;
        self.error = Some(err);
        self.failure_stage = Some(FailureStage::Submitting);
        self.status = SessionStatus::Failed;
        Ok(())
    }

    /// `failed → submitting` after a failed submission, with the answers
    /// that were kept.
    pub fn retry_submission(&mut self) -> SessionResult<SubmissionPayload> {
        if self.status != SessionStatus::Failed
            || self.failure_stage != Some(FailureStage::Submitting)
        {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                action: "retry submission",
            });
        }
        log::info!("Session {} retrying submission", self.id);
        Ok(self.enter_submitting(SubmitTrigger::ConfirmedByUser))
    }

    /// Stops the countdown without a state change, for a host that goes away.
    pub fn disarm_timer(&mut self) {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.disarm();
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let seconds_remaining = self.seconds_remaining();
        SessionSnapshot {
            session_id: self.id.to_string(),
            attempt_id: self.attempt_id.clone(),
            status: self.status,
            indeterminate_progress: self.status == SessionStatus::Loading,
            mode: self.mode,
            current_index: self.current_index,
            total_questions: self.questions.len(),
            answered: self.answers.completion_count(),
            seconds_remaining,
            time_remaining_text: seconds_remaining.map(format_remaining),
            error: self.error.as_ref().map(ErrorResponse::from),
        }
    }

    fn enter_submitting(&mut self, trigger: SubmitTrigger) -> SubmissionPayload {
        self.disarm_timer();
        self.answers.freeze();
        self.status = SessionStatus::Submitting;
        self.error = None;
        self.submitted_at = Some(Utc::now());

        let payload = SubmissionPayload {
            attempt_id: self.attempt_id.clone(),
            answers: self.answers.to_payload(),
            trigger,
        };
        self.pending = Some(payload.clone());
        log::info!(
            "Session {} submitting {} of {} answers ({:?})",
            self.id,
            payload.answers.len(),
            self.questions.len(),
            trigger
        );
        payload
    }

    fn expect_status(&self, expected: SessionStatus, action: &'static str) -> SessionResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }
}
