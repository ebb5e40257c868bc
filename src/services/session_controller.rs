use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use secrecy::{ExposeSecret as _, SecretString};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::{
    context::SessionContext,
    errors::{SessionError, SessionResult},
    models::{
        domain::{
            question::{Question, QuestionId},
            result::AssessmentResult,
            session::{
                NavigationMode, SessionSnapshot, SessionStatus, SubmissionPayload, SubmitGate,
                SubmitTrigger, TickEvent,
            },
        },
        dto::request::SubmitAnswersRequest,
    },
    services::session::AssessmentSession,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub mode: NavigationMode,
    /// Overrides the limit returned with the questions.
    pub time_limit_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(AssessmentResult),
    /// The user declined the incomplete-answers confirmation.
    Cancelled,
    /// Another trigger already started the submission.
    AlreadySubmitting,
    /// The screen went away before the response arrived.
    Dropped,
}

/// Drives one `AssessmentSession` against the backend: fetching, the
/// one-second ticker, confirmation and submission.
///
/// Dropping the controller (or calling [`unmount`](Self::unmount)) stops the
/// ticker. A submission already in flight still completes on the backend but
/// its result is discarded.
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    context: SessionContext,
    session: Mutex<AssessmentSession>,
    credential: Mutex<Option<SecretString>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    fetch_in_flight: AtomicBool,
    mounted: AtomicBool,
}

impl SessionController {
    pub fn new(
        context: SessionContext,
        attempt_id: impl Into<String>,
        options: SessionOptions,
    ) -> Self {
        let session = AssessmentSession::new(attempt_id, options.mode, options.time_limit_seconds);
        log::info!(
            "Created session {} for attempt {}",
            session.id(),
            session.attempt_id()
        );

        Self {
            inner: Arc::new(ControllerInner {
                context,
                session: Mutex::new(session),
                credential: Mutex::new(None),
                ticker: Mutex::new(None),
                fetch_in_flight: AtomicBool::new(false),
                mounted: AtomicBool::new(true),
            }),
        }
    }

    /// Resolves the credential, fetches the questions and, when a time limit
    /// applies, starts the ticker.
    ///
    /// A missing credential returns `MissingCredential` and leaves the session
    /// in `loading`; save one and call `start` again. A fetch error moves the
    /// session to `failed` and returns `FetchFailed`.
    pub async fn start(&self) -> SessionResult<()> {
        let attempt_id = {
            let session = self.inner.session.lock().await;
            if session.status() != SessionStatus::Loading {
                return Err(SessionError::InvalidTransition {
                    from: session.status(),
                    action: "start",
                });
            }
            session.attempt_id().to_string()
        };

        if self
            .inner
            .fetch_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Questions for attempt {} already being fetched", attempt_id);
            return Err(SessionError::InvalidTransition {
                from: SessionStatus::Loading,
                action: "start twice",
            });
        }

        let credential = match self.resolve_credential().await {
            Ok(credential) => credential,
            Err(err) => {
                self.inner.fetch_in_flight.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        let fetched = self
            .inner
            .context
            .quiz_client
            .fetch_questions(&attempt_id, credential)
            .await;

        if !self.is_mounted() {
            log::debug!("Dropping questions for unmounted attempt {}", attempt_id);
            return Ok(());
        }

        let mut session = self.inner.session.lock().await;
        match fetched {
            Ok(response) => {
                session.load(response)?;
                let timed = session.is_timer_armed();
                drop(session);
                if timed {
                    self.spawn_ticker().await;
                }
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                log::error!("Fetching questions for attempt {} failed: {}", attempt_id, reason);
                session.fail_loading(reason.clone())?;
                Err(SessionError::FetchFailed(reason))
            }
        }
    }

    pub async fn save_credential(&self, value: &str) -> SessionResult<()> {
        self.inner.context.credentials.save_credential(value).await
    }

    pub async fn answer(&self, id: &QuestionId, value: impl Into<String>) -> SessionResult<()> {
        self.inner.session.lock().await.answer(id, value)
    }

    pub async fn clear_answer(&self, id: &QuestionId) -> SessionResult<()> {
        self.inner.session.lock().await.clear_answer(id)
    }

    pub async fn next(&self) -> SessionResult<usize> {
        self.inner.session.lock().await.next()
    }

    pub async fn previous(&self) -> SessionResult<usize> {
        self.inner.session.lock().await.previous()
    }

    pub async fn go_to(&self, index: usize) -> SessionResult<usize> {
        self.inner.session.lock().await.go_to(index)
    }

    /// User-initiated submit. With unanswered questions the injected prompt
    /// is awaited first; declining leaves the session `active`.
    pub async fn submit(&self) -> SessionResult<SubmitOutcome> {
        let gate = self
            .inner
            .session
            .lock()
            .await
            .request_submit(SubmitTrigger::User)?;

        let payload = match gate {
            SubmitGate::Proceed(payload) => payload,
            SubmitGate::AlreadySubmitting => return Ok(SubmitOutcome::AlreadySubmitting),
            SubmitGate::NeedsConfirmation { answered, total } => {
                log::info!("Asking to confirm submission with {}/{} answered", answered, total);
                if !self
                    .inner
                    .context
                    .prompt
                    .confirm_incomplete(answered, total)
                    .await
                {
                    log::info!("Submission cancelled by user");
                    return Ok(SubmitOutcome::Cancelled);
                }

                let confirmed = self
                    .inner
                    .session
                    .lock()
                    .await
                    .request_submit(SubmitTrigger::ConfirmedByUser)?;
                match confirmed {
                    SubmitGate::Proceed(payload) => payload,
                    _ => return Ok(SubmitOutcome::AlreadySubmitting),
                }
            }
        };

        self.stop_ticker().await;
        self.deliver_detached(payload).await
    }

    /// Re-sends the kept answers after a failed submission.
    pub async fn retry_submit(&self) -> SessionResult<SubmitOutcome> {
        let payload = self.inner.session.lock().await.retry_submission()?;
        self.deliver_detached(payload).await
    }

    /// The host view is going away: stop the clock and ignore late responses.
    pub async fn unmount(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        self.stop_ticker().await;
        self.inner.session.lock().await.disarm_timer();
        log::info!("Session unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.session.lock().await.status()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().await.snapshot()
    }

    pub async fn questions(&self) -> Vec<Question> {
        self.inner.session.lock().await.questions().to_vec()
    }

    pub async fn current_question(&self) -> Option<Question> {
        self.inner.session.lock().await.current_question().cloned()
    }

    pub async fn result(&self) -> Option<AssessmentResult> {
        self.inner.session.lock().await.result().cloned()
    }

    pub async fn error(&self) -> Option<SessionError> {
        self.inner.session.lock().await.error().cloned()
    }

    async fn resolve_credential(&self) -> SessionResult<Option<SecretString>> {
        let credentials = &self.inner.context.credentials;
        let credential = if self.inner.context.config.require_credential {
            Some(credentials.require_credential().await?)
        } else {
            credentials.get_credential().await.unwrap_or_else(|err| {
                log::warn!("Continuing without credential: {}", err);
                None
            })
        };
        *self.inner.credential.lock().await = credential.clone();
        Ok(credential)
    }

    async fn spawn_ticker(&self) {
        let handle = tokio::spawn(run_ticker(Arc::downgrade(&self.inner)));
        if let Some(previous) = self.inner.ticker.lock().await.replace(handle) {
            previous.abort();
        }
    }

    async fn stop_ticker(&self) {
        if let Some(handle) = self.inner.ticker.lock().await.take() {
            handle.abort();
        }
    }

    /// Runs the submit call on its own task so that a caller giving up on
    /// the future does not cancel a submission the backend may already grade.
    async fn deliver_detached(&self, payload: SubmissionPayload) -> SessionResult<SubmitOutcome> {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.deliver(payload).await })
            .await
            .map_err(|err| SessionError::SubmitFailed(err.to_string()))?
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        if let Ok(mut ticker) = self.inner.ticker.try_lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
    }
}

impl ControllerInner {
    async fn deliver(&self, payload: SubmissionPayload) -> SessionResult<SubmitOutcome> {
        let api_key = self
            .credential
            .lock()
            .await
            .as_ref()
            .map(|c| c.expose_secret().to_string());
        let request = SubmitAnswersRequest {
            answers: payload.answers,
            api_key,
        };

        let response = self
            .context
            .quiz_client
            .submit_answers(&payload.attempt_id, request)
            .await;

        if !self.mounted.load(Ordering::SeqCst) {
            log::debug!(
                "Dropping submission result for unmounted attempt {}",
                payload.attempt_id
            );
            return Ok(SubmitOutcome::Dropped);
        }

        let mut session = self.session.lock().await;
        match response {
            Ok(response) => {
                let result = session.complete(response)?.clone();
                Ok(SubmitOutcome::Completed(result))
            }
            Err(err) => {
                let reason = err.to_string();
                session.fail_submission(reason.clone())?;
                Err(SessionError::SubmitFailed(reason))
            }
        }
    }
}

/// One tick per second until the countdown stops. Holds only a weak
/// reference so a dropped controller ends the loop.
async fn run_ticker(weak: Weak<ControllerInner>) {
    let mut interval = time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.mounted.load(Ordering::SeqCst) {
            break;
        }

        let event = inner.session.lock().await.tick();
        match event {
            TickEvent::Running { .. } => {}
            TickEvent::Idle => break,
            TickEvent::Expired(payload) => {
                tokio::spawn(async move {
                    if let Err(err) = inner.deliver(payload).await {
                        log::error!("Forced submission failed: {}", err);
                    }
                });
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockProfileClient, MockQuizClient};
    use crate::config::Config;
    use crate::services::prompt::MockSubmitPrompt;
    use crate::storage::MemoryStorage;
    use crate::test_utils::fixtures::{half_graded as graded, two_question_set as questions};
    use crate::test_utils::test_helpers::init_logging;

    fn context(quiz: MockQuizClient, prompt: MockSubmitPrompt) -> SessionContext {
        init_logging();
        let storage = Arc::new(MemoryStorage::with_entries([("api_key", "sk-test")]));
        SessionContext::new(
            Config::test_config(),
            Arc::new(quiz),
            Arc::new(MockProfileClient::new()),
            storage,
            Arc::new(prompt),
        )
    }

    #[tokio::test]
    async fn declined_confirmation_keeps_session_active() {
        let mut quiz = MockQuizClient::new();
        quiz.expect_fetch_questions()
            .times(1)
            .returning(|_, _| Ok(questions()));
        quiz.expect_submit_answers().never();
        let mut prompt = MockSubmitPrompt::new();
        prompt
            .expect_confirm_incomplete()
            .withf(|answered, total| *answered == 1 && *total == 2)
            .times(1)
            .returning(|_, _| false);

        let controller =
            SessionController::new(context(quiz, prompt), "attempt-1", SessionOptions::default());
        controller.start().await.unwrap();
        controller.answer(&QuestionId::from(1), "A").await.unwrap();

        let outcome = controller.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Cancelled);
        assert_eq!(controller.status().await, SessionStatus::Active);
    }

    #[tokio::test]
    async fn credential_is_sent_with_requests() {
        let mut quiz = MockQuizClient::new();
        quiz.expect_fetch_questions()
            .withf(|attempt, credential| {
                attempt == "attempt-2"
                    && credential.as_ref().map(|c| c.expose_secret()) == Some("sk-test")
            })
            .times(1)
            .returning(|_, _| Ok(questions()));
        quiz.expect_submit_answers()
            .withf(|_, request| request.api_key.as_deref() == Some("sk-test"))
            .times(1)
            .returning(|_, _| Ok(graded()));
        let mut prompt = MockSubmitPrompt::new();
        prompt.expect_confirm_incomplete().never();

        let controller =
            SessionController::new(context(quiz, prompt), "attempt-2", SessionOptions::default());
        controller.start().await.unwrap();
        controller.answer(&QuestionId::from(1), "A").await.unwrap();
        controller.answer(&QuestionId::from(2), "Because").await.unwrap();

        let outcome = controller.submit().await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Completed(ref r) if r.percentage == Some(50)));
    }

    #[tokio::test]
    async fn fetch_error_fails_session() {
        let mut quiz = MockQuizClient::new();
        quiz.expect_fetch_questions()
            .returning(|_, _| Err(SessionError::Transport("500 from 10.1.1.1".to_string())));
        let prompt = MockSubmitPrompt::new();

        let controller =
            SessionController::new(context(quiz, prompt), "attempt-3", SessionOptions::default());
        let err = controller.start().await.unwrap_err();

        assert_eq!(err.error_code(), "FETCH_FAILED");
        assert!(!err.user_message().contains("10.1.1.1"));
        assert_eq!(controller.status().await, SessionStatus::Failed);
        assert!(controller.start().await.is_err());
    }

    #[tokio::test]
    async fn missing_credential_keeps_loading() {
        let mut quiz = MockQuizClient::new();
        quiz.expect_fetch_questions().never();
        let mut profile = MockProfileClient::new();
        profile.expect_get_credential().returning(|| Ok(None));
        let context = SessionContext::new(
            Config::test_config(),
            Arc::new(quiz),
            Arc::new(profile),
            Arc::new(MemoryStorage::new()),
            Arc::new(MockSubmitPrompt::new()),
        );

        let controller = SessionController::new(context, "attempt-4", SessionOptions::default());
        let err = controller.start().await.unwrap_err();

        assert_eq!(err, SessionError::MissingCredential);
        assert_eq!(controller.status().await, SessionStatus::Loading);
        assert!(controller.snapshot().await.indeterminate_progress);
    }

    #[tokio::test]
    async fn failed_submit_can_be_retried() {
        let mut quiz = MockQuizClient::new();
        quiz.expect_fetch_questions()
            .returning(|_, _| Ok(questions()));
        let mut seq = mockall::Sequence::new();
        quiz.expect_submit_answers()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(SessionError::Transport("502".to_string())));
        quiz.expect_submit_answers()
            .withf(|_, request| request.answers.len() == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(graded()));
        let prompt = MockSubmitPrompt::new();

        let controller =
            SessionController::new(context(quiz, prompt), "attempt-5", SessionOptions::default());
        controller.start().await.unwrap();
        controller.answer(&QuestionId::from(1), "A").await.unwrap();
        controller.answer(&QuestionId::from(2), "text").await.unwrap();

        let err = controller.submit().await.unwrap_err();
        assert_eq!(err.recovery(), crate::errors::RecoveryAction::RetrySubmit);
        assert_eq!(controller.status().await, SessionStatus::Failed);

        let outcome = controller.retry_submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
        assert_eq!(controller.status().await, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn unmounted_session_drops_submit_result() {
        let mut quiz = MockQuizClient::new();
        quiz.expect_fetch_questions()
            .returning(|_, _| Ok(questions()));
        quiz.expect_submit_answers()
            .times(1)
            .returning(|_, _| Ok(graded()));
        let prompt = MockSubmitPrompt::new();

        let controller =
            SessionController::new(context(quiz, prompt), "attempt-6", SessionOptions::default());
        controller.start().await.unwrap();
        controller.answer(&QuestionId::from(1), "A").await.unwrap();
        controller.answer(&QuestionId::from(2), "text").await.unwrap();
        controller.unmount().await;

        let outcome = controller.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Dropped);
        assert_eq!(controller.status().await, SessionStatus::Submitting);
        assert!(controller.result().await.is_none());
    }
}
