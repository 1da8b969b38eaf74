use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use assess_core::Clock;
use assess_core::model::{Attempt, OPTION_COUNT, Question, UserId};
use assess_core::scoring::Scorecard;
use storage::repository::AttemptRepository;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::countdown::{Countdown, Tick};
use super::guard::{SubmissionGuard, SubmissionPhase};
use super::progress::{QuestionStatus, SessionProgress};
use crate::error::SessionError;
use crate::identity::IdentityProvider;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Externally visible lifecycle of a session, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Submitting,
    Submitted(Attempt),
    /// Persistence failed; answers are intact and `submit` may be retried.
    SubmitFailed { reason: String },
    /// Identity was lost before the attempt was saved. Nothing was stored.
    ReauthenticationRequired,
    Closed,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Submitted(_) | Self::ReauthenticationRequired | Self::Closed
        )
    }
}

/// What asked for the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Expired,
}

/// Result of a submission request that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(Attempt),
    /// Another submission was already in flight or finished.
    Ignored,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Everything a session needs from the rest of the system.
pub(crate) struct SessionDeps {
    pub user_id: UserId,
    pub identity: Arc<dyn IdentityProvider>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub clock: Clock,
}

struct SessionState {
    questions: Vec<Question>,
    /// Question index → 0-based option.
    answers: BTreeMap<usize, u8>,
    marked: BTreeSet<usize>,
    current: usize,
    countdown: Countdown,
    guard: SubmissionGuard,
    closed: bool,
}

struct Inner {
    state: Mutex<SessionState>,
    status: watch::Sender<SessionStatus>,
    deps: SessionDeps,
    ticker: Mutex<Option<JoinHandle<()>>>,
    dropped_questions: usize,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, status: SessionStatus) {
        self.status.send_replace(status);
    }

    fn abort_ticker(&self) {
        let handle = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let handle = self
            .ticker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// A running, timed assessment.
///
/// Cloning yields another handle to the same session. Answers live in memory
/// until exactly one submission succeeds; the countdown submits on its own at
/// zero. Dropping every handle stops the countdown.
#[derive(Clone)]
pub struct AssessmentSession {
    inner: Arc<Inner>,
}

impl AssessmentSession {
    /// Build a session over `questions` and start its countdown.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestionsAvailable` if `questions` is empty.
    pub(crate) fn start(
        questions: Vec<Question>,
        duration_secs: u64,
        tick_period: Duration,
        dropped_questions: usize,
        deps: SessionDeps,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestionsAvailable);
        }

        let (status, _) = watch::channel(SessionStatus::InProgress);
        let inner = Arc::new(Inner {
            state: Mutex::new(SessionState {
                questions,
                answers: BTreeMap::new(),
                marked: BTreeSet::new(),
                current: 0,
                countdown: Countdown::new(duration_secs),
                guard: SubmissionGuard::default(),
                closed: false,
            }),
            status,
            deps,
            ticker: Mutex::new(None),
            dropped_questions,
        });

        let handle = spawn_ticker(Arc::downgrade(&inner), tick_period);
        *inner.ticker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        Ok(Self { inner })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.inner.deps.user_id
    }

    /// Candidates lost to storage failures while the question set was built.
    #[must_use]
    pub fn dropped_questions(&self) -> usize {
        self.inner.dropped_questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.inner.lock().questions.len()
    }

    #[must_use]
    pub fn questions(&self) -> Vec<Question> {
        self.inner.lock().questions.clone()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<Question> {
        self.inner.lock().questions.get(index).cloned()
    }

    // ─── navigation ───

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.inner.lock().current
    }

    /// Jump to `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidIndex` if there is no such question.
    pub fn go_to(&self, index: usize) -> Result<usize, SessionError> {
        let mut state = self.inner.lock();
        check_index(&state, index)?;
        state.current = index;
        Ok(index)
    }

    /// Advance one question, staying on the last one.
    pub fn next(&self) -> usize {
        let mut state = self.inner.lock();
        let last = state.questions.len().saturating_sub(1);
        state.current = (state.current + 1).min(last);
        state.current
    }

    /// Step back one question, staying on the first one.
    pub fn previous(&self) -> usize {
        let mut state = self.inner.lock();
        state.current = state.current.saturating_sub(1);
        state.current
    }

    // ─── answers ───

    /// Record a 0-based option for question `index`, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` / `SessionError::Completed` once the session no longer accepts answers.
    /// - `SessionError::InvalidIndex` / `SessionError::InvalidOption` for out-of-range input.
    pub fn select_answer(&self, index: usize, option: u8) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        ensure_editable(&state)?;
        check_index(&state, index)?;
        if usize::from(option) >= OPTION_COUNT {
            return Err(SessionError::InvalidOption(option));
        }
        state.answers.insert(index, option);
        Ok(())
    }

    /// Forget the answer to question `index`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`AssessmentSession::select_answer`], minus the option check.
    pub fn clear_answer(&self, index: usize) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        ensure_editable(&state)?;
        check_index(&state, index)?;
        state.answers.remove(&index);
        Ok(())
    }

    /// Flip the review mark on question `index`. Returns whether it is now marked.
    ///
    /// # Errors
    ///
    /// Same conditions as [`AssessmentSession::clear_answer`].
    pub fn toggle_review(&self, index: usize) -> Result<bool, SessionError> {
        let mut state = self.inner.lock();
        ensure_editable(&state)?;
        check_index(&state, index)?;
        if state.marked.remove(&index) {
            Ok(false)
        } else {
            state.marked.insert(index);
            Ok(true)
        }
    }

    #[must_use]
    pub fn selected_answer(&self, index: usize) -> Option<u8> {
        self.inner.lock().answers.get(&index).copied()
    }

    #[must_use]
    pub fn is_marked(&self, index: usize) -> bool {
        self.inner.lock().marked.contains(&index)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidIndex` if there is no such question.
    pub fn question_status(&self, index: usize) -> Result<QuestionStatus, SessionError> {
        let state = self.inner.lock();
        check_index(&state, index)?;
        Ok(QuestionStatus::from_flags(
            state.answers.contains_key(&index),
            state.marked.contains(&index),
        ))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let state = self.inner.lock();
        SessionProgress {
            total: state.questions.len(),
            answered: state.answers.len(),
            marked: state.marked.len(),
            current: state.current,
            remaining_secs: state.countdown.remaining_secs(),
            phase: state.guard.phase(),
        }
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u64 {
        self.inner.lock().countdown.remaining_secs()
    }

    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        self.inner.lock().guard.phase()
    }

    // ─── lifecycle ───

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.status.borrow().clone()
    }

    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Score the current answers and store them as this session's attempt.
    ///
    /// Manual and timer-driven requests share this path. Only one is admitted;
    /// any request arriving while another is in flight, or after success,
    /// returns `SubmitOutcome::Ignored`.
    ///
    /// Status changes are published under the session lock, so the watch
    /// channel always ends on the same state the session is in.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the session was closed before or during the request.
    ///   Nothing is stored: a write still in flight is cancelled.
    /// - `SessionError::SessionExpiredMidFlight` if the identity is gone or changed.
    ///   The session is over and nothing was stored.
    /// - `SessionError::PersistenceFailure` if storage failed. The session can be submitted again.
    pub async fn submit(&self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SessionError> {
        let scorecard = {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(SessionError::Closed);
            }
            if !state.guard.try_begin() {
                debug!(?trigger, phase = ?state.guard.phase(), "submission ignored");
                return Ok(SubmitOutcome::Ignored);
            }
            self.inner.publish(SessionStatus::Submitting);
            Scorecard::from_answers(&state.questions, &state.answers)
        };
        info!(?trigger, answered = scorecard.responses.len(), "submitting assessment");

        let user_id = self.inner.deps.user_id;
        if self.inner.deps.identity.current_user().await != Some(user_id) {
            return Err(self.expire_mid_flight());
        }

        if self.inner.lock().closed {
            debug!("session closed before persisting, nothing stored");
            return Err(SessionError::Closed);
        }

        let attempt = scorecard.to_new_attempt(user_id, self.inner.deps.clock.now());
        let mut status = self.inner.status.subscribe();
        let result = tokio::select! {
            result = self
                .inner
                .deps
                .attempts
                .record_attempt(&attempt, &scorecard.responses) => result,
            () = wait_for_close(&mut status) => {
                debug!("session closed while persisting, write cancelled");
                return Err(SessionError::Closed);
            }
        };

        let mut state = self.inner.lock();
        if state.closed {
            debug!("discarding submission result for closed session");
            return Err(SessionError::Closed);
        }

        match result {
            Ok(stored) => {
                state.guard.finish();
                state.countdown.stop();
                info!(
                    attempt_id = %stored.id(),
                    total = stored.total_score(),
                    recommended = %stored.recommended_domain(),
                    "assessment submitted"
                );
                self.inner.publish(SessionStatus::Submitted(stored.clone()));
                Ok(SubmitOutcome::Submitted(stored))
            }
            Err(err) if err.is_credential_expired() => {
                drop(state);
                Err(self.expire_mid_flight())
            }
            Err(err) => {
                state.guard.release();
                warn!(error = %err, "failed to persist attempt");
                self.inner.publish(SessionStatus::SubmitFailed {
                    reason: err.to_string(),
                });
                Err(SessionError::PersistenceFailure(err))
            }
        }
    }

    /// Stop the countdown and refuse further changes.
    ///
    /// A submission in flight is cancelled and stores nothing. Once a
    /// submission has finished the session is left as it is.
    pub fn close(&self) {
        let was_ticking = {
            let mut state = self.inner.lock();
            if state.closed || state.guard.phase() == SubmissionPhase::Done {
                return;
            }
            state.closed = true;
            self.inner.publish(SessionStatus::Closed);
            state.countdown.stop()
        };
        // Once expired the ticker is running the automatic submission, which
        // sees the close on its own.
        if was_ticking {
            self.inner.abort_ticker();
        }
        debug!("session closed");
    }

    fn expire_mid_flight(&self) -> SessionError {
        let mut state = self.inner.lock();
        if state.closed {
            return SessionError::Closed;
        }
        state.guard.finish();
        state.countdown.stop();
        warn!("identity lost during submission, nothing stored");
        self.inner.publish(SessionStatus::ReauthenticationRequired);
        SessionError::SessionExpiredMidFlight
    }
}

/// Resolves once `Closed` is published. Never resolves if the sender is gone.
async fn wait_for_close(status: &mut watch::Receiver<SessionStatus>) {
    let closed = status
        .wait_for(|status| matches!(status, SessionStatus::Closed))
        .await
        .is_ok();
    if !closed {
        std::future::pending::<()>().await;
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("AssessmentSession")
            .field("user_id", &self.inner.deps.user_id)
            .field("questions_len", &state.questions.len())
            .field("answered", &state.answers.len())
            .field("current", &state.current)
            .field("countdown", &state.countdown.state())
            .field("phase", &state.guard.phase())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

fn check_index(state: &SessionState, index: usize) -> Result<(), SessionError> {
    if index < state.questions.len() {
        Ok(())
    } else {
        Err(SessionError::InvalidIndex {
            index,
            len: state.questions.len(),
        })
    }
}

fn ensure_editable(state: &SessionState) -> Result<(), SessionError> {
    if state.closed {
        return Err(SessionError::Closed);
    }
    if state.guard.phase() != SubmissionPhase::Idle || state.countdown.is_expired() {
        return Err(SessionError::Completed);
    }
    Ok(())
}

//
// ─── TICKER ────────────────────────────────────────────────────────────────────
//

/// Drives the countdown. Holds only a weak handle so it never keeps a session alive.
fn spawn_ticker(session: Weak<Inner>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            let Some(inner) = session.upgrade() else {
                return;
            };
            let tick = inner.lock().countdown.tick();
            match tick {
                Tick::Remaining(_) => {}
                Tick::Inactive => return,
                Tick::Expired => {
                    info!("time is up, submitting automatically");
                    let session = AssessmentSession { inner };
                    if let Err(err) = session.submit(SubmitTrigger::Expired).await {
                        warn!(error = %err, "automatic submission failed");
                    }
                    return;
                }
            }
        }
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentity;
    use assess_core::model::{Difficulty, Domain, QuestionDraft, QuestionId};
    use assess_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;
    use uuid::Uuid;

    fn questions(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|id| {
                QuestionDraft::new(
                    format!("Question {id}?"),
                    ["a", "b", "c", "d"],
                    1,
                    Domain::Analytics,
                    Difficulty::Easy,
                )
                .validate()
                .unwrap()
                .assign_id(QuestionId::new(id))
            })
            .collect()
    }

    fn session(n: u64) -> AssessmentSession {
        let user = UserId::new(Uuid::from_u128(1));
        AssessmentSession::start(
            questions(n),
            60,
            Duration::from_secs(1),
            0,
            SessionDeps {
                user_id: user,
                identity: Arc::new(StaticIdentity::signed_in(user)),
                attempts: Arc::new(InMemoryRepository::new()),
                clock: fixed_clock(),
            },
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn empty_question_set_is_refused() {
        let user = UserId::new(Uuid::nil());
        let err = AssessmentSession::start(
            Vec::new(),
            60,
            Duration::from_secs(1),
            0,
            SessionDeps {
                user_id: user,
                identity: Arc::new(StaticIdentity::signed_in(user)),
                attempts: Arc::new(InMemoryRepository::new()),
                clock: fixed_clock(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::NoQuestionsAvailable));
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_is_clamped() {
        let session = session(3);
        assert_eq!(session.previous(), 0);
        assert_eq!(session.next(), 1);
        assert_eq!(session.next(), 2);
        assert_eq!(session.next(), 2);
        assert_eq!(session.go_to(0).unwrap(), 0);
        assert!(matches!(
            session.go_to(3),
            Err(SessionError::InvalidIndex { index: 3, len: 3 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn answers_and_marks_drive_question_status() {
        let session = session(3);
        session.select_answer(0, 2).unwrap();
        assert!(session.toggle_review(0).unwrap());
        assert!(session.toggle_review(1).unwrap());

        assert_eq!(session.question_status(0).unwrap(), QuestionStatus::Answered);
        assert_eq!(session.question_status(1).unwrap(), QuestionStatus::Marked);
        assert_eq!(
            session.question_status(2).unwrap(),
            QuestionStatus::NotAnswered
        );

        session.select_answer(0, 3).unwrap();
        assert_eq!(session.selected_answer(0), Some(3));
        session.clear_answer(0).unwrap();
        assert_eq!(session.question_status(0).unwrap(), QuestionStatus::Marked);
        assert!(!session.toggle_review(0).unwrap());
        assert!(!session.is_marked(0));
        assert!(session.is_marked(1));

        let progress = session.progress();
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.marked, 1);
        assert_eq!(progress.unanswered(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_input_is_rejected() {
        let session = session(2);
        assert!(matches!(
            session.select_answer(5, 0),
            Err(SessionError::InvalidIndex { .. })
        ));
        assert!(matches!(
            session.select_answer(0, 4),
            Err(SessionError::InvalidOption(4))
        ));
        assert_eq!(session.selected_answer(0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_refuses_changes_and_submission() {
        let session = session(2);
        session.close();
        assert_eq!(session.status(), SessionStatus::Closed);
        assert!(matches!(
            session.select_answer(0, 0),
            Err(SessionError::Closed)
        ));
        assert!(matches!(
            session.submit(SubmitTrigger::Manual).await,
            Err(SessionError::Closed)
        ));
        assert_eq!(session.remaining_seconds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_count_the_clock_down() {
        let session = session(1);
        assert_eq!(session.remaining_seconds(), 60);
        time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(session.remaining_seconds(), 50);
    }
}
