use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::watch;
use uuid::Uuid;

use crate::core::time::format_clock;
use crate::schemas::answer::SubmitTrigger;
use crate::schemas::identity::SessionIdentity;
use crate::schemas::session::{
    NavigationView, OptionView, QuestionView, ResultView, SessionPhase, SessionView, TimerView,
};
use crate::services::question_store::QuestionStore;
use crate::services::submission::{OutcomeStatus, PreparedSubmission, SubmissionOutcome};
use crate::session::answers::AnswerMap;
use crate::session::countdown::{Countdown, Tick};
use crate::session::error::SessionError;
use crate::session::navigation::Navigator;

pub(crate) const TIME_UP_NOTICE: &str = "Time is up! Submitting your test...";

/// Owns every piece of per-session state. Phases only move forward:
/// `AwaitingRegistration -> InProgress -> Submitting -> Completed | DeliveryFailed`.
pub(crate) struct SessionController {
    store: Arc<QuestionStore>,
    duration_seconds: u64,
    state: SessionState,
}

enum SessionState {
    AwaitingRegistration,
    Active(Box<ActiveSession>),
    Frozen(Box<FrozenSession>),
}

struct ActiveSession {
    session_id: Uuid,
    identity: SessionIdentity,
    navigator: Navigator,
    answers: AnswerMap,
    countdown: Countdown,
    countdown_stop: watch::Sender<bool>,
    notice: Option<String>,
}

struct FrozenSession {
    session_id: Uuid,
    identity: SessionIdentity,
    remaining_seconds: u64,
    answered: usize,
    prepared: PreparedSubmission,
    notice: Option<String>,
    outcome: Option<SubmissionOutcome>,
}

impl SessionController {
    pub(crate) fn new(store: Arc<QuestionStore>, duration_seconds: u64) -> Self {
        Self { store, duration_seconds, state: SessionState::AwaitingRegistration }
    }

    pub(crate) fn total_questions(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        match &self.state {
            SessionState::AwaitingRegistration => SessionPhase::AwaitingRegistration,
            SessionState::Active(_) => SessionPhase::InProgress,
            SessionState::Frozen(frozen) => match frozen.outcome.as_ref().map(|o| o.status) {
                None => SessionPhase::Submitting,
                Some(OutcomeStatus::Completed) => SessionPhase::Completed,
                Some(OutcomeStatus::DeliveryFailed) => SessionPhase::DeliveryFailed,
            },
        }
    }

    /// Starts the test. The returned receiver flips to `true` when the
    /// countdown must stop ticking.
    pub(crate) fn register(
        &mut self,
        identity: SessionIdentity,
    ) -> Result<(Uuid, watch::Receiver<bool>), SessionError> {
        if !matches!(self.state, SessionState::AwaitingRegistration) {
            return Err(SessionError::WrongPhase(self.phase()));
        }

        let session_id = Uuid::new_v4();
        let (countdown_stop, stop_rx) = watch::channel(false);
        let total = self.store.len();

        self.state = SessionState::Active(Box::new(ActiveSession {
            session_id,
            identity,
            navigator: Navigator::new(total),
            answers: AnswerMap::new(total),
            countdown: Countdown::new(self.duration_seconds),
            countdown_stop,
            notice: None,
        }));

        Ok((session_id, stop_rx))
    }

    pub(crate) fn next(&mut self) -> Result<(), SessionError> {
        self.active_mut()?.navigator.next();
        Ok(())
    }

    pub(crate) fn previous(&mut self) -> Result<(), SessionError> {
        self.active_mut()?.navigator.previous();
        Ok(())
    }

    pub(crate) fn select(&mut self, option: &str) -> Result<(), SessionError> {
        let store = Arc::clone(&self.store);
        let active = self.active_mut()?;
        let index = active.navigator.current().ok_or(SessionError::NoQuestions)?;
        let question = store.get(index).ok_or(SessionError::NoQuestions)?;

        if !question.has_option(option) {
            return Err(SessionError::UnknownOption(option.to_string()));
        }

        active.answers.record(index, &question.id, option)
    }

    /// Advances the countdown by one period. On `Expired` the caller must run
    /// the submission pipeline with [`SubmitTrigger::Timeout`].
    pub(crate) fn tick(&mut self) -> Tick {
        let SessionState::Active(active) = &mut self.state else {
            return Tick::Stopped;
        };

        let tick = active.countdown.tick();
        if tick == Tick::Expired {
            active.notice = Some(TIME_UP_NOTICE.to_string());
        }
        tick
    }

    /// Freeze step: stops the countdown, assembles the payload and locks the
    /// session against further navigation or submission.
    pub(crate) fn begin_submission(
        &mut self,
        trigger: SubmitTrigger,
        now: OffsetDateTime,
    ) -> Result<PreparedSubmission, SessionError> {
        let active = match &mut self.state {
            SessionState::Active(active) => active,
            SessionState::AwaitingRegistration => {
                return Err(SessionError::WrongPhase(SessionPhase::AwaitingRegistration));
            }
            SessionState::Frozen(_) => return Err(SessionError::AlreadySubmitted),
        };

        if trigger == SubmitTrigger::Manual && !active.navigator.is_last() {
            return Err(SessionError::SubmitUnavailable);
        }

        let records = active.answers.assemble(&self.store);
        let prepared = PreparedSubmission::prepare(
            active.session_id,
            &active.identity,
            records,
            trigger,
            now,
        )?;

        active.countdown.stop();
        let _ = active.countdown_stop.send(true);

        let frozen = FrozenSession {
            session_id: active.session_id,
            identity: active.identity.clone(),
            remaining_seconds: active.countdown.remaining_seconds(),
            answered: active.answers.answered(),
            prepared: prepared.clone(),
            notice: active.notice.take(),
            outcome: None,
        };
        self.state = SessionState::Frozen(Box::new(frozen));

        Ok(prepared)
    }

    pub(crate) fn finish_submission(&mut self, outcome: SubmissionOutcome) {
        if let SessionState::Frozen(frozen) = &mut self.state {
            if frozen.outcome.is_none() {
                frozen.outcome = Some(outcome);
                return;
            }
        }
        tracing::warn!(phase = ?self.phase(), "Ignoring late submission outcome");
    }

    /// The assembled payload, available from the freeze onwards.
    pub(crate) fn prepared(&self) -> Option<&PreparedSubmission> {
        match &self.state {
            SessionState::Frozen(frozen) => Some(&frozen.prepared),
            _ => None,
        }
    }

    pub(crate) fn view(&self) -> SessionView {
        let mut view = SessionView {
            phase: self.phase(),
            session_id: None,
            identity: None,
            total_questions: self.total_questions(),
            answered: 0,
            timer: None,
            question: None,
            navigation: None,
            notice: None,
            result: None,
        };

        match &self.state {
            SessionState::AwaitingRegistration => {}
            SessionState::Active(active) => {
                view.session_id = Some(active.session_id);
                view.identity = Some(active.identity.clone());
                view.answered = active.answers.answered();
                view.timer = Some(TimerView {
                    remaining_seconds: active.countdown.remaining_seconds(),
                    display: active.countdown.display(),
                    running: !active.countdown.is_stopped(),
                });
                view.notice = active.notice.clone();
                view.question = self.question_view(active);
                if view.question.is_some() {
                    view.navigation = Some(NavigationView {
                        can_previous: active.navigator.can_previous(),
                        can_next: active.navigator.can_next(),
                        submit_visible: active.navigator.is_last(),
                    });
                }
            }
            SessionState::Frozen(frozen) => {
                view.session_id = Some(frozen.session_id);
                view.identity = Some(frozen.identity.clone());
                view.answered = frozen.answered;
                view.timer = Some(TimerView {
                    remaining_seconds: frozen.remaining_seconds,
                    display: format_clock(frozen.remaining_seconds),
                    running: false,
                });
                view.notice = frozen.notice.clone();
                view.result = frozen.outcome.as_ref().map(|outcome| ResultView {
                    message: outcome.message.clone(),
                    filename: frozen.prepared.file.filename.clone(),
                    delivery: Some(outcome.receipt.clone()),
                });
            }
        }

        view
    }

    fn question_view(&self, active: &ActiveSession) -> Option<QuestionView> {
        let index = active.navigator.current()?;
        let question = self.store.get(index)?;
        let selected = active.answers.selected(index);

        Some(QuestionView {
            index,
            id: question.id.clone(),
            prompt: question.display_prompt().to_string(),
            counter: active.navigator.counter()?,
            options: question
                .options
                .iter()
                .map(|option| OptionView {
                    key: option.key.clone(),
                    text: option.text.clone(),
                    selected: selected == Some(option.key.as_str()),
                })
                .collect(),
        })
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession, SessionError> {
        let phase = self.phase();
        match &mut self.state {
            SessionState::Active(active) => Ok(&mut **active),
            _ => Err(SessionError::WrongPhase(phase)),
        }
    }
}
