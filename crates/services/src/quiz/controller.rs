use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use quiz_core::model::{
    AnswerStep, AnsweredEntry, Question, ScoreSummary, SessionState, TickStep,
};

use super::countdown::{Countdown, Tick};
use crate::error::QuizError;
use crate::question_source::{QuestionKind, QuestionSource, fetch_or_empty};
use crate::session_store::SessionStore;

/// Message shown when no question set could be obtained.
pub const LOAD_FAILED_MESSAGE: &str = "failed to load questions";

pub const DEFAULT_AMOUNT: u32 = 10;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    pub amount: u32,
    pub kind: QuestionKind,
    pub time_limit_secs: u32,
    pub tick_period: Duration,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            amount: DEFAULT_AMOUNT,
            kind: QuestionKind::Multiple,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            tick_period: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    Loading,
    Error(String),
    Ready,
    Answering,
    Finished,
}

/// Result of one controller event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    Advanced { index: usize },
    Ticked { remaining: u32 },
    Finished,
    Ignored,
}

/// The `(questions, answers)` pair handed to the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub questions: Vec<Question>,
    pub answers: Vec<AnsweredEntry>,
}

impl QuizOutcome {
    #[must_use]
    pub fn score(&self) -> ScoreSummary {
        ScoreSummary::compute(&self.questions, &self.answers)
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one quiz attempt: `Loading → {Error | Ready} → Answering → Finished`.
///
/// All mutation happens through `&mut self`, so events are applied strictly in
/// the order the caller delivers them. The persisted snapshot is rewritten after
/// every change while the quiz is running and erased once it finishes.
pub struct QuizController {
    source: Arc<dyn QuestionSource>,
    store: SessionStore,
    config: QuizConfig,
    phase: QuizPhase,
    state: Option<SessionState>,
    outcome: Option<QuizOutcome>,
    countdown: Option<Countdown>,
}

impl QuizController {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>, store: SessionStore, config: QuizConfig) -> Self {
        Self {
            source,
            store,
            config,
            phase: QuizPhase::Loading,
            state: None,
            outcome: None,
            countdown: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase != QuizPhase::Answering {
            return None;
        }
        self.state.as_ref().and_then(SessionState::current_question)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&QuizOutcome> {
        self.outcome.as_ref()
    }

    pub fn take_outcome(&mut self) -> Option<QuizOutcome> {
        self.outcome.take()
    }

    /// Resume the persisted session or fetch a fresh question set.
    ///
    /// Only acts while `Loading`; later calls return the current phase.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Store` if a persisted session exists but cannot be
    /// restored, or if the snapshot cannot be written.
    pub async fn load(&mut self) -> Result<&QuizPhase, QuizError> {
        if self.phase != QuizPhase::Loading {
            return Ok(&self.phase);
        }

        let state = if let Some(saved) = self.store.load().await? {
            log::info!(
                "resuming quiz at question {} with {}s left",
                saved.current_index() + 1,
                saved.seconds_remaining()
            );
            saved
        } else {
            let questions =
                fetch_or_empty(self.source.as_ref(), self.config.amount, self.config.kind).await;
            match SessionState::new(questions, self.config.time_limit_secs) {
                Ok(state) => state,
                Err(err) => {
                    log::warn!("no quiz available: {err}");
                    self.phase = QuizPhase::Error(LOAD_FAILED_MESSAGE.to_owned());
                    return Ok(&self.phase);
                }
            }
        };

        self.state = Some(state);
        self.phase = QuizPhase::Ready;
        self.begin().await?;
        Ok(&self.phase)
    }

    async fn begin(&mut self) -> Result<(), QuizError> {
        let Some(state) = self.state.as_ref() else {
            return Ok(());
        };
        if state.is_exhausted() {
            self.finish().await;
            return Ok(());
        }
        self.store.save(state).await?;
        self.phase = QuizPhase::Answering;
        log::info!(
            "quiz answering: {} questions, {}s",
            state.questions().len(),
            state.seconds_remaining()
        );
        Ok(())
    }

    /// Start the one-second countdown. Returns the tick stream to feed back
    /// into [`QuizController::tick`], or `None` when not answering.
    ///
    /// The ticker is cancelled when the quiz finishes or the controller is dropped.
    pub fn start_countdown(&mut self) -> Option<mpsc::Receiver<Tick>> {
        if self.phase != QuizPhase::Answering {
            return None;
        }
        let (countdown, ticks) = Countdown::start(self.config.tick_period);
        if let Some(previous) = self.countdown.replace(countdown) {
            previous.cancel();
        }
        Some(ticks)
    }

    #[must_use]
    pub fn countdown_running(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_running)
    }

    /// Record an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotAnswering` outside the answering phase,
    /// `QuizError::Session` if `selected` is not one of the current choices, or
    /// `QuizError::Store` if persistence fails.
    pub async fn submit_answer(&mut self, selected: &str) -> Result<QuizEvent, QuizError> {
        if self.phase != QuizPhase::Answering {
            return Err(QuizError::NotAnswering);
        }
        let Some(state) = self.state.as_mut() else {
            return Err(QuizError::NotAnswering);
        };

        match state.record_answer(selected)? {
            AnswerStep::Advanced { index } => {
                self.store.save(state).await?;
                Ok(QuizEvent::Advanced { index })
            }
            AnswerStep::Completed => {
                self.finish().await;
                Ok(QuizEvent::Finished)
            }
        }
    }

    /// Apply one countdown tick. Ignored unless answering.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Store` if persistence fails.
    pub async fn tick(&mut self) -> Result<QuizEvent, QuizError> {
        if self.phase != QuizPhase::Answering {
            return Ok(QuizEvent::Ignored);
        }
        let Some(state) = self.state.as_mut() else {
            return Ok(QuizEvent::Ignored);
        };

        match state.tick() {
            TickStep::Ticked { remaining } => {
                self.store.save(state).await?;
                Ok(QuizEvent::Ticked { remaining })
            }
            TickStep::Expired => {
                log::info!("quiz time is up");
                self.finish().await;
                Ok(QuizEvent::Finished)
            }
            TickStep::Ignored => Ok(QuizEvent::Ignored),
        }
    }

    /// Stop the clock, erase the snapshot and hand over the outcome.
    ///
    /// A failed erase is logged; the quiz still counts as finished.
    async fn finish(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
        if let Err(err) = self.store.clear().await {
            log::error!("failed to erase finished quiz snapshot: {err}");
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.finish();
        self.phase = QuizPhase::Finished;
        self.outcome = Some(QuizOutcome {
            questions: state.questions().to_vec(),
            answers: state.answers().to_vec(),
        });
        log::info!(
            "quiz finished with {} of {} answered",
            state.answers().len(),
            state.questions().len()
        );
    }
}

impl fmt::Debug for QuizController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizController")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("has_outcome", &self.outcome.is_some())
            .field("countdown_running", &self.countdown_running())
            .finish_non_exhaustive()
    }
}
