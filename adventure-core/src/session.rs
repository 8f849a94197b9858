//! Session - the turn cycle of one adventure.
//!
//! A `Session` owns the [`GameState`] and the current [`Turn`]. Each call to
//! the generator is made against an immutable view of the state; the state is
//! only touched once a complete turn has come back, so a failed call leaves
//! everything exactly as it was.

use crate::generator::{GenerationError, Generator};
use crate::prompts::{build_prompt, PromptKind};
use crate::state::{Applied, Beat, GameState};
use crate::turn::{Turn, CHOICES_PER_TURN};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("the adventure has not started yet")]
    NotStarted,

    #[error("the adventure has already started")]
    AlreadyStarted,

    #[error("the adventure is over")]
    Finished,
}

impl SessionError {
    /// Whether trying the same operation again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Generation(_))
    }
}

/// A turn that has been applied, with what it changed.
#[derive(Debug, Clone)]
pub struct Step {
    pub turn: Turn,
    pub applied: Applied,
}

/// Result of starting or advancing a session.
#[derive(Debug, Clone)]
pub enum Progress {
    /// A new turn; the player picks one of its choices next.
    Continue(Step),
    /// The closing turn. The session accepts no further input.
    Complete(Step),
    /// The selection was out of range. Nothing changed; ask again.
    Reprompt { index: usize },
}

impl Progress {
    pub fn turn(&self) -> Option<&Turn> {
        match self {
            Progress::Continue(step) | Progress::Complete(step) => Some(&step.turn),
            Progress::Reprompt { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Progress::Complete(_))
    }
}

/// One adventure, from opening to ending.
pub struct Session<G> {
    generator: G,
    state: GameState,
    current: Option<Turn>,
    finished: bool,
}

impl<G: Generator> Session<G> {
    /// Create a session with an empty state.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            state: GameState::new(),
            current: None,
            finished: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The turn whose choices are on offer.
    pub fn current_turn(&self) -> Option<&Turn> {
        self.current.as_ref()
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Generate the opening turn.
    ///
    /// On failure the session is still unstarted and `start` may be retried.
    pub async fn start(&mut self) -> Result<Progress, SessionError> {
        if self.current.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let prompt = build_prompt(&self.state, PromptKind::Opening);
        let turn = self.generator.generate(&prompt).await?;
        info!("adventure started");

        Ok(self.commit(None, turn))
    }

    /// Take the choice at `index` (zero-based) and generate what follows.
    ///
    /// An index outside `0..4` yields [`Progress::Reprompt`] without calling
    /// the generator. On a generation error nothing changes and the same
    /// choice may be retried.
    pub async fn advance(&mut self, index: usize) -> Result<Progress, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        let current = self.current.as_ref().ok_or(SessionError::NotStarted)?;

        if index >= CHOICES_PER_TURN {
            debug!(index, "selection out of range");
            return Ok(Progress::Reprompt { index });
        }
        let action = current.choices[index].clone();

        let prompt = build_prompt(&self.state, PromptKind::Action(&action));
        let turn = self.generator.generate(&prompt).await?;

        let beat = Beat {
            action,
            outcome: turn.recap().to_string(),
        };
        Ok(self.commit(Some(beat), turn))
    }

    fn commit(&mut self, beat: Option<Beat>, turn: Turn) -> Progress {
        let applied = self.state.apply(beat, &turn.changes);
        self.current = Some(turn.clone());

        debug!(
            history = self.state.history().len(),
            inventory = self.state.inventory().len(),
            terminal = turn.terminal,
            "turn applied"
        );

        let step = Step { turn, applied };
        if step.turn.terminal {
            self.finished = true;
            info!(turns = self.state.history().len(), "adventure complete");
            Progress::Complete(step)
        } else {
            Progress::Continue(step)
        }
    }
}
