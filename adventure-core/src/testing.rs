//! Testing utilities for the adventure engine.
//!
//! This module provides deterministic stand-ins for the remote services:
//! - `ScriptedGenerator` replays queued turns and failures, and records prompts
//! - `RecordingNarrator` records what it was asked to say

use crate::generator::{GenerationError, Generator};
use crate::narration::{Audio, NarrationError, Narrator, Voice};
use crate::prompts::Prompt;
use crate::turn::Turn;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// A turn whose choices are `"{label} choice 1"` through `"{label} choice 4"`.
pub fn sample_turn(label: &str) -> Turn {
    Turn::new(
        format!("{label}: the story continues."),
        std::array::from_fn(|i| format!("{label} choice {}", i + 1)),
    )
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A generator that returns scripted results in order.
///
/// Once the script runs out it keeps answering with a filler turn.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<Turn, GenerationError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a turn.
    pub fn then(self, turn: Turn) -> Self {
        self.push(Ok(turn));
        self
    }

    /// Queue a failure.
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(GenerationError::Malformed(reason.into())));
        self
    }

    pub fn push(&self, result: Result<Turn, GenerationError>) {
        lock(&self.script).push_back(result);
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<Prompt> {
        lock(&self.prompts).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Turn, GenerationError> {
        lock(&self.prompts).push(prompt.clone());
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Ok(sample_turn("The game master has no more scripted turns")))
    }
}

/// A narrator that records requests and returns placeholder audio.
#[derive(Default)]
pub struct RecordingNarrator {
    requests: Mutex<Vec<(String, Voice)>>,
    failing: bool,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A narrator whose every request fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(String, Voice)> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Narrator for RecordingNarrator {
    async fn narrate(&self, text: &str, voice: Voice) -> Result<Audio, NarrationError> {
        lock(&self.requests).push((text.to_string(), voice));
        if self.failing {
            return Err(NarrationError::Api(openai::Error::Network(
                "connection refused".to_string(),
            )));
        }
        Ok(Audio {
            bytes: text.as_bytes().to_vec(),
        })
    }
}
