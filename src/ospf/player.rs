/*!
Cursor over a finished step log.

The player owns a copy of the log and the baseline it was produced from. Each
advance re-applies one step with the same function the engine used, so the state
at index N is always what the engine had after step N-1. The log itself is never
modified.
*/

use thiserror::Error;
use tracing::debug;

use crate::ospf::{
    state::RouterStates,
    step::{Step, StepLog},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("No steps to play")]
    EmptyLog,
    #[error("Step {index} is out of range (log has {len} steps)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// What a call to `StepPlayer::advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The step at this index was applied.
    Applied(usize),
    /// The log was already exhausted; the cursor is back at 0.
    Completed,
}

#[derive(Debug, Clone)]
pub struct StepPlayer {
    log: StepLog,
    baseline: RouterStates,
    state: RouterStates,
    index: usize,
}

impl StepPlayer {
    pub fn new(log: StepLog, baseline: RouterStates) -> Self {
        Self {
            state: baseline.clone(),
            log,
            baseline,
            index: 0,
        }
    }

    /// Index of the next step to apply.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Whether any step has been applied since the last reset or wrap.
    pub fn is_started(&self) -> bool {
        self.index > 0
    }

    pub fn log(&self) -> &StepLog {
        &self.log
    }

    pub fn state(&self) -> &RouterStates {
        &self.state
    }

    pub fn baseline(&self) -> &RouterStates {
        &self.baseline
    }

    /// The most recently applied step.
    pub fn current(&self) -> Option<&Step> {
        self.index.checked_sub(1).and_then(|i| self.log.get(i))
    }

    /// Applies the step at the cursor. Once the log is exhausted, the next call
    /// reports `Completed` and rewinds; the state stays at the end of the log
    /// until the first step is applied again.
    pub fn advance(&mut self) -> Result<Advance, PlaybackError> {
        if self.log.is_empty() {
            return Err(PlaybackError::EmptyLog);
        }
        if self.index >= self.log.len() {
            debug!(len = self.log.len(), "playback complete, rewinding");
            self.index = 0;
            return Ok(Advance::Completed);
        }
        if self.index == 0 {
            self.state = self.baseline.clone();
        }
        let applied = self.index;
        self.state.apply(&self.log[applied]);
        self.index += 1;
        debug!(step = applied, kind = self.log[applied].action.kind(), "step applied");
        Ok(Advance::Applied(applied))
    }

    /// Resets to the baseline and applies steps `0..=index`.
    pub fn jump_to(&mut self, index: usize) -> Result<&RouterStates, PlaybackError> {
        if self.log.is_empty() {
            return Err(PlaybackError::EmptyLog);
        }
        if index >= self.log.len() {
            return Err(PlaybackError::IndexOutOfRange { index, len: self.log.len() });
        }
        self.state = self.baseline.clone();
        for step in self.log.iter().take(index + 1) {
            self.state.apply(step);
        }
        self.index = index + 1;
        Ok(&self.state)
    }

    /// Back to index 0 and the baseline state.
    pub fn reset(&mut self) {
        self.index = 0;
        self.state = self.baseline.clone();
    }
}
