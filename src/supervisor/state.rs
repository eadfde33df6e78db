//! Job state machine.

use serde::{Deserialize, Serialize};

/// Current state of a supervised job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    StopRequested,
    Finished,
}

impl JobState {
    /// Whether moving from `self` to `next` is allowed.
    #[must_use]
    pub fn can_transition(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::StopRequested | Self::Finished)
                | (Self::StopRequested, Self::Finished)
        )
    }

    /// Returns true once the job has finished.
    #[must_use]
    pub fn is_finished(self) -> bool {
        self == Self::Finished
    }
}

/// State machine for tracking a job's progress through its lifecycle.
#[derive(Debug, Clone, Default)]
pub struct JobStateMachine {
    state: JobState,
    lines_read: usize,
    exit_observed: bool,
}

impl JobStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Move to `new_state`. Returns false and keeps the current state if
    /// the transition is not allowed.
    pub fn transition(&mut self, new_state: JobState) -> bool {
        if !self.state.can_transition(new_state) {
            tracing::debug!(from = ?self.state, to = ?new_state, "Ignoring state transition");
            return false;
        }
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
        true
    }

    pub fn record_line(&mut self) {
        self.lines_read = self.lines_read.saturating_add(1);
    }

    pub fn record_exit(&mut self) {
        self.exit_observed = true;
    }

    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    #[must_use]
    pub fn exit_observed(&self) -> bool {
        self.exit_observed
    }
}
