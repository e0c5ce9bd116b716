//! Lane switching
//!
//! Input focus belongs to exactly one lane. A switch request hands it to
//! another lane over a short transition; only one handoff is ever in flight.

use serde::{Deserialize, Serialize};

use super::lane::LaneState;

/// What the session is doing with input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayPhase {
    /// Hit notes are judged against the active lane
    Notes,
    /// Focus is moving to the goal lane
    Transition,
}

/// Tracks the active lane and any handoff in progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneSwitcher {
    phase: PlayPhase,
    active: usize,
    goal: usize,
    /// Transport sample at which the transition started
    start: i64,
    /// Samples elapsed in the current transition
    progress: i64,
    /// Length of a transition in samples
    duration: i64,
}

impl LaneSwitcher {
    pub fn new(active: usize, duration: i64) -> Self {
        Self {
            phase: PlayPhase::Notes,
            active,
            goal: active,
            start: 0,
            progress: 0,
            duration: duration.max(1),
        }
    }

    pub fn phase(&self) -> PlayPhase {
        self.phase
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn goal(&self) -> usize {
        self.goal
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Lane whose hit notes receive input this frame
    pub fn judged_lane(&self) -> usize {
        match self.phase {
            PlayPhase::Notes => self.active,
            PlayPhase::Transition => self.goal,
        }
    }

    /// Start a handoff to `goal`. Returns false if the request is ignored
    /// (already transitioning, or `goal` is the active lane).
    pub fn request(&mut self, goal: usize, current_sample: i64) -> bool {
        if self.phase == PlayPhase::Transition || goal == self.active {
            return false;
        }
        self.phase = PlayPhase::Transition;
        self.goal = goal;
        self.start = current_sample;
        self.progress = 0;
        log::debug!("lane switch {} -> {} at sample {}", self.active, goal, current_sample);
        true
    }

    /// Advance an in-flight transition. Returns the new active lane once it completes.
    pub fn advance(&mut self, current_sample: i64) -> Option<usize> {
        if self.phase != PlayPhase::Transition {
            return None;
        }
        self.progress = (current_sample - self.start).max(0);
        if self.progress < self.duration {
            return None;
        }
        self.active = self.goal;
        self.phase = PlayPhase::Notes;
        self.progress = 0;
        Some(self.active)
    }

    /// Transition progress in [0, 1]; zero outside a transition
    pub fn fraction(&self) -> f32 {
        match self.phase {
            PlayPhase::Notes => 0.0,
            PlayPhase::Transition => (self.progress as f32 / self.duration as f32).clamp(0.0, 1.0),
        }
    }

    pub fn lane_state(&self, lane: usize) -> LaneState {
        if lane == self.active {
            LaneState::Active
        } else if self.phase == PlayPhase::Transition && lane == self.goal {
            LaneState::Transitioning
        } else {
            LaneState::Inactive
        }
    }
}
