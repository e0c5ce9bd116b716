//! Scrolling hit targets

use serde::{Deserialize, Serialize};

use super::pool::Reclaim;
use crate::level::NoteData;

/// Note types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    /// Single tap on a line
    Beat,
    /// Press on the head, hold through the body, release at the tail
    Held,
    /// Lane-wide cue, hit by switching lanes
    Switch,
}

/// A note entity.
///
/// The schedule (`kind`, `line`, `hit_sample`, `hold_samples`) is fixed at
/// spawn; everything else is judgment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub kind: NoteKind,
    /// Line within the lane, -1 for switch notes
    pub line: i32,
    pub hit_sample: i64,
    pub hold_samples: i64,
    destroyed: bool,
    holding: bool,
    /// Whole beats already credited during the current hold
    pub held_for: i64,
    /// Competency delta applied when the note resolves
    pub hit_status: i32,
    /// Set once `hit_status` has been applied to the owning lane
    settled: bool,
    /// A miss has already been counted against this note
    penalized: bool,
    pub x: f32,
    /// Upper visible end: the head, or the tail of a held note. The note
    /// dies once this passes the die line.
    pub y: f32,
    /// Lower visible end (the head); pinned to the hit line while holding
    pub bottom_y: f32,
}

impl Note {
    pub fn new(kind: NoteKind, line: i32, hit_sample: i64, hold_samples: i64) -> Self {
        Self {
            kind,
            line,
            hit_sample,
            hold_samples,
            destroyed: false,
            holding: false,
            held_for: 0,
            hit_status: 0,
            settled: false,
            penalized: false,
            x: 0.0,
            y: 0.0,
            bottom_y: 0.0,
        }
    }

    /// Sample at which a held note should be released
    #[inline]
    pub fn tail_sample(&self) -> i64 {
        self.hit_sample + self.hold_samples
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mark the note destroyed. Destruction is permanent.
    #[inline]
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    #[inline]
    pub fn is_holding(&self) -> bool {
        self.holding
    }

    /// Engage or release a hold. Only held notes can be held.
    pub fn set_holding(&mut self, holding: bool) {
        debug_assert!(
            !holding || self.kind == NoteKind::Held,
            "only held notes can be held"
        );
        if holding && self.kind != NoteKind::Held {
            return;
        }
        self.holding = holding;
    }

    #[inline]
    pub fn is_penalized(&self) -> bool {
        self.penalized
    }

    #[inline]
    pub fn mark_penalized(&mut self) {
        self.penalized = true;
    }

    /// Take the pending competency delta if the note has resolved and not yet been settled
    pub fn take_settlement(&mut self) -> Option<i32> {
        if self.destroyed && !self.settled {
            self.settled = true;
            Some(self.hit_status)
        } else {
            None
        }
    }
}

impl From<NoteData> for Note {
    fn from(data: NoteData) -> Self {
        Note::new(data.kind, data.line, data.hit_sample, data.hold_samples)
    }
}

impl Reclaim for Note {
    fn is_reclaimable(&self) -> bool {
        self.destroyed
    }
}
