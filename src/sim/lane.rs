//! Lanes (band members)
//!
//! Each lane owns its notes and a competency meter. Notes move from the
//! level schedule into the live pools once they enter the scroll look-ahead.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::note::{Note, NoteKind};
use super::pool::{Pool, PoolPolicy};
use crate::level::{LaneData, ScrollGeometry};

/// Input focus of a lane, derived from the lane switcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneState {
    /// Receiving input (or handing it off, during a transition)
    Active,
    /// Goal of an in-flight transition
    Transitioning,
    Inactive,
}

/// One player-controllable track
#[derive(Debug, Clone)]
pub struct Lane {
    id: usize,
    competency: i32,
    max_competency: i32,
    loss_rate: i32,
    gain_rate: i32,
    lines: usize,
    /// Live beat and held notes, in spawn order
    pub hit_notes: Pool<Note>,
    /// Live switch notes, in spawn order
    pub switch_notes: Pool<Note>,
    /// Notes not yet spawned
    schedule: VecDeque<Note>,
}

impl Lane {
    pub fn new(id: usize, data: &LaneData, lines: usize) -> Self {
        Self {
            id,
            competency: data.max_competency,
            max_competency: data.max_competency,
            loss_rate: data.loss_rate,
            gain_rate: data.gain_rate,
            lines,
            hit_notes: Pool::new(PoolPolicy::Accumulate),
            switch_notes: Pool::new(PoolPolicy::Accumulate),
            schedule: data.notes.iter().copied().map(Note::from).collect(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn competency(&self) -> i32 {
        self.competency
    }

    pub fn max_competency(&self) -> i32 {
        self.max_competency
    }

    pub fn loss_rate(&self) -> i32 {
        self.loss_rate
    }

    pub fn gain_rate(&self) -> i32 {
        self.gain_rate
    }

    /// Add `delta` to competency, clamped to [0, max]
    pub fn update_competency(&mut self, delta: i32) {
        self.competency = self
            .competency
            .saturating_add(delta)
            .clamp(0, self.max_competency);
    }

    /// Competency ran out
    pub fn is_caught(&self) -> bool {
        self.competency <= 0
    }

    /// Move scheduled notes that have entered the look-ahead into the live pools
    pub fn spawn_due(&mut self, current_sample: i64, geometry: &ScrollGeometry) -> usize {
        let mut spawned = 0;
        while let Some(next) = self.schedule.front() {
            if geometry.spawn_sample(next.hit_sample) > current_sample {
                break;
            }
            let Some(note) = self.schedule.pop_front() else {
                break;
            };
            match note.kind {
                NoteKind::Switch => self.switch_notes.add(note),
                NoteKind::Beat | NoteKind::Held => self.hit_notes.add(note),
            }
            spawned += 1;
        }
        spawned
    }

    /// Recompute note positions for the current clock
    pub fn update_positions(&mut self, current_sample: i64, geometry: &ScrollGeometry) {
        let lines = self.lines;
        let place = |note: &mut Note| {
            note.x = geometry.line_x(note.line, lines);
            let head = geometry.y_at(note.hit_sample, current_sample);
            note.y = match note.kind {
                NoteKind::Held => geometry.y_at(note.tail_sample(), current_sample),
                NoteKind::Beat | NoteKind::Switch => head,
            };
            note.bottom_y = if note.is_holding() { geometry.hit_y } else { head };
        };
        self.hit_notes.for_each(place);
        self.switch_notes.for_each(place);
    }

    /// Apply the competency of every newly destroyed note.
    ///
    /// Notes are settled exactly once; with `apply == false` they are marked
    /// settled without touching the meter (lanes that were not in play).
    pub fn settle(&mut self, apply: bool) -> i32 {
        let mut total: i32 = 0;
        for note in self.hit_notes.iter_mut().chain(self.switch_notes.iter_mut()) {
            if let Some(delta) = note.take_settlement() {
                total = total.saturating_add(delta);
            }
        }
        if apply && total != 0 {
            self.update_competency(total);
        }
        if apply { total } else { 0 }
    }

    /// Reclaim destroyed notes from both pools
    pub fn garbage_collect(&mut self) {
        self.hit_notes.reclaim();
        self.switch_notes.reclaim();
    }

    /// Notes still scheduled or live
    pub fn has_notes_remaining(&self) -> bool {
        !self.schedule.is_empty() || !self.hit_notes.is_empty() || !self.switch_notes.is_empty()
    }

    /// Notes waiting to spawn
    pub fn scheduled(&self) -> usize {
        self.schedule.len()
    }
}
