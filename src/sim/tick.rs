//! Per-frame simulation pass
//!
//! One call per rendered frame. Time comes from the transport, never from the
//! frame delta, so judgment is independent of frame rate.

use super::event::{GameEvent, SoundCue};
use super::judge::HitCheck;
use super::lane::Lane;
use super::note::{Note, NoteKind};
use super::particle::Particle;
use super::state::{GameState, SessionPhase};
use super::transition::PlayPhase;
use crate::consts::*;
use crate::transport::Transport;

/// Debounced input edges for a single frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Trigger went down this frame, per line
    pub trigger_pressed: Vec<bool>,
    /// Trigger came up this frame, per line
    pub trigger_lifted: Vec<bool>,
    /// Switch to this lane requested, per lane
    pub switch_requested: Vec<bool>,
}

impl TickInput {
    pub fn new(lines: usize, lanes: usize) -> Self {
        Self {
            trigger_pressed: vec![false; lines],
            trigger_lifted: vec![false; lines],
            switch_requested: vec![false; lanes],
        }
    }

    /// Builder: press `line`
    pub fn press(mut self, line: usize) -> Self {
        set(&mut self.trigger_pressed, line);
        self
    }

    /// Builder: release `line`
    pub fn lift(mut self, line: usize) -> Self {
        set(&mut self.trigger_lifted, line);
        self
    }

    /// Builder: request a switch to `lane`
    pub fn switch_to(mut self, lane: usize) -> Self {
        set(&mut self.switch_requested, lane);
        self
    }

    pub fn pressed(&self, line: usize) -> bool {
        self.trigger_pressed.get(line).copied().unwrap_or(false)
    }

    pub fn lifted(&self, line: usize) -> bool {
        self.trigger_lifted.get(line).copied().unwrap_or(false)
    }

    pub fn switch_requested(&self, lane: usize) -> bool {
        self.switch_requested.get(lane).copied().unwrap_or(false)
    }

    pub fn any_pressed(&self) -> bool {
        self.trigger_pressed.iter().any(|&p| p)
    }

    pub fn any_switch(&self) -> bool {
        self.switch_requested.iter().any(|&s| s)
    }
}

fn set(flags: &mut Vec<bool>, index: usize) {
    if flags.len() <= index {
        flags.resize(index + 1, false);
    }
    flags[index] = true;
}

/// Advance the session by one frame
pub fn tick(state: &mut GameState, input: &TickInput, transport: &impl Transport) {
    state.events.clear();
    if state.phase.is_over() {
        return;
    }
    state.frame += 1;

    // Input cues play even during the intro
    if input.any_pressed() {
        state.events.push(GameEvent::Cue(SoundCue::Tap));
    }
    if input.any_switch() {
        state.events.push(GameEvent::Cue(SoundCue::Switch));
    }
    if state.phase == SessionPhase::Intro {
        return;
    }

    let current = transport.current_sample();
    let geometry = state.level.geometry;

    for lane in &mut state.lanes {
        lane.spawn_due(current, &geometry);
        lane.update_positions(current, &geometry);
    }

    // Misses are charged to the active lane, which keeps focus until a handoff completes
    let active = state.switcher.active();
    for lane in &mut state.lanes {
        let in_play = lane.id() == active;
        state
            .judge
            .sweep_dead_notes(lane, geometry.die_y, in_play, &mut state.events);
    }

    state.sparks.for_each(Particle::update);
    state.indicators.for_each(Particle::update);

    state.hit_registered.fill(false);
    react_to_input(state, input, current);

    // Competency only moves for lanes in play
    let active = state.switcher.active();
    let judged = state.switcher.judged_lane();
    for lane in &mut state.lanes {
        let apply = lane.id() == active || lane.id() == judged;
        lane.settle(apply);
    }

    state.apply_feedback();
    evaluate_outcome(state, transport);

    for lane in &mut state.lanes {
        lane.garbage_collect();
    }
    state.sparks.reclaim();
    state.indicators.reclaim();
}

fn react_to_input(state: &mut GameState, input: &TickInput, current: i64) {
    match state.switcher.phase() {
        PlayPhase::Notes => {
            let active = state.switcher.active();
            let requested = (0..state.lanes.len()).find(|&lane| lane != active && input.switch_requested(lane));
            if let Some(goal) = requested {
                if state.switcher.request(goal, current) {
                    start_transition(state, active, goal, current);
                    // Hit notes wait until the next frame
                    return;
                }
            }
        }
        PlayPhase::Transition => {
            state.indicators.clear();
            if let Some(active) = state.switcher.advance(current) {
                log::debug!("lane {} active at sample {}", active, current);
                state.events.push(GameEvent::TransitionFinished { active });
            }
        }
    }

    let lane = state.switcher.judged_lane();
    judge_hit_notes(state, lane, input, current);
}

/// Resolve switch notes at doubled gain and force the outgoing lane off its holds
fn start_transition(state: &mut GameState, from: usize, goal: usize, current: i64) {
    let GameState {
        lanes,
        judge,
        events,
        hit_registered,
        indicators,
        ..
    } = state;

    let gain_rate = lanes[from].gain_rate();
    let switch_rate = scaled_rate(gain_rate, SWITCH_GAIN);
    let lift_rate = scaled_rate(gain_rate, LIFT_GAIN);

    for id in [from, goal] {
        for note in lanes[id].switch_notes.iter_mut() {
            if note.is_destroyed() {
                continue;
            }
            let anchor = note.y;
            judge.judge(note, current, HitCheck::press(switch_rate, 0, anchor), hit_registered, events);
        }
    }

    let outgoing = &mut lanes[from];
    let loss = -outgoing.loss_rate();
    for note in outgoing.hit_notes.iter_mut() {
        if note.is_destroyed() || !note.is_holding() {
            continue;
        }
        let anchor = note.bottom_y;
        judge.judge(note, current, HitCheck::release(lift_rate, loss, anchor), hit_registered, events);
        finish_hold(note);
    }

    indicators.clear();
    events.push(GameEvent::TransitionStarted { from, to: goal });
}

/// Judge the hit notes of `lane_id` against this frame's triggers
fn judge_hit_notes(state: &mut GameState, lane_id: usize, input: &TickInput, current: i64) {
    let GameState {
        lanes,
        judge,
        events,
        hit_registered,
        ..
    } = state;
    let Some(lane) = lanes.get_mut(lane_id) else {
        return;
    };

    let gain = lane.gain_rate();
    let loss = -lane.loss_rate();
    let lift_rate = scaled_rate(gain, LIFT_GAIN);
    let mut held_beats = 0i64;

    for note in lane.hit_notes.iter_mut() {
        if note.is_destroyed() || note.line < 0 {
            continue;
        }
        let line = note.line as usize;

        match note.kind {
            NoteKind::Beat => {
                if input.pressed(line) && !is_claimed(hit_registered, line) {
                    let anchor = note.y;
                    judge.judge(note, current, HitCheck::press(gain, loss, anchor), hit_registered, events);
                }
            }
            NoteKind::Held => {
                if input.pressed(line) && !is_claimed(hit_registered, line) {
                    let anchor = note.bottom_y;
                    judge.judge(note, current, HitCheck::hold_press(gain, loss, anchor), hit_registered, events);
                }
                if input.lifted(line) && note.is_holding() {
                    let anchor = note.bottom_y;
                    judge.judge(note, current, HitCheck::release(lift_rate, loss, anchor), hit_registered, events);
                    finish_hold(note);
                    continue;
                }
                if note.is_holding() {
                    held_beats += judge.credit_hold(note, current);
                    judge.resolve_overrun(note, current, loss, events);
                }
            }
            NoteKind::Switch => {}
        }
    }

    if held_beats > 0 {
        let beats = i32::try_from(held_beats).unwrap_or(i32::MAX);
        lane.update_competency(beats.saturating_mul(gain));
    }
}

fn is_claimed(hit_registered: &[bool], line: usize) -> bool {
    hit_registered.get(line).copied().unwrap_or(true)
}

/// A released hold is always retired
fn finish_hold(note: &mut Note) {
    note.held_for = 0;
    note.set_holding(false);
    note.destroy();
}

fn scaled_rate(gain_rate: i32, multiplier: f32) -> i32 {
    (gain_rate as f32 * multiplier).floor() as i32
}

fn evaluate_outcome(state: &mut GameState, transport: &impl Transport) {
    if let Some(lane) = state.lanes.iter().find(|lane| lane.is_caught()) {
        log::info!("Lane {} ran out of competency at frame {}", lane.id(), state.frame);
        state.phase = SessionPhase::Lost;
        return;
    }
    let song_over = !transport.is_playing() || !state.lanes.iter().any(Lane::has_notes_remaining);
    if song_over && state.sparks.is_empty() {
        log::info!(
            "Song cleared: score {}, grade {}",
            state.scoreboard.score(),
            state.grade().as_str()
        );
        state.phase = SessionPhase::Won;
    }
}

/// Perfect-timing input for the current frame.
///
/// Presses beat and held heads once they are due, releases held tails and
/// requests a switch when another lane's switch note is due.
pub fn autoplay_input(state: &GameState, transport: &impl Transport) -> TickInput {
    let mut input = TickInput::new(state.level.lines_per_lane, state.lanes.len());
    if state.phase != SessionPhase::Playing {
        return input;
    }
    let adjusted = transport.current_sample() - state.judge.calibration_offset();

    if let Some(lane) = state.lanes.get(state.switcher.judged_lane()) {
        for note in lane.hit_notes.iter().filter(|n| !n.is_destroyed() && n.line >= 0) {
            let line = note.line as usize;
            match note.kind {
                NoteKind::Beat if adjusted >= note.hit_sample => input = input.press(line),
                NoteKind::Held if note.is_holding() && adjusted >= note.tail_sample() => input = input.lift(line),
                NoteKind::Held if !note.is_holding() && adjusted >= note.hit_sample && adjusted < note.tail_sample() => {
                    input = input.press(line)
                }
                _ => {}
            }
        }
    }

    if state.switcher.phase() == PlayPhase::Notes {
        let active = state.switcher.active();
        let due = state.lanes.iter().find(|lane| {
            lane.id() != active
                && lane
                    .switch_notes
                    .iter()
                    .any(|n| !n.is_destroyed() && adjusted >= n.hit_sample)
        });
        if let Some(lane) = due {
            input = input.switch_to(lane.id());
        }
    }

    input
}
