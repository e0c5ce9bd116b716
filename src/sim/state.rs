//! Session state
//!
//! Everything a running song needs between frames lives here:
//! - `GameState`: lanes, judge, lane switcher, feedback pools, scoreboard
//! - `SessionPhase`: intro, play and the two terminal outcomes
//! - `FrameSnapshot`: the serializable view handed to presentation

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::event::GameEvent;
use super::judge::{Judge, JudgeCounts, TimingWindows};
use super::lane::{Lane, LaneState};
use super::particle::{self, Particle};
use super::pool::{Pool, PoolPolicy};
use super::score::{LetterGrade, ScoreSink, Scoreboard};
use super::transition::{LaneSwitcher, PlayPhase};
use crate::consts::*;
use crate::error::LevelError;
use crate::level::LevelData;
use crate::samples_per_beat;
use crate::settings::Settings;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Song loaded, waiting to start; only tap cues play
    Intro,
    /// Notes are judged
    Playing,
    /// A lane ran out of competency
    Lost,
    /// Song finished with every lane standing
    Won,
}

impl SessionPhase {
    pub fn is_over(&self) -> bool {
        matches!(self, SessionPhase::Lost | SessionPhase::Won)
    }
}

/// Per-lane part of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSnapshot {
    pub competency: i32,
    pub max_competency: i32,
    pub state: LaneState,
    pub live_notes: usize,
}

/// Read-only frame summary for presentation and logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub phase: SessionPhase,
    pub play_phase: PlayPhase,
    pub active_lane: usize,
    pub goal_lane: usize,
    pub transition_fraction: f32,
    pub lanes: Vec<LaneSnapshot>,
    pub counts: JudgeCounts,
    pub score: u64,
    pub combo: u32,
    pub best_combo: u32,
    pub grade: LetterGrade,
    pub sparks: usize,
    pub indicators: usize,
    pub won: bool,
    pub lost: bool,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed for spark rolls
    pub seed: u64,
    pub level: LevelData,
    pub settings: Settings,
    pub sample_rate: u32,
    pub phase: SessionPhase,
    pub lanes: Vec<Lane>,
    pub judge: Judge,
    pub switcher: LaneSwitcher,
    /// Hit sparks (not gameplay-affecting)
    pub sparks: Pool<Particle>,
    /// Hit-quality indicators under the judged lane
    pub indicators: Pool<Particle>,
    pub scoreboard: Scoreboard,
    /// Events raised by the last tick; cleared at the start of the next one
    pub events: Vec<GameEvent>,
    /// Per-line claim buffer for the current frame's judgment pass
    pub(crate) hit_registered: Vec<bool>,
    /// Frames ticked since the session was (re)started
    pub frame: u64,
    rng: Pcg32,
}

impl GameState {
    /// Build a session for a validated level
    pub fn new(level: LevelData, settings: Settings, sample_rate: u32, seed: u64) -> Result<Self, LevelError> {
        level.validate()?;
        let windows = TimingWindows::from_sample_rate(sample_rate)?;
        let spb = samples_per_beat(sample_rate, level.bpm);
        let judge = Judge::new(windows, settings.calibration_offset_samples(sample_rate), spb);
        let duration = (spb as f64 * TRANSITION_BEAT_FRACTION as f64) as i64;

        let mut state = Self {
            seed,
            lanes: Vec::new(),
            judge,
            switcher: LaneSwitcher::new(0, duration),
            sparks: Pool::new(PoolPolicy::Accumulate),
            indicators: Pool::new(indicator_policy(&settings)),
            scoreboard: Scoreboard::new(),
            events: Vec::new(),
            hit_registered: vec![false; level.lines_per_lane],
            frame: 0,
            rng: Pcg32::seed_from_u64(seed),
            phase: SessionPhase::Intro,
            level,
            settings,
            sample_rate,
        };
        state.load_lanes();
        log::info!(
            "Session ready: '{}' with {} lanes, {} notes, windows {:?}",
            state.level.name,
            state.lanes.len(),
            state.level.total_notes(),
            state.judge.windows()
        );
        Ok(state)
    }

    fn load_lanes(&mut self) {
        let lines = self.level.lines_per_lane;
        self.lanes = self
            .level
            .lanes
            .iter()
            .enumerate()
            .map(|(id, data)| Lane::new(id, data, lines))
            .collect();
    }

    /// Leave the intro and start judging
    pub fn begin(&mut self) {
        if self.phase == SessionPhase::Intro {
            self.phase = SessionPhase::Playing;
            log::info!("Session started");
        }
    }

    /// Reload the level and reset every counter, pool and the lane switcher.
    /// The session returns to the intro.
    pub fn restart(&mut self) {
        self.load_lanes();
        self.judge.reset_counts();
        self.switcher = LaneSwitcher::new(0, self.switcher.duration());
        self.sparks.clear();
        self.indicators.clear();
        self.scoreboard.reset();
        self.events.clear();
        self.hit_registered.fill(false);
        self.frame = 0;
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.phase = SessionPhase::Intro;
        log::info!("Session restarted");
    }

    /// Change settings mid-session (indicator policy, effects)
    pub fn apply_settings(&mut self, settings: Settings) {
        self.indicators.set_policy(indicator_policy(&settings));
        self.judge = Judge::new(
            *self.judge.windows(),
            settings.calibration_offset_samples(self.sample_rate),
            self.judge.samples_per_beat(),
        );
        self.settings = settings;
    }

    pub fn lane_state(&self, lane: usize) -> LaneState {
        self.switcher.lane_state(lane)
    }

    pub fn is_won(&self) -> bool {
        self.phase == SessionPhase::Won
    }

    pub fn is_lost(&self) -> bool {
        self.phase == SessionPhase::Lost
    }

    /// Letter grade for the current score
    pub fn grade(&self) -> LetterGrade {
        self.scoreboard.grade(&self.level.grade_thresholds)
    }

    /// Turn this frame's feedback events into particles and score updates.
    ///
    /// Events stay in the queue so the caller can still route cues.
    pub(crate) fn apply_feedback(&mut self) {
        let geometry = self.level.geometry;
        let lines = self.level.lines_per_lane;
        let cap = self.settings.max_particles();
        let enhanced_allowed = self.settings.quality.enhanced_sparks();

        for event in &self.events {
            match *event {
                GameEvent::PointsScored(points) => self.scoreboard.points_scored(points),
                GameEvent::ComboReset => self.scoreboard.combo_reset(),
                GameEvent::HitEffect { x, y, sparks, enhanced } => {
                    let at = Vec2::new(x, y);
                    let budget = cap.saturating_sub(self.sparks.len());
                    for spark in particle::spark_burst(&mut self.rng, at, sparks, false, budget) {
                        self.sparks.add(spark);
                    }
                    if enhanced && enhanced_allowed {
                        let budget = cap.saturating_sub(self.sparks.len());
                        for spark in particle::spark_burst(&mut self.rng, at, ENHANCED_SPARKS, true, budget) {
                            self.sparks.add(spark);
                        }
                    }
                }
                GameEvent::Indicator(kind) => {
                    let at = Vec2::new(geometry.line_x(-1, lines), geometry.die_y);
                    self.indicators.add(particle::indicator(kind, at));
                }
                GameEvent::Cue(_) | GameEvent::TransitionStarted { .. } | GameEvent::TransitionFinished { .. } => {}
            }
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            phase: self.phase,
            play_phase: self.switcher.phase(),
            active_lane: self.switcher.active(),
            goal_lane: self.switcher.goal(),
            transition_fraction: self.switcher.fraction(),
            lanes: self
                .lanes
                .iter()
                .map(|lane| LaneSnapshot {
                    competency: lane.competency(),
                    max_competency: lane.max_competency(),
                    state: self.switcher.lane_state(lane.id()),
                    live_notes: lane.hit_notes.len() + lane.switch_notes.len(),
                })
                .collect(),
            counts: self.judge.counts(),
            score: self.scoreboard.score(),
            combo: self.scoreboard.combo(),
            best_combo: self.scoreboard.best_combo(),
            grade: self.grade(),
            sparks: self.sparks.len(),
            indicators: self.indicators.len(),
            won: self.is_won(),
            lost: self.is_lost(),
        }
    }
}

fn indicator_policy(settings: &Settings) -> PoolPolicy {
    if settings.multiple_indicators {
        PoolPolicy::Accumulate
    } else {
        PoolPolicy::SingleLive
    }
}
