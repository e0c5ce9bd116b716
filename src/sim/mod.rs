//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes only from the transport sample position
//! - Seeded RNG only (spark rolls)
//! - Stable iteration order (lanes by id, notes in spawn order)
//! - No rendering, audio or platform dependencies

pub mod event;
pub mod judge;
pub mod lane;
pub mod note;
pub mod particle;
pub mod pool;
pub mod score;
pub mod state;
pub mod tick;
pub mod transition;

pub use event::{GameEvent, SoundCue};
pub use judge::{HitCheck, HitGrade, Judge, JudgeCounts, JudgmentOutcome, Timing, TimingWindows};
pub use lane::{Lane, LaneState};
pub use note::{Note, NoteKind};
pub use particle::{IndicatorKind, Particle, ParticleKind};
pub use pool::{Pool, PoolPolicy, Reclaim};
pub use score::{LetterGrade, ScoreSink, Scoreboard};
pub use state::{FrameSnapshot, GameState, LaneSnapshot, SessionPhase};
pub use tick::{TickInput, autoplay_input, tick};
pub use transition::{LaneSwitcher, PlayPhase};
