//! Band Lanes - judgment and lane-switching core for a multi-lane rhythm game
//!
//! Core modules:
//! - `sim`: Deterministic per-frame simulation (judgment, lanes, transitions, particles)
//! - `level`: Decoded level data and loader-side validation
//! - `transport`: Audio clock contract the simulation reads time from
//! - `settings`: Player preferences (calibration, effects, autoplay)
//! - `error`: Level validation errors

pub mod error;
pub mod level;
pub mod settings;
pub mod sim;
pub mod transport;

pub use error::LevelError;
pub use level::{LaneData, LevelData, NoteData, ScrollGeometry};
pub use settings::{QualityPreset, Settings};
pub use transport::{ManualTransport, Transport};

/// Gameplay constants
pub mod consts {
    /// Perfect window (seconds)
    pub const PERFECT_WINDOW_SECS: f64 = 0.05;
    /// Good window (seconds)
    pub const GOOD_WINDOW_SECS: f64 = 0.08;
    /// Ok window (seconds)
    pub const OK_WINDOW_SECS: f64 = 0.12;
    /// Anything closer than this but outside the ok window is off-beat
    pub const MISS_WINDOW_SECS: f64 = 0.18;

    /// Competency multiplier for a perfect hit
    pub const PERFECT_GAIN: f32 = 1.5;
    /// Competency multiplier for a good hit
    pub const GOOD_GAIN: f32 = 1.25;
    /// Competency multiplier for an ok hit
    pub const OK_GAIN: f32 = 1.0;
    /// Switch notes are worth double the lane gain rate
    pub const SWITCH_GAIN: f32 = 2.0;
    /// Releasing a held note (or being forced off it by a switch)
    pub const LIFT_GAIN: f32 = 0.75;

    /// Points reported per hit grade
    pub const PERFECT_POINTS: u32 = 500;
    pub const GOOD_POINTS: u32 = 250;
    pub const OK_POINTS: u32 = 100;

    /// Transition lasts this fraction of a beat
    pub const TRANSITION_BEAT_FRACTION: f32 = 0.25;

    /// Default competency ceiling when the level does not specify one
    pub const DEFAULT_MAX_COMPETENCY: i32 = 30;
    /// Default lines per lane
    pub const DEFAULT_LINES_PER_LANE: usize = 4;
    /// Upper bound on a lane's gain or loss rate
    pub const MAX_RATE: i32 = 10_000;

    /// Sparks spawned per point of hit status
    pub const SPARKS_PER_STATUS: u32 = 3;
    /// Extra sparks for a perfect hit
    pub const ENHANCED_SPARKS: u32 = 6;
    /// Spark lifetime in frames
    pub const SPARK_LIFETIME: u32 = 40;
    /// Indicator lifetime in frames
    pub const INDICATOR_LIFETIME: u32 = 30;
    /// Indicator drift per frame (negative = downward)
    pub const INDICATOR_DRIFT: f32 = -0.5;
    /// Maximum spark speed per frame along each axis
    pub const SPARK_SPEED: f32 = 1.4;
    /// Spark render scale
    pub const SPARK_SIZE: f32 = 10.0;
    /// Indicator render scale
    pub const INDICATOR_SIZE: f32 = 100.0;
    /// Perfect indicators draw larger
    pub const PERFECT_INDICATOR_SCALE: f32 = 1.3;
}

/// Convert a duration in seconds to whole samples (truncating, like the audio clock does)
#[inline]
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> i64 {
    (secs * sample_rate as f64) as i64
}

/// Samples in one beat at the given tempo
#[inline]
pub fn samples_per_beat(sample_rate: u32, bpm: f32) -> i64 {
    (sample_rate as f64 * (60.0 / bpm as f64)) as i64
}
