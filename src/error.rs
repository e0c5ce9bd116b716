//! Level validation errors
//!
//! The judgment core assumes validated input; these errors are produced by the
//! loader-side checks in [`crate::level::LevelData::validate`].

use thiserror::Error;

/// Errors raised while decoding or validating level data
#[derive(Error, Debug)]
pub enum LevelError {
    /// Level JSON could not be decoded
    #[error("Failed to decode level: {0}")]
    Decode(#[from] serde_json::Error),

    /// A level needs at least one lane
    #[error("Level has no lanes")]
    NoLanes,

    /// Lanes need at least one line to place notes on
    #[error("Lines per lane must be at least 1")]
    NoLines,

    /// Tempo must be positive and finite
    #[error("Invalid bpm: {0}")]
    InvalidBpm(f32),

    /// Letter grade thresholds must be C, B, A, S in ascending order
    #[error("Expected 4 ascending grade thresholds, got {0:?}")]
    InvalidThresholds(Vec<u64>),

    /// A lane's competency ceiling must be positive
    #[error("Lane {lane} has non-positive max competency {max}")]
    InvalidMaxCompetency { lane: usize, max: i32 },

    /// Gain and loss rates must lie in `0..=MAX_RATE`
    #[error("Lane {lane} has out-of-range rates (gain {gain}, loss {loss})")]
    InvalidRate { lane: usize, gain: i32, loss: i32 },

    /// A beat or held note targets a line the lane does not have
    #[error("Lane {lane} note at sample {sample} uses line {line}, lane has {lines} lines")]
    LineOutOfRange {
        lane: usize,
        sample: i64,
        line: i32,
        lines: usize,
    },

    /// Held notes need a non-negative hold length, other notes must not have one
    #[error("Lane {lane} note at sample {sample} has invalid hold length {hold}")]
    InvalidHold { lane: usize, sample: i64, hold: i64 },

    /// Notes must be listed in spawn order
    #[error("Lane {lane} notes are not sorted by hit sample")]
    UnsortedNotes { lane: usize },

    /// Timing windows must be strictly increasing
    #[error("Timing windows must be strictly increasing: {0:?}")]
    WindowOrder([i64; 4]),

    /// Sample rate must be non-zero
    #[error("Sample rate must be non-zero")]
    InvalidSampleRate,

    /// Scroll geometry must place the spawn line above the hit line above the die line
    #[error("Scroll geometry must satisfy spawn_y > hit_y > die_y and lead_samples > 0")]
    InvalidGeometry,
}
