//! Decoded level data
//!
//! The level loader hands the session one `LevelData` per song. Validation lives
//! here so the loader can reject malformed levels before play starts; the
//! simulation itself never re-validates.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_LINES_PER_LANE, DEFAULT_MAX_COMPETENCY, MAX_RATE};
use crate::error::LevelError;
use crate::sim::NoteKind;

/// One scheduled note as stored in the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteData {
    pub kind: NoteKind,
    /// Line within the lane (-1 for lane-wide switch notes)
    #[serde(default = "lane_wide")]
    pub line: i32,
    /// Sample at which the head reaches the hit line
    pub hit_sample: i64,
    /// Hold length in samples (held notes only)
    #[serde(default)]
    pub hold_samples: i64,
}

fn lane_wide() -> i32 {
    -1
}

impl NoteData {
    pub fn beat(line: i32, hit_sample: i64) -> Self {
        Self {
            kind: NoteKind::Beat,
            line,
            hit_sample,
            hold_samples: 0,
        }
    }

    pub fn held(line: i32, hit_sample: i64, hold_samples: i64) -> Self {
        Self {
            kind: NoteKind::Held,
            line,
            hit_sample,
            hold_samples,
        }
    }

    pub fn switch(hit_sample: i64) -> Self {
        Self {
            kind: NoteKind::Switch,
            line: -1,
            hit_sample,
            hold_samples: 0,
        }
    }
}

/// Per-lane (band member) level data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneData {
    /// Competency ceiling; lanes start full
    #[serde(default = "default_max_competency")]
    pub max_competency: i32,
    /// Competency lost on a missed note
    pub loss_rate: i32,
    /// Competency gained on an ok hit (scaled up for better grades)
    pub gain_rate: i32,
    /// Notes in spawn order
    #[serde(default)]
    pub notes: Vec<NoteData>,
}

fn default_max_competency() -> i32 {
    DEFAULT_MAX_COMPETENCY
}

fn default_lines_per_lane() -> usize {
    DEFAULT_LINES_PER_LANE
}

/// Linear scroll geometry shared by every lane.
///
/// Notes travel from `spawn_y` down to `hit_y` over `lead_samples`, and are
/// considered gone once below `die_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollGeometry {
    pub spawn_y: f32,
    pub hit_y: f32,
    pub die_y: f32,
    /// Samples between a note spawning and reaching the hit line
    pub lead_samples: i64,
    /// Horizontal distance between line centres
    pub line_spacing: f32,
}

impl Default for ScrollGeometry {
    fn default() -> Self {
        Self {
            spawn_y: 600.0,
            hit_y: 100.0,
            die_y: 40.0,
            lead_samples: 88_200, // 2 seconds at 44.1 kHz
            line_spacing: 40.0,
        }
    }
}

impl ScrollGeometry {
    /// Vertical position of something scheduled at `target` when the clock reads `current`
    #[inline]
    pub fn y_at(&self, target: i64, current: i64) -> f32 {
        let ahead = (target - current) as f32 / self.lead_samples as f32;
        self.hit_y + ahead * (self.spawn_y - self.hit_y)
    }

    /// Horizontal centre of a line; lane-wide notes sit in the middle
    #[inline]
    pub fn line_x(&self, line: i32, lines: usize) -> f32 {
        if line < 0 {
            lines as f32 * self.line_spacing / 2.0
        } else {
            (line as f32 + 0.5) * self.line_spacing
        }
    }

    /// Sample at which a note targeting `hit_sample` should enter the play field
    #[inline]
    pub fn spawn_sample(&self, hit_sample: i64) -> i64 {
        hit_sample - self.lead_samples
    }
}

/// A fully decoded level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    pub bpm: f32,
    #[serde(default = "default_lines_per_lane")]
    pub lines_per_lane: usize,
    /// Score thresholds for C, B, A and S grades
    pub grade_thresholds: Vec<u64>,
    pub lanes: Vec<LaneData>,
    #[serde(default)]
    pub geometry: ScrollGeometry,
}

impl LevelData {
    /// Decode and validate a level from JSON
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: LevelData = serde_json::from_str(json)?;
        level.validate()?;
        log::info!(
            "Loaded level '{}' ({} lanes, {} notes)",
            level.name,
            level.lanes.len(),
            level.total_notes()
        );
        Ok(level)
    }

    /// Total scheduled notes across all lanes
    pub fn total_notes(&self) -> usize {
        self.lanes.iter().map(|l| l.notes.len()).sum()
    }

    /// Loader-side validation
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.lanes.is_empty() {
            return Err(LevelError::NoLanes);
        }
        if self.lines_per_lane == 0 {
            return Err(LevelError::NoLines);
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(LevelError::InvalidBpm(self.bpm));
        }
        let thresholds_ok = self.grade_thresholds.len() == 4
            && self.grade_thresholds.windows(2).all(|w| w[0] < w[1]);
        if !thresholds_ok {
            return Err(LevelError::InvalidThresholds(self.grade_thresholds.clone()));
        }
        let g = &self.geometry;
        if !(g.spawn_y > g.hit_y && g.hit_y > g.die_y && g.lead_samples > 0) {
            return Err(LevelError::InvalidGeometry);
        }

        for (lane, data) in self.lanes.iter().enumerate() {
            if data.max_competency <= 0 {
                return Err(LevelError::InvalidMaxCompetency {
                    lane,
                    max: data.max_competency,
                });
            }
            let rates = 0..=MAX_RATE;
            if !(rates.contains(&data.gain_rate) && rates.contains(&data.loss_rate)) {
                return Err(LevelError::InvalidRate {
                    lane,
                    gain: data.gain_rate,
                    loss: data.loss_rate,
                });
            }
            if data.notes.windows(2).any(|w| w[0].hit_sample > w[1].hit_sample) {
                return Err(LevelError::UnsortedNotes { lane });
            }
            for note in &data.notes {
                let line_ok = match note.kind {
                    NoteKind::Switch => note.line == -1,
                    NoteKind::Beat | NoteKind::Held => {
                        note.line >= 0 && (note.line as usize) < self.lines_per_lane
                    }
                };
                if !line_ok {
                    return Err(LevelError::LineOutOfRange {
                        lane,
                        sample: note.hit_sample,
                        line: note.line,
                        lines: self.lines_per_lane,
                    });
                }
                let hold_ok = match note.kind {
                    NoteKind::Held => note.hold_samples >= 0,
                    _ => note.hold_samples == 0,
                };
                if !hold_ok {
                    return Err(LevelError::InvalidHold {
                        lane,
                        sample: note.hit_sample,
                        hold: note.hold_samples,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> LevelData {
        LevelData {
            name: "test".into(),
            bpm: 120.0,
            lines_per_lane: 4,
            grade_thresholds: vec![1000, 2000, 3000, 4000],
            lanes: vec![LaneData {
                max_competency: 30,
                loss_rate: 2,
                gain_rate: 4,
                notes: vec![NoteData::beat(0, 1000), NoteData::switch(2000)],
            }],
            geometry: ScrollGeometry::default(),
        }
    }

    #[test]
    fn valid_level_passes() {
        assert!(level().validate().is_ok());
    }

    #[test]
    fn rejects_line_out_of_range() {
        let mut l = level();
        l.lanes[0].notes.push(NoteData::beat(4, 3000));
        assert!(matches!(
            l.validate(),
            Err(LevelError::LineOutOfRange { line: 4, .. })
        ));
    }

    #[test]
    fn rejects_switch_note_with_line() {
        let mut l = level();
        l.lanes[0].notes[1].line = 2;
        assert!(matches!(l.validate(), Err(LevelError::LineOutOfRange { .. })));
    }

    #[test]
    fn rejects_missing_thresholds() {
        let mut l = level();
        l.grade_thresholds.pop();
        assert!(matches!(l.validate(), Err(LevelError::InvalidThresholds(_))));
    }

    #[test]
    fn rejects_out_of_range_rates() {
        let mut l = level();
        l.lanes[0].loss_rate = -1;
        assert!(matches!(l.validate(), Err(LevelError::InvalidRate { lane: 0, loss: -1, .. })));

        let mut l = level();
        l.lanes[0].gain_rate = i32::MAX;
        assert!(matches!(l.validate(), Err(LevelError::InvalidRate { lane: 0, .. })));

        let mut l = level();
        l.lanes[0].gain_rate = MAX_RATE;
        l.lanes[0].loss_rate = 0;
        assert!(l.validate().is_ok());
    }

    #[test]
    fn rejects_unsorted_notes() {
        let mut l = level();
        l.lanes[0].notes.reverse();
        assert!(matches!(l.validate(), Err(LevelError::UnsortedNotes { lane: 0 })));
    }

    #[test]
    fn decodes_json_with_defaults() {
        let json = r#"{
            "bpm": 100.0,
            "grade_thresholds": [10, 20, 30, 40],
            "lanes": [
                { "loss_rate": 1, "gain_rate": 3,
                  "notes": [ { "kind": "Switch", "hit_sample": 500 },
                             { "kind": "Held", "line": 1, "hit_sample": 900, "hold_samples": 300 } ] }
            ]
        }"#;
        let level = LevelData::from_json(json).unwrap();
        assert_eq!(level.lines_per_lane, DEFAULT_LINES_PER_LANE);
        assert_eq!(level.lanes[0].max_competency, DEFAULT_MAX_COMPETENCY);
        assert_eq!(level.lanes[0].notes[0].line, -1);
        assert_eq!(level.lanes[0].notes[1].hold_samples, 300);
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(
            LevelData::from_json("{ not json"),
            Err(LevelError::Decode(_))
        ));
    }

    #[test]
    fn scroll_positions_are_linear() {
        let g = ScrollGeometry::default();
        assert_eq!(g.y_at(1000, 1000), g.hit_y);
        assert_eq!(g.y_at(1000 + g.lead_samples, 1000), g.spawn_y);
        assert!(g.y_at(1000, 1000 + g.lead_samples) < g.die_y);
    }
}
