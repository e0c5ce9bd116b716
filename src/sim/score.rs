//! Score and combo
//!
//! The judge only reports points and combo breaks; the scoreboard owns the
//! combo multiplier and the letter grade at the end of a song.

use serde::{Deserialize, Serialize};

/// Receiver of score events
pub trait ScoreSink {
    fn points_scored(&mut self, points: u32);
    fn combo_reset(&mut self);
}

/// End-of-song letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    D,
    C,
    B,
    A,
    S,
}

impl LetterGrade {
    /// Grade for `score` given ascending C, B, A, S thresholds
    pub fn from_score(score: u64, thresholds: &[u64]) -> Self {
        const LADDER: [LetterGrade; 4] = [LetterGrade::C, LetterGrade::B, LetterGrade::A, LetterGrade::S];
        thresholds
            .iter()
            .zip(LADDER)
            .filter(|(threshold, _)| score >= **threshold)
            .map(|(_, grade)| grade)
            .last()
            .unwrap_or(LetterGrade::D)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::D => "D",
            LetterGrade::C => "C",
            LetterGrade::B => "B",
            LetterGrade::A => "A",
            LetterGrade::S => "S",
        }
    }
}

/// Running score with combo multiplier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u64,
    combo: u32,
    best_combo: u32,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    /// Multiplier for the current combo
    pub fn multiplier(&self) -> u32 {
        match self.combo {
            30.. => 5,
            20.. => 3,
            10.. => 2,
            _ => 1,
        }
    }

    pub fn grade(&self, thresholds: &[u64]) -> LetterGrade {
        LetterGrade::from_score(self.score, thresholds)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl ScoreSink for Scoreboard {
    fn points_scored(&mut self, points: u32) {
        self.score += u64::from(points) * u64::from(self.multiplier());
        self.combo += 1;
        self.best_combo = self.best_combo.max(self.combo);
    }

    fn combo_reset(&mut self) {
        self.combo = 0;
    }
}
