//! Outbound frame events
//!
//! The simulation never talks to audio, scoring or rendering directly. Each
//! frame it queues events; the session applies the ones it owns (particles,
//! scoreboard) and the caller drains the rest.

use serde::{Deserialize, Serialize};

use super::particle::IndicatorKind;

/// Named feedback cues for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    PerfectHit,
    GoodHit,
    OkHit,
    SwitchHit,
    /// Any trigger pressed
    Tap,
    /// Any switch requested
    Switch,
}

impl SoundCue {
    /// Asset key of the cue
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::PerfectHit => "perfectHit",
            SoundCue::GoodHit => "goodHit",
            SoundCue::OkHit => "okHit",
            SoundCue::SwitchHit => "switchHit",
            SoundCue::Tap => "tap",
            SoundCue::Switch => "switch",
        }
    }
}

/// Something that happened this frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Points for the score collaborator
    PointsScored(u32),
    /// Combo broken
    ComboReset,
    /// Play a cue
    Cue(SoundCue),
    /// Spark burst at a note
    HitEffect {
        x: f32,
        y: f32,
        sparks: u32,
        enhanced: bool,
    },
    /// Show a hit-quality indicator under the judged lane
    Indicator(IndicatorKind),
    /// A lane handoff started
    TransitionStarted { from: usize, to: usize },
    /// A lane handoff finished
    TransitionFinished { active: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_names_match_asset_keys() {
        let names: Vec<&str> = [
            SoundCue::PerfectHit,
            SoundCue::GoodHit,
            SoundCue::OkHit,
            SoundCue::SwitchHit,
            SoundCue::Tap,
            SoundCue::Switch,
        ]
        .iter()
        .map(SoundCue::name)
        .collect();
        assert_eq!(
            names,
            ["perfectHit", "goodHit", "okHit", "switchHit", "tap", "switch"]
        );
    }
}
