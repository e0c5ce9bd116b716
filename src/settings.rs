//! Player settings and preferences
//!
//! Persisted as JSON next to the player's profile, separately from levels.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::secs_to_samples;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Maximum live spark particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }

    /// Whether perfect hits get the extra burst
    pub fn enhanced_sparks(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Timing ===
    /// Measured input latency (milliseconds), from the calibration screen
    pub calibration_offset_ms: i32,

    // === Visual Effects ===
    /// Spark particles on hits
    pub particles: bool,
    /// Allow more than one hit-quality indicator on screen at once
    pub multiple_indicators: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Feedback cue volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Assists ===
    /// Let the game play itself
    pub autoplay: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            calibration_offset_ms: 0,

            particles: true,
            multiple_indicators: false,

            master_volume: 0.8,
            sfx_volume: 0.2,

            autoplay: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective spark cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Volume applied to feedback cues
    pub fn cue_volume(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    /// Calibration offset converted to samples
    pub fn calibration_offset_samples(&self, sample_rate: u32) -> i64 {
        secs_to_samples(self.calibration_offset_ms as f64 / 1000.0, sample_rate)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring malformed settings {}: {}", path.display(), e),
            },
            Err(e) => log::info!("No settings at {} ({}), using defaults", path.display(), e),
        }
        Self::default()
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Failed to save settings to {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Failed to encode settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_converts_to_samples() {
        let settings = Settings {
            calibration_offset_ms: 20,
            ..Settings::default()
        };
        assert_eq!(settings.calibration_offset_samples(44_100), 882);
    }

    #[test]
    fn particles_off_means_no_cap() {
        let settings = Settings {
            particles: false,
            ..Settings::from_preset(QualityPreset::High)
        };
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "autoplay": true }"#).unwrap();
        assert!(settings.autoplay);
        assert_eq!(settings.quality, QualityPreset::Medium);
        assert!(!settings.multiple_indicators);
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = std::env::temp_dir().join(format!("band-lanes-settings-{}.json", std::process::id()));
        let settings = Settings {
            quality: QualityPreset::High,
            calibration_offset_ms: -35,
            multiple_indicators: true,
            autoplay: true,
            ..Settings::default()
        };
        settings.save(&path);
        let loaded = Settings::load(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.quality, QualityPreset::High);
        assert_eq!(loaded.calibration_offset_ms, -35);
        assert!(loaded.multiple_indicators);
        assert!(loaded.autoplay);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("band-lanes-settings-does-not-exist.json");
        let loaded = Settings::load(&path);
        assert_eq!(loaded.quality, QualityPreset::Medium);
        assert_eq!(loaded.calibration_offset_ms, 0);
    }
}
