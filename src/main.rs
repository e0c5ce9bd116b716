//! Band Lanes headless entry point
//!
//! Plays a level on a manual transport at 60 frames per second with autoplay
//! input and logs the final snapshot. Usage:
//!
//! `band-lanes [level.json] [settings.json]`

use std::path::Path;

use band_lanes::sim::{GameEvent, GameState, SessionPhase, TickInput, autoplay_input, tick};
use band_lanes::{LaneData, LevelData, ManualTransport, NoteData, ScrollGeometry, Settings};

const SAMPLE_RATE: u32 = 44_100;
const FRAME_SAMPLES: i64 = (SAMPLE_RATE / 60) as i64;
const SEED: u64 = 0x5EED;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Band Lanes (headless) starting...");

    let mut args = std::env::args().skip(1);
    let level = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => match LevelData::from_json(&json) {
                Ok(level) => level,
                Err(e) => {
                    log::error!("Failed to load level {}: {}", path, e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                log::error!("Failed to read level {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => demo_level(),
    };
    let mut settings = args.next().map(|p| Settings::load(Path::new(&p))).unwrap_or_default();
    settings.autoplay = true;

    let mut state = match GameState::new(level, settings, SAMPLE_RATE, SEED) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Invalid level: {}", e);
            std::process::exit(1);
        }
    };

    let end = last_note_sample(&state.level) + i64::from(SAMPLE_RATE) * 2;
    let mut transport = ManualTransport::new(SAMPLE_RATE, state.level.bpm).with_end(end);

    state.begin();
    while !state.phase.is_over() {
        let input = if state.settings.autoplay {
            autoplay_input(&state, &transport)
        } else {
            TickInput::default()
        };
        tick(&mut state, &input, &transport);
        for event in &state.events {
            match event {
                GameEvent::Cue(cue) => log::trace!("cue {} at volume {:.2}", cue.name(), state.settings.cue_volume()),
                GameEvent::TransitionStarted { from, to } => log::debug!("switching {} -> {}", from, to),
                _ => {}
            }
        }
        transport.advance(FRAME_SAMPLES);
    }

    let snapshot = state.snapshot();
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => log::info!("Final snapshot:\n{}", json),
        Err(e) => log::warn!("Failed to encode snapshot: {}", e),
    }
    let outcome = if state.phase == SessionPhase::Won { "cleared" } else { "failed" };
    println!(
        "{} {}: score {}, grade {}, best combo {}",
        state.level.name,
        outcome,
        snapshot.score,
        snapshot.grade.as_str(),
        snapshot.best_combo
    );
}

fn last_note_sample(level: &LevelData) -> i64 {
    level
        .lanes
        .iter()
        .flat_map(|lane| lane.notes.iter())
        .map(|note| note.hit_sample + note.hold_samples)
        .max()
        .unwrap_or(0)
}

/// Two lanes at 120 bpm with a handoff in the middle
fn demo_level() -> LevelData {
    let beat = i64::from(SAMPLE_RATE) / 2;
    let start = beat * 4;
    let mut lead = Vec::new();
    let mut rhythm = Vec::new();
    for i in 0..8 {
        lead.push(NoteData::beat((i % 4) as i32, start + beat * i));
    }
    lead.push(NoteData::held(1, start + beat * 8, beat * 2));
    rhythm.push(NoteData::switch(start + beat * 11));
    for i in 0..6 {
        rhythm.push(NoteData::beat(((i * 3) % 4) as i32, start + beat * (12 + i)));
    }
    rhythm.push(NoteData::held(2, start + beat * 18, beat * 3));

    LevelData {
        name: "Demo Jam".into(),
        bpm: 120.0,
        lines_per_lane: 4,
        grade_thresholds: vec![2_000, 4_000, 6_000, 7_500],
        lanes: vec![
            LaneData {
                max_competency: 30,
                loss_rate: 3,
                gain_rate: 2,
                notes: lead,
            },
            LaneData {
                max_competency: 30,
                loss_rate: 2,
                gain_rate: 2,
                notes: rhythm,
            },
        ],
        geometry: ScrollGeometry::default(),
    }
}
