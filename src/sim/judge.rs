//! Timing judgment
//!
//! Every decision is made in audio samples against the transport clock:
//! - `TimingWindows` classify a distance into a hit grade
//! - `Judge::judge` applies a classification to one note
//! - `Judge::credit_hold` grants per-beat competency while a held note is held
//! - `Judge::sweep_dead_notes` retires notes that scrolled past unhit

use serde::{Deserialize, Serialize};

use super::event::{GameEvent, SoundCue};
use super::lane::Lane;
use super::note::{Note, NoteKind};
use super::particle::IndicatorKind;
use crate::consts::*;
use crate::error::LevelError;
use crate::secs_to_samples;

/// Timing windows in samples, strictly increasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindows {
    pub perfect: i64,
    pub good: i64,
    pub ok: i64,
    pub miss: i64,
}

impl TimingWindows {
    pub fn new(perfect: i64, good: i64, ok: i64, miss: i64) -> Result<Self, LevelError> {
        if !(0 < perfect && perfect < good && good < ok && ok < miss) {
            return Err(LevelError::WindowOrder([perfect, good, ok, miss]));
        }
        Ok(Self {
            perfect,
            good,
            ok,
            miss,
        })
    }

    /// Standard windows for a song at `sample_rate`
    pub fn from_sample_rate(sample_rate: u32) -> Result<Self, LevelError> {
        if sample_rate == 0 {
            return Err(LevelError::InvalidSampleRate);
        }
        Self::new(
            secs_to_samples(PERFECT_WINDOW_SECS, sample_rate),
            secs_to_samples(GOOD_WINDOW_SECS, sample_rate),
            secs_to_samples(OK_WINDOW_SECS, sample_rate),
            secs_to_samples(MISS_WINDOW_SECS, sample_rate),
        )
    }

    /// Classify an absolute distance. `None` means too far to count at all.
    pub fn classify(&self, distance: i64) -> Option<Timing> {
        if distance < self.perfect {
            Some(Timing::Hit(HitGrade::Perfect))
        } else if distance < self.good {
            Some(Timing::Hit(HitGrade::Good))
        } else if distance < self.ok {
            Some(Timing::Hit(HitGrade::Ok))
        } else if distance < self.miss {
            Some(Timing::OffBeat)
        } else {
            None
        }
    }
}

/// Scoring hit grades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitGrade {
    Perfect,
    Good,
    Ok,
}

impl HitGrade {
    /// Competency gain for this grade, rounded down
    pub fn gain(&self, gain_rate: i32) -> i32 {
        let multiplier = match self {
            HitGrade::Perfect => PERFECT_GAIN,
            HitGrade::Good => GOOD_GAIN,
            HitGrade::Ok => OK_GAIN,
        };
        (multiplier * gain_rate as f32).floor() as i32
    }

    pub fn points(&self) -> u32 {
        match self {
            HitGrade::Perfect => PERFECT_POINTS,
            HitGrade::Good => GOOD_POINTS,
            HitGrade::Ok => OK_POINTS,
        }
    }

    pub fn cue(&self) -> SoundCue {
        match self {
            HitGrade::Perfect => SoundCue::PerfectHit,
            HitGrade::Good => SoundCue::GoodHit,
            HitGrade::Ok => SoundCue::OkHit,
        }
    }

    pub fn indicator(&self) -> IndicatorKind {
        match self {
            HitGrade::Perfect => IndicatorKind::Perfect,
            HitGrade::Good => IndicatorKind::Good,
            HitGrade::Ok => IndicatorKind::Ok,
        }
    }
}

/// Result of classifying a distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Hit(HitGrade),
    /// Close, but not close enough
    OffBeat,
}

/// What one `judge` call did to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentOutcome {
    /// Scored
    Hit(HitGrade),
    /// Penalised near miss on a beat or switch note
    OffBeat,
    /// Held note released (or overrun) outside the ok window
    LiftMiss,
    /// Held note body engaged without a window check
    Holding,
    /// Nothing happened
    Ignored,
}

/// Per-grade counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeCounts {
    pub perfect: u32,
    pub good: u32,
    pub ok: u32,
    pub miss: u32,
}

impl JudgeCounts {
    fn record(&mut self, grade: HitGrade) {
        match grade {
            HitGrade::Perfect => self.perfect += 1,
            HitGrade::Good => self.good += 1,
            HitGrade::Ok => self.ok += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.good + self.ok + self.miss
    }
}

/// Caller-supplied parameters of one hit check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitCheck {
    /// Lane gain rate, already scaled for switch or release checks
    pub gain_rate: i32,
    /// Competency delta for an off-beat hit (zero or negative)
    pub off_beat_loss: i32,
    /// Where hit sparks spawn vertically
    pub effect_anchor_y: f32,
    /// Destroy the note on a scoring hit
    pub destroy_on_hit: bool,
    /// The check is a release of a held note
    pub lifted: bool,
}

impl HitCheck {
    /// Press on a beat or switch note
    pub fn press(gain_rate: i32, off_beat_loss: i32, effect_anchor_y: f32) -> Self {
        Self {
            gain_rate,
            off_beat_loss,
            effect_anchor_y,
            destroy_on_hit: true,
            lifted: false,
        }
    }

    /// Press on the head of a held note; the note survives to be held
    pub fn hold_press(gain_rate: i32, off_beat_loss: i32, effect_anchor_y: f32) -> Self {
        Self {
            destroy_on_hit: false,
            ..Self::press(gain_rate, off_beat_loss, effect_anchor_y)
        }
    }

    /// Release of a held note, graded against the tail
    pub fn release(gain_rate: i32, off_beat_loss: i32, effect_anchor_y: f32) -> Self {
        Self {
            lifted: true,
            ..Self::press(gain_rate, off_beat_loss, effect_anchor_y)
        }
    }
}

/// Judgment engine for one session
#[derive(Debug, Clone)]
pub struct Judge {
    windows: TimingWindows,
    /// Input latency correction in samples
    calibration_offset: i64,
    samples_per_beat: i64,
    counts: JudgeCounts,
}

impl Judge {
    pub fn new(windows: TimingWindows, calibration_offset: i64, samples_per_beat: i64) -> Self {
        Self {
            windows,
            calibration_offset,
            samples_per_beat: samples_per_beat.max(1),
            counts: JudgeCounts::default(),
        }
    }

    pub fn windows(&self) -> &TimingWindows {
        &self.windows
    }

    pub fn counts(&self) -> JudgeCounts {
        self.counts
    }

    pub fn calibration_offset(&self) -> i64 {
        self.calibration_offset
    }

    pub fn samples_per_beat(&self) -> i64 {
        self.samples_per_beat
    }

    pub fn reset_counts(&mut self) {
        self.counts = JudgeCounts::default();
    }

    /// Judge one input edge against `note`.
    ///
    /// `hit_registered` is the frame's per-line scratch buffer: a scoring hit
    /// claims its line so a single press cannot score two notes.
    pub fn judge(
        &mut self,
        note: &mut Note,
        current_sample: i64,
        check: HitCheck,
        hit_registered: &mut [bool],
        events: &mut Vec<GameEvent>,
    ) -> JudgmentOutcome {
        debug_assert!(
            !check.lifted || note.kind == NoteKind::Held,
            "lifted checks are only valid for held notes"
        );
        debug_assert!(!note.is_destroyed(), "destroyed notes must not be judged");
        if note.is_destroyed() {
            return JudgmentOutcome::Ignored;
        }

        let adjusted = current_sample - self.calibration_offset;
        let reference = if check.lifted {
            note.tail_sample()
        } else {
            note.hit_sample
        };
        let distance = (adjusted - reference).abs();

        // Re-pressing a note that is already being held never scores twice
        let rescoring = note.kind == NoteKind::Held && note.is_holding() && !check.lifted;

        let mut outcome = JudgmentOutcome::Ignored;
        if !rescoring {
            match self.windows.classify(distance) {
                Some(Timing::Hit(grade)) => {
                    self.register_hit(note, grade, current_sample, check, hit_registered, events);
                    outcome = JudgmentOutcome::Hit(grade);
                }
                Some(Timing::OffBeat) => match note.kind {
                    NoteKind::Beat | NoteKind::Switch => {
                        self.penalize(note, check.off_beat_loss, events);
                        outcome = JudgmentOutcome::OffBeat;
                    }
                    NoteKind::Held if check.lifted => {
                        self.penalize(note, check.off_beat_loss, events);
                        outcome = JudgmentOutcome::LiftMiss;
                    }
                    NoteKind::Held => {}
                },
                None if check.lifted => {
                    self.penalize(note, check.off_beat_loss, events);
                    outcome = JudgmentOutcome::LiftMiss;
                }
                None => {}
            }
        }

        // Continuous hold: pressing anywhere inside the body engages it
        let in_body = adjusted >= note.hit_sample && adjusted - note.hit_sample < note.hold_samples;
        if note.kind == NoteKind::Held && !check.lifted && in_body {
            if !note.is_holding() {
                self.engage_hold(note, current_sample);
            }
            if outcome == JudgmentOutcome::Ignored {
                outcome = JudgmentOutcome::Holding;
            }
        }

        outcome
    }

    /// Credit whole beats held since the last call. Returns the number of new beats.
    ///
    /// Only beats that elapse while the note is held count: `held_for` starts
    /// at the beats already gone when the hold engaged.
    pub fn credit_hold(&self, note: &mut Note, current_sample: i64) -> i64 {
        if !note.is_holding() || note.is_destroyed() {
            return 0;
        }
        let beats = self.beats_elapsed(note, current_sample);
        let mut credited = 0;
        while beats > note.held_for {
            note.held_for += 1;
            credited += 1;
        }
        credited
    }

    /// Resolve a hold still engaged after its tail left the miss window.
    /// Returns true if the note was resolved.
    pub fn resolve_overrun(
        &mut self,
        note: &mut Note,
        current_sample: i64,
        off_beat_loss: i32,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if !note.is_holding() || note.is_destroyed() {
            return false;
        }
        let adjusted = current_sample - self.calibration_offset;
        if adjusted - note.tail_sample() < self.windows.miss {
            return false;
        }
        self.penalize(note, off_beat_loss, events);
        note.set_holding(false);
        note.held_for = 0;
        note.destroy();
        true
    }

    /// Retire notes that scrolled below `die_y` without being hit.
    ///
    /// Switch notes expire silently. Beat and held notes cost the lane its
    /// loss rate; if the lane is in play the combo breaks and a miss is
    /// shown. A note already penalized by an off-beat press is not counted as
    /// a second miss. Already destroyed or held notes are left alone, so a
    /// second sweep in the same frame changes nothing.
    pub fn sweep_dead_notes(
        &mut self,
        lane: &mut Lane,
        die_y: f32,
        in_play: bool,
        events: &mut Vec<GameEvent>,
    ) -> usize {
        let loss = lane.loss_rate();
        let mut missed = 0;
        for note in lane.hit_notes.iter_mut() {
            if note.is_destroyed() || note.is_holding() || note.y >= die_y {
                continue;
            }
            note.hit_status = -loss;
            note.destroy();
            missed += 1;
            if in_play {
                if !note.is_penalized() {
                    self.counts.miss += 1;
                    note.mark_penalized();
                }
                events.push(GameEvent::ComboReset);
                events.push(GameEvent::Indicator(IndicatorKind::Miss));
            }
        }
        for note in lane.switch_notes.iter_mut() {
            if note.is_destroyed() || note.y >= die_y {
                continue;
            }
            note.hit_status = 0;
            note.destroy();
        }
        missed
    }

    fn beats_elapsed(&self, note: &Note, current_sample: i64) -> i64 {
        ((current_sample - note.hit_sample) / self.samples_per_beat).max(0)
    }

    fn engage_hold(&self, note: &mut Note, current_sample: i64) {
        note.set_holding(true);
        note.held_for = self.beats_elapsed(note, current_sample);
    }

    fn register_hit(
        &mut self,
        note: &mut Note,
        grade: HitGrade,
        current_sample: i64,
        check: HitCheck,
        hit_registered: &mut [bool],
        events: &mut Vec<GameEvent>,
    ) {
        let gain = grade.gain(check.gain_rate);
        self.counts.record(grade);

        if note.kind == NoteKind::Held && !check.lifted {
            self.engage_hold(note, current_sample);
        }
        note.hit_status = gain;
        if note.line >= 0 {
            if let Some(claimed) = hit_registered.get_mut(note.line as usize) {
                *claimed = true;
            }
        }
        if check.destroy_on_hit {
            note.destroy();
        }

        events.push(GameEvent::Indicator(grade.indicator()));
        events.push(GameEvent::HitEffect {
            x: note.x,
            y: check.effect_anchor_y,
            sparks: (gain.max(0) as u32).saturating_mul(SPARKS_PER_STATUS),
            enhanced: grade == HitGrade::Perfect,
        });
        let cue = if note.kind == NoteKind::Switch {
            SoundCue::SwitchHit
        } else {
            grade.cue()
        };
        events.push(GameEvent::Cue(cue));
        events.push(GameEvent::PointsScored(grade.points()));
        log::trace!(
            "{:?} on {:?} line {} at sample {}",
            grade,
            note.kind,
            note.line,
            current_sample
        );
    }

    fn penalize(&mut self, note: &mut Note, loss: i32, events: &mut Vec<GameEvent>) {
        note.hit_status = loss;
        self.counts.miss += 1;
        note.mark_penalized();
        events.push(GameEvent::ComboReset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LaneData;

    fn windows() -> TimingWindows {
        TimingWindows::new(50, 80, 120, 180).unwrap()
    }

    fn judge() -> Judge {
        Judge::new(windows(), 0, 1000)
    }

    #[test]
    fn window_boundaries() {
        let w = windows();
        assert_eq!(w.classify(49), Some(Timing::Hit(HitGrade::Perfect)));
        assert_eq!(w.classify(50), Some(Timing::Hit(HitGrade::Good)));
        assert_eq!(w.classify(80), Some(Timing::Hit(HitGrade::Ok)));
        assert_eq!(w.classify(120), Some(Timing::OffBeat));
        assert_eq!(w.classify(179), Some(Timing::OffBeat));
        assert_eq!(w.classify(180), None);
    }

    #[test]
    fn windows_must_increase() {
        assert!(TimingWindows::new(50, 50, 120, 180).is_err());
        assert!(TimingWindows::new(0, 10, 20, 30).is_err());
        assert!(TimingWindows::from_sample_rate(0).is_err());
    }

    #[test]
    fn standard_windows_at_44k() {
        let w = TimingWindows::from_sample_rate(44_100).unwrap();
        assert_eq!((w.perfect, w.good, w.ok, w.miss), (2205, 3528, 5292, 7938));
    }

    #[test]
    fn gains_round_down() {
        assert_eq!(HitGrade::Perfect.gain(10), 15);
        assert_eq!(HitGrade::Good.gain(10), 12);
        assert_eq!(HitGrade::Ok.gain(10), 10);
        assert_eq!(HitGrade::Perfect.gain(3), 4);
    }

    #[test]
    fn hit_claims_its_line() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Beat, 2, 1000, 0);
        let mut reg = [false; 4];
        let mut events = Vec::new();
        let outcome = j.judge(&mut note, 1010, HitCheck::press(10, -2, 0.0), &mut reg, &mut events);
        assert_eq!(outcome, JudgmentOutcome::Hit(HitGrade::Perfect));
        assert_eq!(reg, [false, false, true, false]);
        assert!(note.is_destroyed());
        assert!(!note.is_holding());
        assert!(events.contains(&GameEvent::PointsScored(500)));
        assert!(events.contains(&GameEvent::Cue(SoundCue::PerfectHit)));
    }

    #[test]
    fn switch_note_hit_uses_switch_cue_and_no_line() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Switch, -1, 1000, 0);
        let mut reg = [false; 4];
        let mut events = Vec::new();
        j.judge(&mut note, 1090, HitCheck::press(20, 0, 0.0), &mut reg, &mut events);
        assert_eq!(reg, [false; 4]);
        assert_eq!(note.hit_status, 20);
        assert!(events.contains(&GameEvent::Cue(SoundCue::SwitchHit)));
        assert!(events.contains(&GameEvent::PointsScored(100)));
    }

    #[test]
    fn calibration_offset_shifts_the_clock() {
        let mut j = Judge::new(windows(), 100, 1000);
        let mut note = Note::new(NoteKind::Beat, 0, 1000, 0);
        let mut events = Vec::new();
        let outcome = j.judge(&mut note, 1100, HitCheck::press(10, -1, 0.0), &mut [false; 4], &mut events);
        assert_eq!(outcome, JudgmentOutcome::Hit(HitGrade::Perfect));
    }

    #[test]
    fn far_press_does_nothing() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Beat, 0, 1000, 0);
        let mut events = Vec::new();
        let outcome = j.judge(&mut note, 1500, HitCheck::press(10, -1, 0.0), &mut [false; 4], &mut events);
        assert_eq!(outcome, JudgmentOutcome::Ignored);
        assert!(events.is_empty());
        assert_eq!(j.counts(), JudgeCounts::default());
    }

    #[test]
    fn off_beat_press_on_held_head_is_ignored() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Held, 0, 1000, 5000);
        let mut events = Vec::new();
        let outcome = j.judge(&mut note, 850, HitCheck::hold_press(10, -1, 0.0), &mut [false; 4], &mut events);
        assert_eq!(outcome, JudgmentOutcome::Ignored);
        assert!(!note.is_holding());
    }

    #[test]
    fn pressing_inside_the_body_engages_the_hold() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Held, 0, 1000, 5000);
        let mut events = Vec::new();
        let outcome = j.judge(&mut note, 3500, HitCheck::hold_press(10, -1, 0.0), &mut [false; 4], &mut events);
        assert_eq!(outcome, JudgmentOutcome::Holding);
        assert!(note.is_holding());
        assert!(!note.is_destroyed());
        // Beats gone before the hold engaged are not creditable
        assert_eq!(note.held_for, 2);
        assert_eq!(j.credit_hold(&mut note, 3900), 0);
        assert_eq!(j.credit_hold(&mut note, 4000), 1);
    }

    #[test]
    fn held_head_is_not_scored_twice() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Held, 0, 1000, 5000);
        let mut events = Vec::new();
        j.judge(&mut note, 1000, HitCheck::hold_press(10, -1, 0.0), &mut [false; 4], &mut events);
        let again = j.judge(&mut note, 1020, HitCheck::hold_press(10, -1, 0.0), &mut [false; 4], &mut events);
        assert_eq!(again, JudgmentOutcome::Holding);
        assert_eq!(j.counts().perfect, 1);
    }

    #[test]
    fn hold_credits_each_beat_once() {
        let j = judge();
        let mut note = Note::new(NoteKind::Held, 0, 1000, 10_000);
        note.set_holding(true);
        assert_eq!(j.credit_hold(&mut note, 1500), 0);
        assert_eq!(j.credit_hold(&mut note, 2000), 1);
        assert_eq!(j.credit_hold(&mut note, 2500), 0);
        assert_eq!(j.credit_hold(&mut note, 5200), 3);
        assert_eq!(note.held_for, 4);
    }

    #[test]
    fn early_release_is_a_lift_miss() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Held, 1, 1000, 1000);
        note.set_holding(true);
        let mut events = Vec::new();
        let outcome = j.judge(&mut note, 1500, HitCheck::release(7, -3, 0.0), &mut [false; 4], &mut events);
        assert_eq!(outcome, JudgmentOutcome::LiftMiss);
        assert_eq!(note.hit_status, -3);
        assert_eq!(j.counts().miss, 1);
        assert!(events.contains(&GameEvent::ComboReset));
    }

    #[test]
    fn overrun_resolves_once_past_the_miss_window() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Held, 1, 1000, 1000);
        note.set_holding(true);
        let mut events = Vec::new();
        assert!(!j.resolve_overrun(&mut note, 2179, -2, &mut events));
        assert!(j.resolve_overrun(&mut note, 2180, -2, &mut events));
        assert!(note.is_destroyed());
        assert!(!note.is_holding());
        assert!(!j.resolve_overrun(&mut note, 2300, -2, &mut events));
        assert_eq!(j.counts().miss, 1);
    }

    #[test]
    fn huge_gain_rate_saturates_spark_count() {
        let mut j = judge();
        let mut note = Note::new(NoteKind::Beat, 0, 1000, 0);
        let mut events = Vec::new();
        j.judge(&mut note, 1000, HitCheck::press(1_000_000_000, -1, 0.0), &mut [false; 4], &mut events);
        let sparks = events.iter().find_map(|e| match e {
            GameEvent::HitEffect { sparks, .. } => Some(*sparks),
            _ => None,
        });
        assert_eq!(sparks, Some(u32::MAX));
    }

    #[test]
    fn off_beat_note_is_missed_once_when_swept() {
        let mut j = judge();
        let data = LaneData {
            max_competency: 30,
            loss_rate: 3,
            gain_rate: 10,
            notes: vec![],
        };
        let mut lane = Lane::new(0, &data, 4);
        let mut note = Note::new(NoteKind::Beat, 0, 1000, 0);
        let mut events = Vec::new();
        let outcome = j.judge(&mut note, 1150, HitCheck::press(10, -3, 0.0), &mut [false; 4], &mut events);
        assert_eq!(outcome, JudgmentOutcome::OffBeat);
        assert_eq!(j.counts().miss, 1);

        note.y = -10.0;
        lane.hit_notes.add(note);
        events.clear();
        assert_eq!(j.sweep_dead_notes(&mut lane, 0.0, true, &mut events), 1);
        assert_eq!(j.counts().miss, 1);
        assert!(events.contains(&GameEvent::Indicator(IndicatorKind::Miss)));
        assert_eq!(lane.settle(true), -3);
    }

    #[test]
    fn unpressed_note_is_missed_when_swept() {
        let mut j = judge();
        let data = LaneData {
            max_competency: 30,
            loss_rate: 3,
            gain_rate: 10,
            notes: vec![],
        };
        let mut lane = Lane::new(0, &data, 4);
        let mut note = Note::new(NoteKind::Beat, 0, 1000, 0);
        note.y = -10.0;
        lane.hit_notes.add(note);
        let mut events = Vec::new();
        assert_eq!(j.sweep_dead_notes(&mut lane, 0.0, true, &mut events), 1);
        assert_eq!(j.sweep_dead_notes(&mut lane, 0.0, true, &mut events), 0);
        assert_eq!(j.counts().miss, 1);
    }
}
