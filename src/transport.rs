//! Audio transport contract
//!
//! The simulation never reads wall-clock time. Every judgment is made against
//! the sample position reported by the playback transport, which keeps results
//! independent of frame rate as long as the transport only moves forward.

/// Playback clock exposed by the audio backend
pub trait Transport {
    /// Current playback position in samples
    fn current_sample(&self) -> i64;
    /// Samples per second
    fn sample_rate(&self) -> u32;
    /// Song tempo
    fn bpm(&self) -> f32;
    /// Whether the song is still playing
    fn is_playing(&self) -> bool;
}

/// Scriptable transport for headless runs and tests
#[derive(Debug, Clone)]
pub struct ManualTransport {
    sample: i64,
    sample_rate: u32,
    bpm: f32,
    playing: bool,
    /// Playback stops once the position reaches this sample
    end_sample: Option<i64>,
}

impl ManualTransport {
    pub fn new(sample_rate: u32, bpm: f32) -> Self {
        Self {
            sample: 0,
            sample_rate,
            bpm,
            playing: true,
            end_sample: None,
        }
    }

    /// Stop playback automatically at `end`
    pub fn with_end(mut self, end: i64) -> Self {
        self.end_sample = Some(end);
        self
    }

    /// Jump to an absolute position. Positions must not move backwards during a session.
    pub fn seek(&mut self, sample: i64) {
        debug_assert!(sample >= self.sample, "transport clock regressed");
        self.sample = sample;
        self.check_end();
    }

    /// Advance by `samples`
    pub fn advance(&mut self, samples: i64) {
        self.seek(self.sample + samples.max(0));
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    fn check_end(&mut self) {
        if let Some(end) = self.end_sample {
            if self.sample >= end {
                self.playing = false;
            }
        }
    }
}

impl Transport for ManualTransport {
    fn current_sample(&self) -> i64 {
        self.sample
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn bpm(&self) -> f32 {
        self.bpm
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_end_sample() {
        let mut t = ManualTransport::new(44_100, 120.0).with_end(1000);
        t.advance(999);
        assert!(t.is_playing());
        t.advance(1);
        assert!(!t.is_playing());
        assert_eq!(t.current_sample(), 1000);
    }
}
