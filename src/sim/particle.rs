//! Feedback particles
//!
//! Sparks burst from a hit note; indicators float under the judged lane and show
//! the hit quality. Neither affects gameplay.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::Reclaim;
use crate::consts::*;

/// Hit-quality shown by an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorKind {
    Perfect,
    Good,
    Ok,
    Miss,
}

/// Particle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Spark,
    /// Extra burst on perfect hits
    EnhancedSpark,
    Indicator(IndicatorKind),
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Frames lived
    pub age: u32,
    /// Frames until expiry
    pub lifetime: u32,
    pub destroyed: bool,
    /// Render scale, for the renderer only
    pub size_confine: f32,
}

impl Particle {
    pub fn new(kind: ParticleKind, pos: Vec2, vel: Vec2, lifetime: u32, size_confine: f32) -> Self {
        Self {
            kind,
            pos,
            vel,
            age: 0,
            lifetime,
            destroyed: false,
            size_confine,
        }
    }

    /// Advance one frame
    pub fn update(&mut self) {
        if self.destroyed {
            return;
        }
        self.pos += self.vel;
        self.age += 1;
        if self.age >= self.lifetime {
            self.destroyed = true;
        }
    }
}

impl Reclaim for Particle {
    fn is_reclaimable(&self) -> bool {
        self.destroyed || self.age >= self.lifetime
    }
}

/// Roll a spark velocity in a square around zero
fn roll_velocity(rng: &mut Pcg32) -> Vec2 {
    Vec2::new(
        rng.random_range(-SPARK_SPEED..SPARK_SPEED),
        rng.random_range(-SPARK_SPEED..SPARK_SPEED),
    )
}

/// Sparks for a hit at `at`. `count` is clipped to `budget`.
pub fn spark_burst(rng: &mut Pcg32, at: Vec2, count: u32, enhanced: bool, budget: usize) -> Vec<Particle> {
    let kind = if enhanced {
        ParticleKind::EnhancedSpark
    } else {
        ParticleKind::Spark
    };
    (0..(count as usize).min(budget))
        .map(|_| Particle::new(kind, at, roll_velocity(rng), SPARK_LIFETIME, SPARK_SIZE))
        .collect()
}

/// Hit-quality indicator drifting away from `at`
pub fn indicator(kind: IndicatorKind, at: Vec2) -> Particle {
    let scale = if kind == IndicatorKind::Perfect {
        PERFECT_INDICATOR_SCALE
    } else {
        1.0
    };
    Particle::new(
        ParticleKind::Indicator(kind),
        at,
        Vec2::new(0.0, INDICATOR_DRIFT),
        INDICATOR_LIFETIME,
        INDICATOR_SIZE * scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn particle_expires_after_lifetime() {
        let mut p = Particle::new(ParticleKind::Spark, Vec2::ZERO, Vec2::new(1.0, 0.0), 3, 1.0);
        for _ in 0..2 {
            p.update();
            assert!(!p.is_reclaimable());
        }
        p.update();
        assert!(p.is_reclaimable());
        assert_eq!(p.pos, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn burst_respects_budget() {
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(spark_burst(&mut rng, Vec2::ZERO, 30, false, 12).len(), 12);
        assert!(spark_burst(&mut rng, Vec2::ZERO, 30, false, 0).is_empty());
    }

    #[test]
    fn bursts_are_deterministic_per_seed() {
        let mut a = Pcg32::seed_from_u64(42);
        let mut b = Pcg32::seed_from_u64(42);
        let pa = spark_burst(&mut a, Vec2::ONE, 5, true, 100);
        let pb = spark_burst(&mut b, Vec2::ONE, 5, true, 100);
        for (x, y) in pa.iter().zip(&pb) {
            assert_eq!(x.vel, y.vel);
            assert_eq!(x.kind, ParticleKind::EnhancedSpark);
        }
    }

    #[test]
    fn perfect_indicator_draws_larger() {
        let perfect = indicator(IndicatorKind::Perfect, Vec2::ZERO);
        let ok = indicator(IndicatorKind::Ok, Vec2::ZERO);
        assert!(perfect.size_confine > ok.size_confine);
    }
}
