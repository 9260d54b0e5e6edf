//! Envelope follower for tracking tail energy.
//!
//! Peak detection with separate attack and release one-pole smoothers.

use libm::expf;

use crate::flush_denormal;

/// Envelope follower for tracking signal amplitude.
///
/// # Example
///
/// ```rust
/// use nimbus_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::new(48000.0);
/// env.set_times_ms(12.0, 280.0);
///
/// let level = env.process(0.5);
/// assert!(level > 0.0 && level < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    attack_ms: f32,
    release_ms: f32,
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl EnvelopeFollower {
    /// Creates a follower with 10 ms attack and 100 ms release.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_times(sample_rate, 10.0, 100.0)
    }

    /// Creates a follower with the given attack and release times.
    pub fn with_times(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms: attack_ms.max(0.1),
            release_ms: release_ms.max(0.1),
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Sets attack and release in milliseconds (each at least 0.1 ms).
    pub fn set_times_ms(&mut self, attack_ms: f32, release_ms: f32) {
        self.attack_ms = attack_ms.max(0.1);
        self.release_ms = release_ms.max(0.1);
        self.recalculate_coefficients();
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Updates the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Feeds one sample and returns the envelope level.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level = input.abs();
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = flush_denormal(level + coeff * (self.envelope - level));
        self.envelope
    }

    /// Current envelope level without processing.
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Resets the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = time_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_coeff(self.release_ms, self.sample_rate);
    }
}

fn time_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = ms * sample_rate / 1000.0;
    if samples > 0.0 {
        expf(-1.0 / samples)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_constant_level() {
        let mut env = EnvelopeFollower::with_times(48000.0, 1.0, 50.0);
        for _ in 0..4800 {
            env.process(0.8);
        }
        assert!((env.level() - 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_release_slower_than_attack() {
        let mut env = EnvelopeFollower::with_times(48000.0, 1.0, 200.0);
        let mut rise = 0;
        while env.process(1.0) < 0.5 {
            rise += 1;
        }
        for _ in 0..4800 {
            env.process(1.0);
        }
        let mut fall = 0;
        while env.process(0.0) > 0.5 {
            fall += 1;
        }
        assert!(fall > rise * 10, "rise {rise} fall {fall}");
    }

    #[test]
    fn test_negative_input_rectified() {
        let mut env = EnvelopeFollower::new(48000.0);
        assert!(env.process(-1.0) > 0.0);
    }

    #[test]
    fn test_reset() {
        let mut env = EnvelopeFollower::new(48000.0);
        env.process(1.0);
        env.reset();
        assert_eq!(env.level(), 0.0);
    }
}
