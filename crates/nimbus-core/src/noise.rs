//! Seeded random sources for delay jitter.
//!
//! Every generator owns its state by value; there is no shared or static
//! RNG. Two instances built from the same seed produce identical streams,
//! which keeps per-line decorrelated noise reproducible in tests.
//!
//! - [`SeededRng`] - 32-bit linear congruential generator
//! - [`SmoothNoise`] - sample-and-hold random targets, one-pole smoothed
//!   into a slow random walk

use libm::expf;

use crate::flush_denormal;

const LCG_MUL: u32 = 1664525;
const LCG_ADD: u32 = 1013904223;

/// Linear congruential generator with explicit, owned state.
///
/// # Example
///
/// ```rust
/// use nimbus_core::SeededRng;
///
/// let mut a = SeededRng::new(42);
/// let mut b = SeededRng::new(42);
/// assert_eq!(a.next_u32(), b.next_u32());
/// let x = a.next_bipolar();
/// assert!((-1.0..1.0).contains(&x));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SeededRng {
    /// Creates a generator. A zero seed is replaced with 1.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_ADD);
        self.state
    }

    /// Uniform value in `[0, 1)` built from the top 23 bits.
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        f32::from_bits((self.next_u32() >> 9) | 0x3F80_0000) - 1.0
    }

    /// Uniform value in `[-1, 1)`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unipolar() * 2.0 - 1.0
    }

    /// Uniform index in `0..bound` (returns 0 for `bound == 0`).
    #[inline]
    pub fn next_index(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        ((self.next_u32() >> 8) as usize) % bound
    }
}

/// Smoothed random walk.
///
/// A new bipolar target is drawn every `sample_rate / rate_hz` samples and
/// the output glides towards it through a one-pole smoother with a
/// `smooth_ms` time constant.
///
/// # Example
///
/// ```rust
/// use nimbus_core::SmoothNoise;
///
/// let mut n = SmoothNoise::new(48000.0, 7);
/// n.set_rate_hz(0.35);
/// n.set_smooth_ms(80.0);
/// for _ in 0..48000 {
///     let v = n.process();
///     assert!((-1.0..=1.0).contains(&v));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SmoothNoise {
    rng: SeededRng,
    seed: u32,
    sample_rate: f32,
    rate_hz: f32,
    smooth_ms: f32,
    period: u32,
    counter: u32,
    target: f32,
    value: f32,
    smooth_coeff: f32,
}

impl Default for SmoothNoise {
    fn default() -> Self {
        Self::new(48000.0, 1)
    }
}

impl SmoothNoise {
    /// Lowest accepted target rate.
    pub const MIN_RATE_HZ: f32 = 0.01;
    /// Highest accepted target rate.
    pub const MAX_RATE_HZ: f32 = 20.0;

    /// Creates a generator at 1 Hz with 50 ms smoothing.
    pub fn new(sample_rate: f32, seed: u32) -> Self {
        let mut noise = Self {
            rng: SeededRng::new(seed),
            seed,
            sample_rate: sample_rate.max(1.0),
            rate_hz: 1.0,
            smooth_ms: 50.0,
            period: 1,
            counter: 0,
            target: 0.0,
            value: 0.0,
            smooth_coeff: 0.0,
        };
        noise.recalculate();
        noise
    }

    /// Reseeds the generator and restarts the walk from zero.
    pub fn seed(&mut self, seed: u32) {
        self.seed = seed;
        self.clear();
    }

    /// Sets how often a new target is drawn, clamped to `[0.01, 20]` Hz.
    pub fn set_rate_hz(&mut self, rate_hz: f32) {
        let r = if rate_hz.is_finite() { rate_hz } else { 1.0 };
        self.rate_hz = r.clamp(Self::MIN_RATE_HZ, Self::MAX_RATE_HZ);
        self.recalculate();
    }

    /// Sets the smoothing time constant in milliseconds (at least 0.1 ms).
    pub fn set_smooth_ms(&mut self, smooth_ms: f32) {
        let ms = if smooth_ms.is_finite() { smooth_ms } else { 50.0 };
        self.smooth_ms = ms.max(0.1);
        self.recalculate();
    }

    /// Updates the sample rate, keeping rate and smoothing in physical units.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.recalculate();
    }

    /// Rewinds the stream to its seed and zeroes the output.
    pub fn clear(&mut self) {
        self.rng = SeededRng::new(self.seed);
        self.counter = 0;
        self.target = 0.0;
        self.value = 0.0;
    }

    /// Next smoothed sample in `[-1, 1]`.
    #[inline]
    pub fn process(&mut self) -> f32 {
        if self.counter == 0 {
            self.target = self.rng.next_bipolar();
            self.counter = self.period;
        }
        self.counter -= 1;
        self.value = flush_denormal(self.target + self.smooth_coeff * (self.value - self.target));
        self.value
    }

    /// Last output value.
    pub fn value(&self) -> f32 {
        self.value
    }

    fn recalculate(&mut self) {
        self.period = ((self.sample_rate / self.rate_hz) as u32).max(1);
        self.counter = self.counter.min(self.period);
        let samples = self.smooth_ms * 0.001 * self.sample_rate;
        self.smooth_coeff = expf(-1.0 / samples.max(1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_is_remapped() {
        assert_eq!(SeededRng::new(0), SeededRng::new(1));
    }

    #[test]
    fn test_unipolar_range() {
        let mut rng = SeededRng::new(1234);
        for _ in 0..10000 {
            let x = rng.next_unipolar();
            assert!((0.0..1.0).contains(&x), "out of range: {x}");
        }
    }

    #[test]
    fn test_bipolar_mean_near_zero() {
        let mut rng = SeededRng::new(99);
        let n = 20000;
        let mean: f32 = (0..n).map(|_| rng.next_bipolar()).sum::<f32>() / n as f32;
        assert!(mean.abs() < 0.05, "mean should be near zero, got {mean}");
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SmoothNoise::new(48000.0, 1);
        let mut b = SmoothNoise::new(48000.0, 2);
        let mut diff = 0.0f32;
        for _ in 0..4800 {
            diff += (a.process() - b.process()).abs();
        }
        assert!(diff > 1.0);
    }

    #[test]
    fn test_clear_replays_stream() {
        let mut n = SmoothNoise::new(48000.0, 5);
        n.set_rate_hz(10.0);
        let first: [f32; 64] = core::array::from_fn(|_| n.process());
        for _ in 0..1000 {
            n.process();
        }
        n.clear();
        let again: [f32; 64] = core::array::from_fn(|_| n.process());
        assert_eq!(first, again);
    }

    #[test]
    fn test_smoothing_limits_slew() {
        let mut n = SmoothNoise::new(48000.0, 3);
        n.set_rate_hz(20.0);
        n.set_smooth_ms(80.0);
        let mut prev = n.process();
        for _ in 0..48000 {
            let v = n.process();
            // max slew for a 80 ms one-pole over a full-scale jump
            assert!((v - prev).abs() < 2.0 / (0.08 * 48000.0) + 1e-6);
            prev = v;
        }
    }

    #[test]
    fn test_rate_clamped() {
        let mut n = SmoothNoise::new(48000.0, 3);
        n.set_rate_hz(1000.0);
        assert_eq!(n.rate_hz, SmoothNoise::MAX_RATE_HZ);
        n.set_rate_hz(0.0);
        assert_eq!(n.rate_hz, SmoothNoise::MIN_RATE_HZ);
    }
}
