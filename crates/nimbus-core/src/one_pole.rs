//! One-pole filters for feedback damping and band splitting.
//!
//! The lowpass uses the difference equation:
//!
//! ```text
//! y[n] = x[n] + coeff * (y[n-1] - x[n])
//! ```
//!
//! where `coeff = exp(-2π * freq / sample_rate)`. The highpass is the
//! complement `x - LP(x)`.
//!
//! Cutoffs are clamped to `[MIN_CUTOFF_HZ, MAX_CUTOFF_RATIO * sample_rate]`
//! so the coefficient always stays inside `(0, 1)`.
//!
//! Inside a feedback network many lines often share one cutoff. Compute
//! the coefficient once with [`coefficient`] and hand it to each filter
//! through [`OnePole::set_coeff`].

use crate::flush_denormal;
use libm::expf;

/// Lowest cutoff accepted by the one-pole filters.
pub const MIN_CUTOFF_HZ: f32 = 5.0;

/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Clamps `freq_hz` into the stable cutoff range for `sample_rate`.
#[inline]
pub fn clamp_cutoff(freq_hz: f32, sample_rate: f32) -> f32 {
    let hi = (MAX_CUTOFF_RATIO * sample_rate).max(MIN_CUTOFF_HZ);
    if freq_hz.is_finite() {
        freq_hz.clamp(MIN_CUTOFF_HZ, hi)
    } else {
        hi
    }
}

/// One-pole lowpass coefficient for a (clamped) cutoff.
#[inline]
pub fn coefficient(freq_hz: f32, sample_rate: f32) -> f32 {
    let f = clamp_cutoff(freq_hz, sample_rate);
    expf(-core::f32::consts::TAU * f / sample_rate)
}

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Example
///
/// ```rust
/// use nimbus_core::OnePole;
///
/// let mut lp = OnePole::new(48000.0, 4000.0);
/// let filtered = lp.process(1.0);
/// assert!(filtered < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl Default for OnePole {
    fn default() -> Self {
        Self::new(48000.0, 1000.0)
    }
}

impl OnePole {
    /// Creates a lowpass at `freq_hz`.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Sets the cutoff frequency and recalculates the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = clamp_cutoff(freq_hz, self.sample_rate);
        self.recalculate_coeff();
    }

    /// Current (clamped) cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Overrides the coefficient directly, e.g. with a shared value from [`coefficient`].
    #[inline]
    pub fn set_coeff(&mut self, coeff: f32) {
        self.coeff = coeff.clamp(0.0, 0.999_999);
    }

    /// Current coefficient.
    #[inline]
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Resets the filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// Updates the sample rate and recalculates the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    fn recalculate_coeff(&mut self) {
        self.freq = clamp_cutoff(self.freq, self.sample_rate);
        self.coeff = coefficient(self.freq, self.sample_rate);
    }
}

/// One-pole highpass built as `x - LP(x)`.
///
/// Used in feedback paths to keep DC and sub-sonic rumble from building up.
#[derive(Debug, Clone, Default)]
pub struct OnePoleHighpass {
    lowpass: OnePole,
}

impl OnePoleHighpass {
    /// Creates a highpass at `freq_hz`.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            lowpass: OnePole::new(sample_rate, freq_hz),
        }
    }

    /// Sets the cutoff frequency.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.lowpass.set_frequency(freq_hz);
    }

    /// Current (clamped) cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.lowpass.frequency()
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        flush_denormal(input - self.lowpass.process(input))
    }

    /// Resets the filter state to zero.
    pub fn reset(&mut self) {
        self.lowpass.reset();
    }

    /// Updates the sample rate and recalculates the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.lowpass.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = lp.process(1.0);
        }
        assert!(
            (out - 1.0).abs() < 1e-4,
            "DC should pass through, got {out}"
        );
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut hp = OnePoleHighpass::new(48000.0, 30.0);
        let mut out = 1.0;
        for _ in 0..48000 {
            out = hp.process(1.0);
        }
        assert!(out.abs() < 1e-3, "DC should be removed, got {out}");
    }

    #[test]
    fn attenuates_high_freq() {
        let mut lp = OnePole::new(48000.0, 100.0);
        let mut peak = 0.0f32;
        for i in 0..4800 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = lp.process(x);
            if i > 2400 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.05, "Nyquist should be heavily attenuated, got {peak}");
    }

    #[test]
    fn cutoff_is_clamped() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.set_frequency(-50.0);
        assert_eq!(lp.frequency(), MIN_CUTOFF_HZ);
        lp.set_frequency(1e9);
        assert!((lp.frequency() - 0.49 * 48000.0).abs() < 1e-2);
        lp.set_frequency(f32::NAN);
        assert!(lp.frequency().is_finite());
        assert!(lp.coeff() > 0.0 && lp.coeff() < 1.0);
    }

    #[test]
    fn shared_coefficient_matches_own() {
        let a = OnePole::new(44100.0, 3500.0);
        let mut b = OnePole::new(44100.0, 100.0);
        b.set_coeff(coefficient(3500.0, 44100.0));
        assert_eq!(a.coeff(), b.coeff());
    }

    #[test]
    fn lowpass_plus_highpass_reconstructs() {
        let mut lp = OnePole::new(48000.0, 800.0);
        let mut hp = OnePoleHighpass::new(48000.0, 800.0);
        for i in 0..256 {
            let x = libm::sinf(i as f32 * 0.37);
            let sum = lp.process(x) + hp.process(x);
            assert!((sum - x).abs() < 1e-5);
        }
    }
}
