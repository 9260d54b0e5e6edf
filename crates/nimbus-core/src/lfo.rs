//! Low-frequency sine sources for delay modulation.
//!
//! - [`Phasor`] - a phase accumulator in turns (`[0, 1)`)
//! - [`LfoBank`] - a fixed bank of independent sine oscillators, one per
//!   feedback line, each with its own rate multiplier and starting phase
//!
//! Rates are supplied per call so the owner can sweep a global rate without
//! touching every oscillator.

use core::f32::consts::TAU;
use libm::{floorf, sinf};

/// Oscillators held by an [`LfoBank`].
pub const LFO_BANK_SIZE: usize = 16;

/// Phase accumulator measured in turns.
///
/// # Example
///
/// ```rust
/// use nimbus_core::Phasor;
///
/// let mut p = Phasor::new(0.25);
/// let before = p.advance(1.0, 4.0);
/// assert_eq!(before, 0.25);
/// assert_eq!(p.phase(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Phasor {
    phase: f32,
}

impl Phasor {
    /// Creates a phasor at `phase` turns (wrapped into `[0, 1)`).
    pub fn new(phase: f32) -> Self {
        Self {
            phase: wrap_turns(phase),
        }
    }

    /// Current phase in turns.
    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Sets the phase in turns.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap_turns(phase);
    }

    /// Returns the current phase, then advances by `freq_hz / sample_rate` turns.
    #[inline]
    pub fn advance(&mut self, freq_hz: f32, sample_rate: f32) -> f32 {
        let current = self.phase;
        if sample_rate > 0.0 {
            self.phase = wrap_turns(self.phase + freq_hz / sample_rate);
        }
        current
    }
}

/// Wraps any finite value into `[0, 1)`.
#[inline]
pub fn wrap_turns(x: f32) -> f32 {
    if !x.is_finite() {
        return 0.0;
    }
    let w = x - floorf(x);
    if w >= 1.0 { 0.0 } else { w }
}

#[derive(Debug, Clone, Copy, Default)]
struct Voice {
    phasor: Phasor,
    initial_phase: f32,
    rate_mul: f32,
}

/// Bank of sine LFOs, one per feedback line.
///
/// Each voice runs at `base_rate_hz * rate_mul(i)` with
/// `rate_mul(i) = 0.85 + 0.30 * i / (count - 1)` and a starting phase of
/// `i / count + 0.13` turns. Output is bipolar in `[-1, 1]`.
///
/// # Example
///
/// ```rust
/// use nimbus_core::LfoBank;
///
/// let mut bank = LfoBank::new(16, 48000.0);
/// let y = bank.process(3, 0.25);
/// assert!((-1.0..=1.0).contains(&y));
/// ```
#[derive(Debug, Clone)]
pub struct LfoBank {
    voices: [Voice; LFO_BANK_SIZE],
    count: usize,
    sample_rate: f32,
}

impl Default for LfoBank {
    fn default() -> Self {
        Self::new(LFO_BANK_SIZE, 48000.0)
    }
}

impl LfoBank {
    /// Creates `count` voices (clamped to `1..=LFO_BANK_SIZE`).
    pub fn new(count: usize, sample_rate: f32) -> Self {
        let count = count.clamp(1, LFO_BANK_SIZE);
        let denom = count.saturating_sub(1).max(1) as f32;
        let voices = core::array::from_fn(|i| {
            let t = (i.min(count - 1)) as f32 / denom;
            let initial_phase = wrap_turns(i as f32 / count as f32 + 0.13);
            Voice {
                phasor: Phasor::new(initial_phase),
                initial_phase,
                rate_mul: 0.85 + 0.30 * t,
            }
        });
        Self {
            voices,
            count,
            sample_rate,
        }
    }

    /// Number of active voices.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Always false; a bank holds at least one voice.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Advances voice `index` by one sample and returns its value.
    ///
    /// Indices beyond the active count wrap onto existing voices, so calling
    /// both `i` and `i + len()` in one sample advances that voice twice.
    /// Callers driving more lines than voices should reuse the value instead.
    #[inline]
    pub fn process(&mut self, index: usize, base_rate_hz: f32) -> f32 {
        let voice = &mut self.voices[index % self.count];
        let phase = voice
            .phasor
            .advance(base_rate_hz.max(0.0) * voice.rate_mul, self.sample_rate);
        sinf(TAU * phase)
    }

    /// Per-voice rate multiplier.
    pub fn rate_mul(&self, index: usize) -> f32 {
        self.voices[index % self.count].rate_mul
    }

    /// Restores every voice to its starting phase.
    pub fn reset(&mut self) {
        for v in self.voices.iter_mut() {
            v.phasor.set_phase(v.initial_phase);
        }
    }

    /// Updates the sample rate. Phases are kept.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
