//! RT60-anchored feedback gains.
//!
//! A single `decay01` control maps exponentially onto a reverberation time:
//!
//! ```text
//! rt60 = RT60_MIN_S * (RT60_MAX_S / RT60_MIN_S) ^ decay01
//! ```
//!
//! Each band (low / mid / high) scales that time by its own multiplier, and
//! every line derives the loop gain that reaches -60 dB after exactly that
//! time given its own delay length:
//!
//! ```text
//! gain = exp(ln(0.001) * delay_s / rt60_band)
//! ```
//!
//! Multipliers scale *time*, never gain, so a band multiplier above 1.0
//! still yields a gain below 1.0. [`MAX_FEEDBACK_GAIN`] is a hard ceiling
//! on top of that.

use libm::{expf, powf};

use crate::MAX_LINES;

/// Shortest reverberation time reachable with `decay01 = 0`.
pub const RT60_MIN_S: f32 = 0.2;
/// Longest reverberation time reachable with `decay01 = 1`.
pub const RT60_MAX_S: f32 = 12.0;
/// Upper bound for any per-line, per-band loop gain.
pub const MAX_FEEDBACK_GAIN: f32 = 0.9997;
/// Accepted range for band time multipliers.
pub const BAND_MUL_RANGE: (f32, f32) = (0.05, 4.0);

/// ln(0.001): the -60 dB point.
const LN_MINUS_60_DB: f32 = -6.907_755;

/// Maps `decay01` (clamped to `[0, 1]`) to seconds.
///
/// ```rust
/// use nimbus_tail::decay_to_rt60;
///
/// assert!((decay_to_rt60(0.0) - 0.2).abs() < 1e-6);
/// assert!((decay_to_rt60(1.0) - 12.0).abs() < 1e-4);
/// ```
#[inline]
pub fn decay_to_rt60(decay01: f32) -> f32 {
    let d = if decay01.is_finite() { decay01.clamp(0.0, 1.0) } else { 0.0 };
    RT60_MIN_S * powf(RT60_MAX_S / RT60_MIN_S, d)
}

/// Loop gain that decays by 60 dB after `rt60_s` for a loop of `delay_s`.
///
/// Always in `[0, MAX_FEEDBACK_GAIN]`.
#[inline]
pub fn feedback_gain(delay_s: f32, rt60_s: f32) -> f32 {
    if rt60_s.is_nan() || rt60_s <= 0.0 || !delay_s.is_finite() {
        return 0.0;
    }
    let g = expf(LN_MINUS_60_DB * delay_s.max(0.0) / rt60_s);
    g.clamp(0.0, MAX_FEEDBACK_GAIN)
}

/// Per-band loop gains for one line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandGains {
    /// Below the low crossover.
    pub low: f32,
    /// Between the crossovers.
    pub mid: f32,
    /// Above the high crossover.
    pub high: f32,
}

/// Band time multipliers applied to the base RT60.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandMultipliers {
    /// Low band.
    pub low: f32,
    /// Mid band.
    pub mid: f32,
    /// High band.
    pub high: f32,
}

impl Default for BandMultipliers {
    fn default() -> Self {
        Self {
            low: 1.08,
            mid: 1.0,
            high: 0.90,
        }
    }
}

impl BandMultipliers {
    /// Clamps each multiplier into [`BAND_MUL_RANGE`]; non-finite values become 1.0.
    pub fn sanitized(self) -> Self {
        let fix = |m: f32| {
            if m.is_finite() {
                m.clamp(BAND_MUL_RANGE.0, BAND_MUL_RANGE.1)
            } else {
                1.0
            }
        };
        Self {
            low: fix(self.low),
            mid: fix(self.mid),
            high: fix(self.high),
        }
    }
}

/// Memoized per-line band gains.
///
/// [`update`](Self::update) only recomputes when `decay01` differs from the
/// value it last saw, or after [`invalidate`](Self::invalidate).
#[derive(Debug, Clone)]
pub struct DecayModel {
    gains: [BandGains; MAX_LINES],
    last_decay: Option<f32>,
}

impl Default for DecayModel {
    fn default() -> Self {
        Self {
            gains: [BandGains::default(); MAX_LINES],
            last_decay: None,
        }
    }
}

impl DecayModel {
    /// Refreshes gains for `delays_s[..lines]` if `decay01` changed.
    ///
    /// Returns true when the table was recomputed.
    pub fn update(
        &mut self,
        decay01: f32,
        delays_s: &[f32],
        lines: usize,
        multipliers: BandMultipliers,
    ) -> bool {
        if self.last_decay == Some(decay01) {
            return false;
        }
        let rt60 = decay_to_rt60(decay01);
        let m = multipliers.sanitized();
        let (rt_low, rt_mid, rt_high) = (rt60 * m.low, rt60 * m.mid, rt60 * m.high);

        let n = lines.min(delays_s.len()).min(MAX_LINES);
        for (gain, &delay_s) in self.gains[..n].iter_mut().zip(delays_s) {
            *gain = BandGains {
                low: feedback_gain(delay_s, rt_low),
                mid: feedback_gain(delay_s, rt_mid),
                high: feedback_gain(delay_s, rt_high),
            };
        }
        for gain in self.gains[n..].iter_mut() {
            *gain = BandGains::default();
        }
        self.last_decay = Some(decay01);
        true
    }

    /// Forces the next [`update`](Self::update) to recompute.
    pub fn invalidate(&mut self) {
        self.last_decay = None;
    }

    /// Cached gains for `line` (zero past the active count).
    #[inline]
    pub fn gains(&self, line: usize) -> BandGains {
        self.gains.get(line).copied().unwrap_or_default()
    }

    /// Decay value the table was computed for.
    pub fn cached_decay(&self) -> Option<f32> {
        self.last_decay
    }
}
