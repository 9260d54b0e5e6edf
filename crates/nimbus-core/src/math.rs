//! Mathematical utility functions for the reverb core.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Feedback Safety
//!
//! - [`flush_denormal`] - Scrub subnormal values out of recursive state
//! - [`soft_saturate`] - Unity-slope tanh saturator for feedback paths
//!
//! # Utilities
//!
//! - [`lerp`] - Linear interpolation
//! - [`ms_to_samples`] / [`samples_to_ms`] - Time conversions

use libm::{expf, logf, tanhf};

/// Threshold below which recursive state is forced to zero.
pub const DENORMAL_THRESHOLD: f32 = 1e-20;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use nimbus_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-60.0) - 0.001).abs() < 1e-6);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Values at or below `1e-10` map to -200 dB instead of `-inf`.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    if linear <= 1e-10 {
        return -200.0;
    }
    logf(linear) * FACTOR
}

/// Flush subnormal magnitudes to zero.
///
/// Feedback tails decay towards zero forever; once they fall below
/// [`DENORMAL_THRESHOLD`] the value is replaced with exactly `0.0`.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Unity-slope soft saturation.
///
/// `tanh(x * k) / k` with `k = 1 + drive` and `drive` clamped to `[0, 10]`.
/// The small-signal gain is exactly 1 and `|out| <= |x|` for every input,
/// so blending it into a feedback path can only remove energy.
///
/// # Example
/// ```rust
/// use nimbus_core::soft_saturate;
///
/// let small = soft_saturate(0.001, 1.2);
/// assert!((small - 0.001).abs() < 1e-6);
/// assert!(soft_saturate(10.0, 1.2).abs() < 10.0);
/// ```
#[inline]
pub fn soft_saturate(x: f32, drive: f32) -> f32 {
    let k = 1.0 + drive.clamp(0.0, 10.0);
    tanhf(x * k) / k
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert milliseconds to samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Convert samples to milliseconds.
#[inline]
pub fn samples_to_ms(samples: f32, sample_rate: f32) -> f32 {
    samples * 1000.0 / sample_rate
}
