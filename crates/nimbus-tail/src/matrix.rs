//! Feedback mixing matrices.
//!
//! Both transforms are orthogonal, so they redistribute energy between the
//! delay lines without adding or removing any of it:
//!
//! | Matrix | Valid N | Cost | Notes |
//! |--------|---------|------|-------|
//! | [`MatrixType::Hadamard`] | powers of two | O(N log N) | dense, every line feeds every other with equal weight |
//! | [`MatrixType::Householder`] | any | O(N) | `I - 2/N * 11ᵀ`, strong self-feedback |
//!
//! Hadamard requested for a non-power-of-two line count falls back to
//! Householder.

use libm::sqrtf;

use crate::MAX_LINES;

/// Feedback matrix selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatrixType {
    /// Scaled fast Walsh-Hadamard transform.
    Hadamard,
    /// Reflection about the all-ones vector.
    #[default]
    Householder,
}

/// Mixes the first `lines` entries of `v` in place.
///
/// `lines` is limited to `min(v.len(), MAX_LINES)` and zero is a no-op.
/// Entries past it are untouched.
///
/// # Example
///
/// ```rust
/// use nimbus_tail::{MatrixType, mix};
///
/// let mut v = [1.0, 0.0, 0.0, 0.0];
/// mix(&mut v, 4, MatrixType::Hadamard);
/// assert_eq!(v, [0.5, 0.5, 0.5, 0.5]);
/// ```
#[inline]
pub fn mix(v: &mut [f32], lines: usize, matrix: MatrixType) {
    let n = lines.min(v.len()).min(MAX_LINES);
    if n == 0 {
        return;
    }
    let v = &mut v[..n];
    match matrix {
        MatrixType::Hadamard if n.is_power_of_two() => hadamard_mix(v),
        _ => householder_mix(v),
    }
}

/// In-place fast Walsh-Hadamard transform scaled by `1/sqrt(N)`.
///
/// `v.len()` must be a power of two; other lengths are mixed with
/// [`householder_mix`] instead.
#[inline]
pub fn hadamard_mix(v: &mut [f32]) {
    let n = v.len();
    if !n.is_power_of_two() {
        householder_mix(v);
        return;
    }
    let mut h = 1;
    while h < n {
        for block in (0..n).step_by(h * 2) {
            for i in block..block + h {
                let a = v[i];
                let b = v[i + h];
                v[i] = a + b;
                v[i + h] = a - b;
            }
        }
        h *= 2;
    }
    let scale = 1.0 / sqrtf(n as f32);
    for x in v.iter_mut() {
        *x *= scale;
    }
}

/// In-place Householder reflection `v - 2 * mean(v)`.
#[inline]
pub fn householder_mix(v: &mut [f32]) {
    if v.is_empty() {
        return;
    }
    let mean = v.iter().sum::<f32>() / v.len() as f32;
    let shift = 2.0 * mean;
    for x in v.iter_mut() {
        *x -= shift;
    }
}
