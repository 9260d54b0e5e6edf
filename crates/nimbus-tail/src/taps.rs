//! Stereo tap patterns over the tank's per-line outputs.
//!
//! A pattern picks a handful of lines for each channel and sums them with
//! alternating signs. Left and right use different index sets or opposite
//! sign sequences so the two channels decorrelate. Each sum is divided by
//! its own tap count so patterns sit at comparable levels.
//!
//! | Pattern | Character | Left taps | Right taps |
//! |---------|-----------|-----------|------------|
//! | [`TapPattern::Wide`] | balanced, wide | 0 2 5 7 9 12 14 (+-) | 1 3 4 6 10 13 15 (-+) |
//! | [`TapPattern::Centered`] | narrower image | 0 3 5 8 11 13 (+-) | same lines (-+) |
//! | [`TapPattern::Airy`] | sparse, light | 2 6 9 12 (+-) | 1 7 10 15 (-+) |
//! | [`TapPattern::Interleaved`] | widest | every even line | every odd line |
//!
//! Indices beyond the active line count wrap around it.

use crate::MAX_LINES;

/// Number of distinct tap patterns.
pub const TAP_PATTERN_COUNT: i32 = 4;

/// Stereo tap layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TapPattern {
    /// Disjoint, evenly spread taps per side.
    #[default]
    Wide,
    /// Shared taps with opposite sign sequences.
    Centered,
    /// Four taps per side.
    Airy,
    /// Even lines to the left, odd lines to the right.
    Interleaved,
}

impl TapPattern {
    /// Maps any integer onto a pattern with Euclidean wrapping.
    ///
    /// ```rust
    /// use nimbus_tail::TapPattern;
    ///
    /// assert_eq!(TapPattern::from_id(-1), TapPattern::Interleaved);
    /// assert_eq!(TapPattern::from_id(5), TapPattern::Centered);
    /// ```
    pub fn from_id(id: i32) -> Self {
        match id.rem_euclid(TAP_PATTERN_COUNT) {
            0 => Self::Wide,
            1 => Self::Centered,
            2 => Self::Airy,
            _ => Self::Interleaved,
        }
    }

    /// Numeric id in `0..TAP_PATTERN_COUNT`.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Renders `(left, right)` from the first `lines` entries of `y`.
    #[inline]
    pub fn render(self, y: &[f32], lines: usize) -> (f32, f32) {
        let lines = lines.clamp(1, MAX_LINES).min(y.len());
        if lines == 0 {
            return (0.0, 0.0);
        }
        match LAYOUTS[self as usize] {
            Layout::Fixed { left, right } => {
                (sum_taps(y, lines, &left), sum_taps(y, lines, &right))
            }
            Layout::Interleaved => interleaved(y, lines),
        }
    }
}

/// One side of a fixed layout: line indices summed with alternating signs.
#[derive(Clone, Copy)]
struct TapSet {
    indices: &'static [usize],
    first_sign: f32,
}

#[derive(Clone, Copy)]
enum Layout {
    Fixed { left: TapSet, right: TapSet },
    Interleaved,
}

const LAYOUTS: [Layout; TAP_PATTERN_COUNT as usize] = [
    Layout::Fixed {
        left: TapSet {
            indices: &[0, 2, 5, 7, 9, 12, 14],
            first_sign: 1.0,
        },
        right: TapSet {
            indices: &[1, 3, 4, 6, 10, 13, 15],
            first_sign: -1.0,
        },
    },
    Layout::Fixed {
        left: TapSet {
            indices: &[0, 3, 5, 8, 11, 13],
            first_sign: 1.0,
        },
        right: TapSet {
            indices: &[0, 3, 5, 8, 11, 13],
            first_sign: -1.0,
        },
    },
    Layout::Fixed {
        left: TapSet {
            indices: &[2, 6, 9, 12],
            first_sign: 1.0,
        },
        right: TapSet {
            indices: &[1, 7, 10, 15],
            first_sign: -1.0,
        },
    },
    Layout::Interleaved,
];

#[inline]
fn sum_taps(y: &[f32], lines: usize, set: &TapSet) -> f32 {
    let mut sign = set.first_sign;
    let mut sum = 0.0;
    for &idx in set.indices {
        sum += sign * y[idx % lines];
        sign = -sign;
    }
    sum / set.indices.len() as f32
}

#[inline]
fn interleaved(y: &[f32], lines: usize) -> (f32, f32) {
    let (mut left, mut right) = (0.0, 0.0);
    let (mut n_left, mut n_right) = (0u32, 0u32);
    for (i, &v) in y[..lines].iter().enumerate() {
        if i % 2 == 0 {
            left += v;
            n_left += 1;
        } else {
            right += v;
            n_right += 1;
        }
    }
    let norm = |sum: f32, n: u32| if n > 0 { sum / n as f32 } else { sum };
    (norm(left, n_left), norm(right, n_right))
}

/// Renders a stereo pair from tank outputs using pattern `pattern_id`.
///
/// Any integer id is valid; it wraps with Euclidean modulo over
/// [`TAP_PATTERN_COUNT`].
///
/// # Example
///
/// ```rust
/// use nimbus_tail::{TAP_PATTERN_COUNT, render_tap_pattern};
///
/// let y: [f32; 16] = core::array::from_fn(|i| i as f32 * 0.1);
/// assert_eq!(
///     render_tap_pattern(&y, 16, -1),
///     render_tap_pattern(&y, 16, TAP_PATTERN_COUNT - 1),
/// );
/// ```
#[inline]
pub fn render_tap_pattern(y: &[f32], lines: usize, pattern_id: i32) -> (f32, f32) {
    TapPattern::from_id(pattern_id).render(y, lines)
}

/// Crossfades two pattern renderings; `morph` is clamped to `[0, 1]`.
#[inline]
pub fn render_morphing_pattern(
    y: &[f32],
    lines: usize,
    pattern_a: i32,
    pattern_b: i32,
    morph: f32,
) -> (f32, f32) {
    let m = if morph.is_finite() { morph.clamp(0.0, 1.0) } else { 0.0 };
    let (al, ar) = render_tap_pattern(y, lines, pattern_a);
    let (bl, br) = render_tap_pattern(y, lines, pattern_b);
    ((1.0 - m) * al + m * bl, (1.0 - m) * ar + m * br)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> [f32; MAX_LINES] {
        core::array::from_fn(|i| (i + 1) as f32)
    }

    #[test]
    fn test_wide_pattern_values() {
        let y = ramp();
        let (l, r) = render_tap_pattern(&y, 16, 0);
        // L: +1 -3 +6 -8 +10 -13 +15 = 8
        assert!((l - 8.0 / 7.0).abs() < 1e-6);
        // R: -2 +4 -5 +7 -11 +14 -16 = -9
        assert!((r + 9.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_centered_is_antiphase() {
        let y = ramp();
        let (l, r) = render_tap_pattern(&y, 16, 1);
        assert!((l + r).abs() < 1e-6);
    }

    #[test]
    fn test_interleaved_normalizes_per_side() {
        let y = [1.0f32; MAX_LINES];
        let (l, r) = render_tap_pattern(&y, 16, 3);
        assert!((l - 1.0).abs() < 1e-6);
        assert!((r - 1.0).abs() < 1e-6);
        let (l, r) = render_tap_pattern(&y, 1, 3);
        assert_eq!((l, r), (1.0, 0.0));
    }

    #[test]
    fn test_indices_wrap_to_line_count() {
        let mut y = [0.0f32; MAX_LINES];
        y[..8].copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        // Airy left with 8 lines: 2 6 1 4 -> +3 -7 +2 -5
        let (l, _) = render_tap_pattern(&y, 8, 2);
        assert!((l - (-7.0 / 4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_negative_ids_wrap() {
        let y = ramp();
        for id in -12..12 {
            assert_eq!(
                render_tap_pattern(&y, 16, id),
                render_tap_pattern(&y, 16, id.rem_euclid(TAP_PATTERN_COUNT))
            );
        }
    }

    #[test]
    fn test_morph_endpoints() {
        let y = ramp();
        assert_eq!(
            render_morphing_pattern(&y, 16, 0, 2, 0.0),
            render_tap_pattern(&y, 16, 0)
        );
        assert_eq!(
            render_morphing_pattern(&y, 16, 0, 2, 7.0),
            render_tap_pattern(&y, 16, 2)
        );
    }

    #[test]
    fn test_morph_is_linear() {
        let y = ramp();
        let a = render_tap_pattern(&y, 16, 0);
        let b = render_tap_pattern(&y, 16, 1);
        let m = render_morphing_pattern(&y, 16, 0, 1, 0.25);
        assert!((m.0 - (0.75 * a.0 + 0.25 * b.0)).abs() < 1e-6);
        assert!((m.1 - (0.75 * a.1 + 0.25 * b.1)).abs() < 1e-6);
    }

    #[test]
    fn test_short_input_does_not_panic() {
        let y = [0.5f32; 3];
        let (l, r) = render_tap_pattern(&y, 16, 0);
        assert!(l.is_finite() && r.is_finite());
    }
}
