//! Decorrelated stereo injection vectors.
//!
//! Instead of feeding every line the same mono sample, the stereo input is
//! split into mid and side. Mid goes to all lines equally; side goes to a
//! balanced, seed-shuffled set of `+` and `-` lines. The two vectors are
//! orthogonal, so the side signal excites a different set of tank modes
//! than the mid signal, and the stereo image survives the feedback.
//!
//! With `width = 0` the result equals [`Tank::process_sample`](crate::Tank::process_sample)
//! fed with `(l + r) / 2`.

use nimbus_core::SeededRng;

use crate::MAX_LINES;

/// Builds per-line injection vectors from a stereo pair.
///
/// # Example
///
/// ```rust
/// use nimbus_tail::{MAX_LINES, StereoInjector};
///
/// let mut inj = StereoInjector::new(7);
/// let v = inj.build(1.0, -1.0, MAX_LINES);
/// // pure side input: the vector sums to zero
/// assert!(v.iter().sum::<f32>().abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct StereoInjector {
    mid: [f32; MAX_LINES],
    side: [f32; MAX_LINES],
    /// Line count the vectors were built for; 0 until the first build.
    built_for: usize,
    seed: u32,
    width: f32,
}

impl Default for StereoInjector {
    fn default() -> Self {
        Self::new(1)
    }
}

impl StereoInjector {
    /// Highest accepted side width.
    pub const MAX_WIDTH: f32 = 2.0;

    /// Creates an injector with unit width.
    pub fn new(seed: u32) -> Self {
        Self {
            mid: [0.0; MAX_LINES],
            side: [0.0; MAX_LINES],
            built_for: 0,
            seed,
            width: 1.0,
        }
    }

    /// Side gain, clamped to `[0, MAX_WIDTH]`.
    pub fn set_width(&mut self, width: f32) {
        let w = if width.is_finite() { width } else { 1.0 };
        self.width = w.clamp(0.0, Self::MAX_WIDTH);
    }

    /// Current side gain.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Changes the shuffle seed; vectors are rebuilt on the next call.
    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
        self.built_for = 0;
    }

    /// Mid vector for the last built line count.
    pub fn mid_vector(&self) -> &[f32; MAX_LINES] {
        &self.mid
    }

    /// Side vector for the last built line count.
    pub fn side_vector(&self) -> &[f32; MAX_LINES] {
        &self.side
    }

    /// Injection vector for one stereo sample.
    ///
    /// Vectors are rebuilt only when `lines` changes.
    #[inline]
    pub fn build(&mut self, left: f32, right: f32, lines: usize) -> [f32; MAX_LINES] {
        let n = lines.clamp(1, MAX_LINES);
        if n != self.built_for {
            self.rebuild(n);
        }
        let mid = 0.5 * (left + right);
        let side = 0.5 * (left - right) * self.width;
        let mut out = [0.0; MAX_LINES];
        for i in 0..n {
            out[i] = self.mid[i] * mid + self.side[i] * side;
        }
        out
    }

    fn rebuild(&mut self, n: usize) {
        let scale = 1.0 / n as f32;
        self.mid = [0.0; MAX_LINES];
        self.side = [0.0; MAX_LINES];
        self.mid[..n].fill(scale);

        // equal numbers of + and -; an odd line count leaves the last line at 0
        let paired = n - n % 2;
        for (i, s) in self.side[..paired].iter_mut().enumerate() {
            *s = if i % 2 == 0 { scale } else { -scale };
        }
        let mut rng = SeededRng::new(self.seed);
        for i in (1..paired).rev() {
            let j = rng.next_index(i + 1);
            self.side.swap(i, j);
        }
        self.built_for = n;
    }
}
