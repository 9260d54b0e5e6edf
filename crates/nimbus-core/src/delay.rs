//! Fractional delay line for feedback networks.
//!
//! A fixed-capacity circular buffer read with 4-point cubic Hermite
//! interpolation. The buffer is sized once by [`DelayLine::new`] or
//! [`DelayLine::init`] and never reallocates while processing.
//!
//! # Read Convention
//!
//! Delay is measured in pushes: `read(1.0)` returns the most recent
//! [`push`](DelayLine::push), `read(k)` for integer `k` returns exactly the
//! sample pushed `k` pushes ago. Offsets are clamped to `[0, capacity - 4]`
//! so all four interpolation taps stay inside the buffer. Reading at `0.0`
//! lands on the slot about to be overwritten, so feedback loops should
//! floor their read delay at [`MIN_READ_DELAY`].

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Smallest capacity that can hold the four interpolation taps.
pub const MIN_CAPACITY: usize = 4;

/// Smallest read delay a feedback loop should request.
pub const MIN_READ_DELAY: f32 = 1.0;

/// Circular delay buffer with cubic Hermite fractional reads.
///
/// A default-constructed line has no storage and reads silence until
/// [`init`](Self::init) is called.
///
/// # Example
///
/// ```rust
/// use nimbus_core::DelayLine;
///
/// let mut line = DelayLine::new(64);
/// line.push(1.0);
/// for _ in 0..9 {
///     line.push(0.0);
/// }
/// assert_eq!(line.read(10.0), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    buffer: Vec<f32>,
    /// Slot written by the next push.
    write_pos: usize,
}

impl DelayLine {
    /// Creates a delay line holding `max_samples` samples (at least [`MIN_CAPACITY`]).
    pub fn new(max_samples: usize) -> Self {
        let mut line = Self::default();
        line.init(max_samples);
        line
    }

    /// (Re)allocates storage for `max_samples` samples and zeroes it.
    ///
    /// This is the only method that allocates.
    pub fn init(&mut self, max_samples: usize) {
        let capacity = max_samples.max(MIN_CAPACITY);
        self.buffer = vec![0.0; capacity];
        self.write_pos = 0;

        #[cfg(feature = "tracing")]
        tracing::debug!("delay_init: {capacity} samples");
    }

    /// Writes one sample and advances the cursor.
    #[inline]
    pub fn push(&mut self, x: f32) {
        let len = self.buffer.len();
        if len == 0 {
            return;
        }
        self.buffer[self.write_pos] = x;
        self.write_pos += 1;
        if self.write_pos == len {
            self.write_pos = 0;
        }
    }

    /// Reads the line `delay_samples` pushes back with cubic Hermite interpolation.
    ///
    /// `delay_samples` is clamped to `[0, max_delay()]`. Between 1 and 2 the
    /// missing newer tap is extrapolated from the two newest samples. Below 1
    /// the read lands on the slot about to be overwritten and is not
    /// meaningful; keep reads at or above [`MIN_READ_DELAY`].
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        if len < MIN_CAPACITY {
            return 0.0;
        }

        let max_delay = (len - MIN_CAPACITY) as f32;
        let d = if delay_samples.is_finite() {
            delay_samples.clamp(0.0, max_delay)
        } else {
            0.0
        };
        let whole = d as usize;
        let frac = d - whole as f32;

        // xm1 is the newer neighbour, x1/x2 the older ones. Below a delay of 2
        // there is no newer sample in the buffer, so extrapolate it.
        let x0 = self.at(whole);
        let x1 = self.at(whole + 1);
        let x2 = self.at(whole + 2);
        let xm1 = if whole >= 2 {
            self.at(whole - 1)
        } else {
            2.0 * x0 - x1
        };

        hermite(frac, xm1, x0, x1, x2)
    }

    /// Zeroes the buffer and rewinds the cursor. Keeps the allocation.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Buffer capacity in samples (0 before initialization).
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Largest delay [`read`](Self::read) honours without clamping.
    pub fn max_delay(&self) -> f32 {
        self.buffer.len().saturating_sub(MIN_CAPACITY) as f32
    }

    #[inline]
    fn at(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        self.buffer[(self.write_pos + len - delay % len) % len]
    }
}

/// 4-point, 3rd-order Hermite interpolation between `x0` (t = 0) and `x1` (t = 1).
#[inline]
fn hermite(t: f32, xm1: f32, x0: f32, x1: f32, x2: f32) -> f32 {
    let c1 = 0.5 * (x1 - xm1);
    let c2 = xm1 - 2.5 * x0 + 2.0 * x1 - 0.5 * x2;
    let c3 = 0.5 * (x2 - xm1) + 1.5 * (x0 - x1);
    ((c3 * t + c2) * t + c1) * t + x0
}
