//! Allpass diffuser stage for reverb density.
//!
//! A Schroeder allpass with an integer delay and a single coefficient:
//!
//! ```text
//! y[n]      = -g * x[n] + buf[n - d]
//! buf[n]    =  x[n] + g * y[n]
//! ```
//!
//! The magnitude response is flat; only phase is scrambled. Chains of these
//! turn sparse echoes into smooth texture before and after the tank.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::flush_denormal;

/// Coefficient limit; the stage is stable for `|g| < 1`.
pub const MAX_ALLPASS_GAIN: f32 = 0.99;

/// Single Schroeder allpass stage with its own buffer.
///
/// # Example
///
/// ```rust
/// use nimbus_core::AllpassDiffuser;
///
/// let mut ap = AllpassDiffuser::new(256);
/// ap.set_delay(113);
/// ap.set_gain(0.7);
///
/// let first = ap.process(1.0);
/// assert!((first + 0.7).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AllpassDiffuser {
    buffer: Vec<f32>,
    write_pos: usize,
    delay: usize,
    gain: f32,
}

impl AllpassDiffuser {
    /// Creates a stage whose delay may range up to `capacity - 1` samples.
    pub fn new(capacity: usize) -> Self {
        let mut stage = Self::default();
        stage.init(capacity);
        stage
    }

    /// (Re)allocates the buffer. Delay is reset to the longest available.
    pub fn init(&mut self, capacity: usize) {
        let capacity = capacity.max(2);
        self.buffer = vec![0.0; capacity];
        self.write_pos = 0;
        self.delay = capacity - 1;
    }

    /// Sets the delay in whole samples, clamped to `[1, capacity - 1]`.
    pub fn set_delay(&mut self, samples: usize) {
        let cap = self.buffer.len();
        self.delay = if cap < 2 { 0 } else { samples.clamp(1, cap - 1) };
    }

    /// Current delay in samples.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Sets the coefficient, clamped to `±MAX_ALLPASS_GAIN`.
    #[inline]
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(-MAX_ALLPASS_GAIN, MAX_ALLPASS_GAIN);
    }

    /// Current coefficient.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let len = self.buffer.len();
        if len < 2 {
            return x;
        }
        let read_pos = (self.write_pos + len - self.delay) % len;
        let y = -self.gain * x + self.buffer[read_pos];
        self.buffer[self.write_pos] = flush_denormal(x + self.gain * y);
        self.write_pos += 1;
        if self.write_pos == len {
            self.write_pos = 0;
        }
        y
    }

    /// Zeroes the buffer, keeping delay and coefficient.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Buffer capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
