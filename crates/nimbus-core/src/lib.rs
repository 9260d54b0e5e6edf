//! Nimbus Core - DSP primitives for the reverb tail
//!
//! The building blocks shared by the feedback tank and the diffusion
//! chains. Everything here is allocation-free on the processing path:
//! buffers are sized once by `new`/`init` and only zeroed afterwards.
//!
//! # Delay & Diffusion
//!
//! - [`DelayLine`] - Circular buffer with cubic Hermite fractional reads
//! - [`AllpassDiffuser`] - Schroeder allpass stage with integer delay
//!
//! # Filters
//!
//! - [`OnePole`] / [`OnePoleHighpass`] - 6 dB/oct damping and DC removal
//! - [`coefficient`] - Shared lowpass coefficient for many filters at once
//!
//! # Modulation & Dynamics
//!
//! - [`LfoBank`] - Per-line sine oscillators with spread rates and phases
//! - [`Phasor`] - Phase accumulator in turns
//! - [`SeededRng`] / [`SmoothNoise`] - Owned, reproducible random sources
//! - [`EnvelopeFollower`] - Attack/release amplitude tracking
//!
//! # Utilities
//!
//! - [`flush_denormal`], [`soft_saturate`], [`db_to_linear`], [`ms_to_samples`], etc.
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! nimbus-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod allpass;
pub mod delay;
pub mod envelope;
pub mod lfo;
pub mod math;
pub mod noise;
pub mod one_pole;

pub use allpass::{AllpassDiffuser, MAX_ALLPASS_GAIN};
pub use delay::{DelayLine, MIN_CAPACITY, MIN_READ_DELAY};
pub use envelope::EnvelopeFollower;
pub use lfo::{LFO_BANK_SIZE, LfoBank, Phasor, wrap_turns};
pub use math::{
    DENORMAL_THRESHOLD, db_to_linear, flush_denormal, lerp, linear_to_db, ms_to_samples,
    samples_to_ms, soft_saturate,
};
pub use noise::{SeededRng, SmoothNoise};
pub use one_pole::{
    MAX_CUTOFF_RATIO, MIN_CUTOFF_HZ, OnePole, OnePoleHighpass, clamp_cutoff, coefficient,
};
