//! Nimbus Tail - the late-reverb engine
//!
//! A feedback delay network ("tank") with RT60-anchored per-band decay,
//! surrounded by allpass diffusion and rendered to stereo through tap
//! patterns. All per-sample work is allocation-free; buffers are sized in
//! `init` and only zeroed afterwards.
//!
//! # Signal flow
//!
//! ```text
//! L/R in -> Diffusion::process_input -> StereoInjector / mono
//!        -> Tank::process_sample[_vec] -> render_tap_pattern
//!        -> Diffusion::process_late -> L/R out
//! ```
//!
//! # Modules
//!
//! - [`tank`] - The FDN itself: modulated reads, damping, band split, saturation
//! - [`decay`] - `decay01` to RT60 to per-line, per-band loop gains
//! - [`matrix`] - Hadamard and Householder mixing
//! - [`diffusion`] - Input and late allpass chains
//! - [`taps`] - Stereo tap patterns over the line outputs
//! - [`injection`] - Mid/side injection vectors
//!
//! # Example
//!
//! ```rust
//! use nimbus_core::LfoBank;
//! use nimbus_tail::{Diffusion, MAX_LINES, Tank, TankConfig, render_tap_pattern};
//!
//! let sr = 48000.0;
//! let mut tank = Tank::new();
//! tank.init(sr, (sr * 2.5) as usize, 7);
//! tank.set_config(TankConfig::for_sample_rate(sr));
//! let mut diffusion = Diffusion::new();
//! diffusion.init(sr, 7);
//! let mut lfo = LfoBank::new(MAX_LINES, sr);
//!
//! let (mut l, mut r) = (1.0, 1.0);
//! diffusion.process_input(&mut l, &mut r);
//! let mut y = [0.0; MAX_LINES];
//! tank.process_sample(0.5 * (l + r), 0.8, &mut lfo, &mut y);
//! let (mut out_l, mut out_r) = render_tap_pattern(&y, tank.config().lines, 0);
//! diffusion.process_late(&mut out_l, &mut out_r, 0.5);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod decay;
pub mod diffusion;
pub mod injection;
pub mod matrix;
pub mod tank;
pub mod taps;

/// Maximum number of delay lines in the tank.
pub const MAX_LINES: usize = 16;

pub use decay::{
    BAND_MUL_RANGE, BandGains, BandMultipliers, DecayModel, MAX_FEEDBACK_GAIN, RT60_MAX_S,
    RT60_MIN_S, decay_to_rt60, feedback_gain,
};
pub use diffusion::{
    DIFFUSION_G_RANGE, Diffusion, InputDiffusionConfig, LATE_BYPASS_THRESHOLD, LATE_STAGES,
    LateDiffusionConfig, MAX_INPUT_STAGES, STAGE_TIME_RANGE_MS,
};
pub use injection::StereoInjector;
pub use matrix::{MatrixType, hadamard_mix, householder_mix, mix};
pub use tank::{
    DAMPING_GLIDE_MS, DEFAULT_DELAYS_MS, DynamicDampingConfig, FieldRotationConfig, JitterConfig,
    MIN_TANK_CAPACITY, ModulationMode, Tank, TankConfig,
};
pub use taps::{TAP_PATTERN_COUNT, TapPattern, render_morphing_pattern, render_tap_pattern};
