//! Allpass diffusion chains around the tank.
//!
//! Two stereo chains of [`AllpassDiffuser`] stages:
//!
//! - **Input** (up to [`MAX_INPUT_STAGES`]): smears the signal before it is
//!   injected into the tank. Its coefficient can be driven from outside
//!   every block through [`Diffusion::set_time_varying_g`].
//! - **Late** (exactly [`LATE_STAGES`]): softens the rendered tail, applied
//!   as a dry/diffused crossfade.
//!
//! Left and right stage times differ by small seed-derived offsets so the
//! channels decorrelate.

use nimbus_core::{AllpassDiffuser, ms_to_samples};

/// Input chain length.
pub const MAX_INPUT_STAGES: usize = 8;
/// Late chain length.
pub const LATE_STAGES: usize = 3;
/// Range of every coefficient used inside the chains.
pub const DIFFUSION_G_RANGE: (f32, f32) = (0.25, 0.85);
/// Range of stage times in milliseconds.
pub const STAGE_TIME_RANGE_MS: (f32, f32) = (0.1, 30.0);
/// Late amounts at or below this bypass the late chain.
pub const LATE_BYPASS_THRESHOLD: f32 = 1e-4;

const INPUT_BASE_MS: [f32; MAX_INPUT_STAGES] = [1.2, 2.1, 3.7, 5.9, 8.6, 12.1, 16.4, 20.0];
const LATE_BASE_MS_LEFT: [f32; LATE_STAGES] = [4.2, 7.3, 11.5];
const LATE_BASE_MS_RIGHT: [f32; LATE_STAGES] = [4.8, 6.9, 12.1];

/// Per-seed millisecond offsets `(a, b)` used to detune left against right.
fn seed_offsets(seed: u32) -> (f32, f32) {
    let s = (seed % 1000) as f32 / 1000.0;
    (0.08 + 0.10 * s, 0.11 + 0.12 * (1.0 - s))
}

fn clamp_g(g: f32) -> f32 {
    if g.is_finite() {
        g.clamp(DIFFUSION_G_RANGE.0, DIFFUSION_G_RANGE.1)
    } else {
        DIFFUSION_G_RANGE.0
    }
}

fn clamp_time(ms: f32, fallback: f32) -> f32 {
    let ms = if ms.is_finite() { ms } else { fallback };
    ms.clamp(STAGE_TIME_RANGE_MS.0, STAGE_TIME_RANGE_MS.1)
}

/// Input chain settings.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDiffusionConfig {
    /// Active stages, `0..=MAX_INPUT_STAGES`.
    pub stages: usize,
    /// Allpass coefficient.
    pub g: f32,
    /// Left stage times.
    pub times_ms_left: [f32; MAX_INPUT_STAGES],
    /// Right stage times.
    pub times_ms_right: [f32; MAX_INPUT_STAGES],
}

impl Default for InputDiffusionConfig {
    fn default() -> Self {
        Self::for_seed(0)
    }
}

impl InputDiffusionConfig {
    /// Default six-stage chain with seed-detuned times.
    pub fn for_seed(seed: u32) -> Self {
        let (a, b) = seed_offsets(seed);
        Self {
            stages: 6,
            g: 0.72,
            times_ms_left: core::array::from_fn(|i| {
                INPUT_BASE_MS[i] + if i % 2 == 1 { a } else { b }
            }),
            times_ms_right: core::array::from_fn(|i| {
                INPUT_BASE_MS[i] + if i % 2 == 1 { b } else { a }
            }),
        }
    }

    fn sanitized(&self) -> Self {
        Self {
            stages: self.stages.min(MAX_INPUT_STAGES),
            g: clamp_g(self.g),
            times_ms_left: core::array::from_fn(|i| {
                clamp_time(self.times_ms_left[i], INPUT_BASE_MS[i])
            }),
            times_ms_right: core::array::from_fn(|i| {
                clamp_time(self.times_ms_right[i], INPUT_BASE_MS[i])
            }),
        }
    }
}

/// Late chain settings.
///
/// The coefficient follows the late amount: `min_g` at amount 0, `max_g`
/// at amount 1.
#[derive(Debug, Clone, PartialEq)]
pub struct LateDiffusionConfig {
    /// Coefficient at zero amount.
    pub min_g: f32,
    /// Coefficient at full amount.
    pub max_g: f32,
    /// Left stage times.
    pub times_ms_left: [f32; LATE_STAGES],
    /// Right stage times.
    pub times_ms_right: [f32; LATE_STAGES],
}

impl Default for LateDiffusionConfig {
    fn default() -> Self {
        Self::for_seed(0)
    }
}

impl LateDiffusionConfig {
    /// Default late chain with seed-detuned times.
    pub fn for_seed(seed: u32) -> Self {
        let (a, b) = seed_offsets(seed);
        Self {
            min_g: 0.45,
            max_g: 0.72,
            times_ms_left: [
                LATE_BASE_MS_LEFT[0] + a,
                LATE_BASE_MS_LEFT[1] + b,
                LATE_BASE_MS_LEFT[2] + a,
            ],
            times_ms_right: [
                LATE_BASE_MS_RIGHT[0] + b,
                LATE_BASE_MS_RIGHT[1] + a,
                LATE_BASE_MS_RIGHT[2] + b,
            ],
        }
    }

    fn sanitized(&self) -> Self {
        Self {
            min_g: clamp_g(self.min_g),
            max_g: clamp_g(self.max_g),
            times_ms_left: core::array::from_fn(|i| {
                clamp_time(self.times_ms_left[i], LATE_BASE_MS_LEFT[i])
            }),
            times_ms_right: core::array::from_fn(|i| {
                clamp_time(self.times_ms_right[i], LATE_BASE_MS_RIGHT[i])
            }),
        }
    }

    /// Coefficient for a late amount in `[0, 1]`.
    pub fn g_for_amount(&self, amount01: f32) -> f32 {
        clamp_g(self.min_g + (self.max_g - self.min_g) * amount01.clamp(0.0, 1.0))
    }
}

/// Stereo input and late diffusion chains.
///
/// # Example
///
/// ```rust
/// use nimbus_tail::Diffusion;
///
/// let mut diff = Diffusion::new();
/// diff.init(48000.0, 1234);
///
/// let (mut l, mut r) = (1.0, 1.0);
/// diff.process_input(&mut l, &mut r);
/// diff.process_late(&mut l, &mut r, 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Diffusion {
    input_left: [AllpassDiffuser; MAX_INPUT_STAGES],
    input_right: [AllpassDiffuser; MAX_INPUT_STAGES],
    late_left: [AllpassDiffuser; LATE_STAGES],
    late_right: [AllpassDiffuser; LATE_STAGES],
    input_config: InputDiffusionConfig,
    late_config: LateDiffusionConfig,
    sample_rate: f32,
    time_varying_g: f32,
    late_bypassed: bool,
    initialized: bool,
}

impl Default for Diffusion {
    fn default() -> Self {
        Self::new()
    }
}

impl Diffusion {
    /// Creates unallocated chains; processing is a pass-through until [`init`](Self::init).
    pub fn new() -> Self {
        let input_config = InputDiffusionConfig::default();
        Self {
            input_left: core::array::from_fn(|_| AllpassDiffuser::default()),
            input_right: core::array::from_fn(|_| AllpassDiffuser::default()),
            late_left: core::array::from_fn(|_| AllpassDiffuser::default()),
            late_right: core::array::from_fn(|_| AllpassDiffuser::default()),
            time_varying_g: input_config.g,
            input_config,
            late_config: LateDiffusionConfig::default(),
            sample_rate: 48000.0,
            late_bypassed: true,
            initialized: false,
        }
    }

    /// Allocates every stage for 30 ms and loads the seed-detuned defaults.
    pub fn init(&mut self, sample_rate: f32, seed: u32) {
        self.sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            48000.0
        };
        let capacity = (ms_to_samples(STAGE_TIME_RANGE_MS.1, self.sample_rate) as usize).max(16) + 1;
        for stage in self
            .input_left
            .iter_mut()
            .chain(self.input_right.iter_mut())
            .chain(self.late_left.iter_mut())
            .chain(self.late_right.iter_mut())
        {
            stage.init(capacity);
        }
        self.initialized = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("diffusion_init: sr={} capacity={capacity} seed={seed}", self.sample_rate);

        self.set_input_config(InputDiffusionConfig::for_seed(seed));
        self.set_late_config(LateDiffusionConfig::for_seed(seed));
        self.clear();
    }

    /// Zeroes every stage buffer.
    pub fn clear(&mut self) {
        for stage in self
            .input_left
            .iter_mut()
            .chain(self.input_right.iter_mut())
            .chain(self.late_left.iter_mut())
            .chain(self.late_right.iter_mut())
        {
            stage.clear();
        }
        self.late_bypassed = true;
    }

    /// Applies input-chain settings. Also resets the time-varying coefficient to `config.g`.
    pub fn set_input_config(&mut self, config: InputDiffusionConfig) {
        let clean = config.sanitized();

        #[cfg(feature = "tracing")]
        if clean != config {
            tracing::warn!("diffusion_input: config clamped ({} stages, g={})", clean.stages, clean.g);
        }

        let sr = self.sample_rate;
        for i in 0..MAX_INPUT_STAGES {
            self.input_left[i].set_delay(ms_to_samples(clean.times_ms_left[i], sr).round() as usize);
            self.input_right[i].set_delay(ms_to_samples(clean.times_ms_right[i], sr).round() as usize);
            self.input_left[i].set_gain(clean.g);
            self.input_right[i].set_gain(clean.g);
        }
        self.time_varying_g = clean.g;
        self.input_config = clean;
    }

    /// Applies late-chain settings.
    pub fn set_late_config(&mut self, config: LateDiffusionConfig) {
        let clean = config.sanitized();

        #[cfg(feature = "tracing")]
        if clean != config {
            tracing::warn!("diffusion_late: config clamped (g {}..{})", clean.min_g, clean.max_g);
        }

        let sr = self.sample_rate;
        for i in 0..LATE_STAGES {
            self.late_left[i].set_delay(ms_to_samples(clean.times_ms_left[i], sr).round() as usize);
            self.late_right[i].set_delay(ms_to_samples(clean.times_ms_right[i], sr).round() as usize);
            self.late_left[i].set_gain(clean.max_g);
            self.late_right[i].set_gain(clean.max_g);
        }
        self.late_config = clean;
    }

    /// Current input settings.
    pub fn input_config(&self) -> &InputDiffusionConfig {
        &self.input_config
    }

    /// Current late settings.
    pub fn late_config(&self) -> &LateDiffusionConfig {
        &self.late_config
    }

    /// Overrides the input coefficient until the next [`set_input_config`](Self::set_input_config).
    ///
    /// Clamped to [`DIFFUSION_G_RANGE`] when applied.
    pub fn set_time_varying_g(&mut self, g: f32) {
        self.time_varying_g = clamp_g(g);
    }

    /// Input coefficient currently in use.
    pub fn time_varying_g(&self) -> f32 {
        self.time_varying_g
    }

    /// Number of input stages that run.
    pub fn active_input_stages(&self) -> usize {
        self.input_config.stages
    }

    /// True once [`init`](Self::init) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Runs the input chain in place.
    #[inline]
    pub fn process_input(&mut self, left: &mut f32, right: &mut f32) {
        let stages = self.input_config.stages;
        if !self.initialized || stages == 0 {
            return;
        }
        let g = self.time_varying_g;
        let (mut l, mut r) = (*left, *right);
        for (sl, sr) in self.input_left[..stages]
            .iter_mut()
            .zip(self.input_right[..stages].iter_mut())
        {
            sl.set_gain(g);
            sr.set_gain(g);
            l = sl.process(l);
            r = sr.process(r);
        }
        *left = l;
        *right = r;
    }

    /// Runs the late chain in place, crossfaded by `amount01`.
    ///
    /// Amounts at or below [`LATE_BYPASS_THRESHOLD`] leave the signal untouched
    /// and flush the chain once so no stale tail returns later.
    #[inline]
    pub fn process_late(&mut self, left: &mut f32, right: &mut f32, amount01: f32) {
        if !self.initialized {
            return;
        }
        let amount = if amount01.is_finite() {
            amount01.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if amount <= LATE_BYPASS_THRESHOLD {
            if !self.late_bypassed {
                for stage in self.late_left.iter_mut().chain(self.late_right.iter_mut()) {
                    stage.clear();
                }
                self.late_bypassed = true;
            }
            return;
        }
        self.late_bypassed = false;

        let g = self.late_config.g_for_amount(amount);
        let (mut dl, mut dr) = (*left, *right);
        for (sl, sr) in self.late_left.iter_mut().zip(self.late_right.iter_mut()) {
            sl.set_gain(g);
            sr.set_gain(g);
            dl = sl.process(dl);
            dr = sr.process(dr);
        }
        *left += amount * (dl - *left);
        *right += amount * (dr - *right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(seed: u32) -> Diffusion {
        let mut d = Diffusion::new();
        d.init(48000.0, seed);
        d
    }

    #[test]
    fn test_uninitialized_passes_through() {
        let mut d = Diffusion::new();
        let (mut l, mut r) = (0.3, -0.7);
        d.process_input(&mut l, &mut r);
        d.process_late(&mut l, &mut r, 1.0);
        assert_eq!((l, r), (0.3, -0.7));
    }

    #[test]
    fn test_left_right_times_differ() {
        let d = ready(1234);
        let c = d.input_config();
        for i in 0..MAX_INPUT_STAGES {
            assert_ne!(c.times_ms_left[i], c.times_ms_right[i]);
        }
        let l = d.late_config();
        for i in 0..LATE_STAGES {
            assert_ne!(l.times_ms_left[i], l.times_ms_right[i]);
        }
    }

    #[test]
    fn test_stage_count_clamped() {
        let mut d = ready(1);
        let mut cfg = d.input_config().clone();
        cfg.stages = 40;
        d.set_input_config(cfg);
        assert_eq!(d.active_input_stages(), MAX_INPUT_STAGES);
    }

    #[test]
    fn test_time_varying_g_clamped() {
        let mut d = ready(1);
        d.set_time_varying_g(0.99);
        assert_eq!(d.time_varying_g(), DIFFUSION_G_RANGE.1);
        d.set_time_varying_g(0.0);
        assert_eq!(d.time_varying_g(), DIFFUSION_G_RANGE.0);
    }

    #[test]
    fn test_set_input_config_resets_g() {
        let mut d = ready(1);
        d.set_time_varying_g(0.3);
        let cfg = d.input_config().clone();
        d.set_input_config(cfg);
        assert_eq!(d.time_varying_g(), 0.72);
    }

    #[test]
    fn test_zero_stages_is_identity() {
        let mut d = ready(9);
        let mut cfg = d.input_config().clone();
        cfg.stages = 0;
        d.set_input_config(cfg);
        let (mut l, mut r) = (0.5, 0.25);
        d.process_input(&mut l, &mut r);
        assert_eq!((l, r), (0.5, 0.25));
    }

    #[test]
    fn test_input_chain_preserves_energy() {
        let mut d = ready(77);
        let (mut el, mut er) = (0.0f32, 0.0f32);
        for n in 0..96000 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            let (mut l, mut r) = (x, x);
            d.process_input(&mut l, &mut r);
            el += l * l;
            er += r * r;
        }
        assert!((el - 1.0).abs() < 1e-2, "left energy {el}");
        assert!((er - 1.0).abs() < 1e-2, "right energy {er}");
    }

    #[test]
    fn test_channels_decorrelated() {
        let mut d = ready(500);
        let mut same = true;
        for n in 0..4800 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            let (mut l, mut r) = (x, x);
            d.process_input(&mut l, &mut r);
            if (l - r).abs() > 1e-6 {
                same = false;
            }
        }
        assert!(!same);
    }

    #[test]
    fn test_late_bypass_is_exact() {
        let mut d = ready(3);
        let (mut l, mut r) = (0.4, -0.2);
        d.process_late(&mut l, &mut r, 0.0);
        assert_eq!((l, r), (0.4, -0.2));
        d.process_late(&mut l, &mut r, 5e-5);
        assert_eq!((l, r), (0.4, -0.2));
    }

    #[test]
    fn test_late_bypass_flushes_chain() {
        let mut d = ready(3);
        for _ in 0..1000 {
            let (mut l, mut r) = (0.5, 0.5);
            d.process_late(&mut l, &mut r, 1.0);
        }
        let (mut l, mut r) = (0.0, 0.0);
        d.process_late(&mut l, &mut r, 0.0);
        let (mut l, mut r) = (0.0, 0.0);
        d.process_late(&mut l, &mut r, 1.0);
        assert_eq!((l, r), (0.0, 0.0));
    }

    #[test]
    fn test_late_g_follows_amount() {
        let cfg = LateDiffusionConfig::default();
        assert!((cfg.g_for_amount(0.0) - 0.45).abs() < 1e-6);
        assert!((cfg.g_for_amount(1.0) - 0.72).abs() < 1e-6);
        assert!(cfg.g_for_amount(0.5) > 0.45 && cfg.g_for_amount(0.5) < 0.72);
    }

    #[test]
    fn test_late_crossfade_small_amount_is_close_to_dry() {
        let mut d = ready(3);
        let (mut l, mut r) = (1.0, 1.0);
        d.process_late(&mut l, &mut r, 0.01);
        // first diffused sample is -g^3-ish, so the blend moves only slightly
        assert!((l - 1.0).abs() < 0.05);
        assert!((r - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_times_clamped() {
        let mut d = ready(1);
        let mut cfg = d.late_config().clone();
        cfg.times_ms_left = [500.0, f32::NAN, -1.0];
        d.set_late_config(cfg);
        let c = d.late_config();
        assert_eq!(c.times_ms_left[0], STAGE_TIME_RANGE_MS.1);
        assert_eq!(c.times_ms_left[1], LATE_BASE_MS_LEFT[1]);
        assert_eq!(c.times_ms_left[2], STAGE_TIME_RANGE_MS.0);
    }
}
