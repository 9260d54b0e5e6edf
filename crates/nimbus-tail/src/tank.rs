//! Feedback delay network tank.
//!
//! Up to [`MAX_LINES`] modulated delay lines cross-coupled by an orthogonal
//! matrix. Every sample:
//!
//! 1. Read each line at its nominal delay plus LFO / jitter / wander
//!    modulation (never closer than [`MIN_READ_DELAY`]).
//! 2. Track tail energy with an envelope follower on the peak line output.
//! 3. Mix the read vector through the matrix; this is the tank output.
//! 4. Derive the damping cutoff (optionally energy-dependent, slowly glided)
//!    and compute one lowpass coefficient shared by every line.
//! 5. Refresh the RT60 gain table if `decay01` changed.
//! 6. Write back: highpass, damping, three-band split with per-band gains,
//!    optional soft saturation, plus the injection.
//!
//! # Example
//!
//! ```rust
//! use nimbus_core::LfoBank;
//! use nimbus_tail::{MAX_LINES, Tank, TankConfig};
//!
//! let sr = 48000.0;
//! let mut tank = Tank::new();
//! tank.init(sr, (sr * 2.5) as usize, 1234);
//! tank.set_config(TankConfig::for_sample_rate(sr));
//!
//! let mut lfo = LfoBank::new(MAX_LINES, sr);
//! let mut out = [0.0; MAX_LINES];
//! tank.process_sample(1.0, 0.8, &mut lfo, &mut out);
//! ```

use core::f32::consts::TAU;

use libm::{expf, sinf};
use nimbus_core::{
    DelayLine, EnvelopeFollower, LfoBank, MIN_READ_DELAY, OnePole, OnePoleHighpass, Phasor,
    SmoothNoise, clamp_cutoff, coefficient, flush_denormal, soft_saturate, wrap_turns,
};

use crate::decay::{BandGains, BandMultipliers, DecayModel};
use crate::matrix::{MatrixType, mix};
use crate::MAX_LINES;

/// Nominal delay times (ms) of the default layout, mutually detuned.
pub const DEFAULT_DELAYS_MS: [f32; MAX_LINES] = [
    29.7, 37.1, 41.1, 43.7, 53.9, 59.5, 61.7, 71.3, 79.9, 89.7, 97.3, 101.9, 107.9, 115.1, 123.7,
    131.9,
];

/// Smallest per-line buffer the tank allocates.
pub const MIN_TANK_CAPACITY: usize = 8;

/// Time constant of the damping-cutoff glide.
pub const DAMPING_GLIDE_MS: f32 = 60.0;

const DEFAULT_MOD_DEPTH_MS: f32 = 6.0;
const DEFAULT_MOD_RATE_HZ: f32 = 0.25;
const MAX_MOD_RATE_HZ: f32 = 20.0;
const MAX_DRIVE: f32 = 10.0;

/// Golden-ratio conjugate; spreads field phase offsets evenly for any N.
const FIELD_SPREAD: f32 = 0.618_034;
const JITTER_SEED_STEP: u32 = 0x9E37_79B9;
const WANDER_SEED_MIX: u32 = 0x85EB_CA6B;

/// How the delay reads are modulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModulationMode {
    /// One oscillator per line from the caller's [`LfoBank`].
    #[default]
    PerLine,
    /// One slowly rotating phase sampled at fixed per-line offsets, plus
    /// per-line wander noise.
    FieldRotation,
}

/// Smoothed random jitter added to each line's read position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterConfig {
    /// Turns jitter on or off.
    pub enabled: bool,
    /// Jitter depth as a fraction of the modulation depth.
    pub amount: f32,
    /// Rate at which new random targets are drawn.
    pub rate_hz: f32,
    /// Glide time between targets.
    pub smooth_ms: f32,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            amount: 0.35,
            rate_hz: 0.35,
            smooth_ms: 80.0,
        }
    }
}

/// Parameters of [`ModulationMode::FieldRotation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRotationConfig {
    /// Rotation speed of the shared phase.
    pub spin_hz: f32,
    /// Per-line drift depth as a fraction of the modulation depth.
    pub wander_amount: f32,
    /// Rate of the drift noise.
    pub wander_rate_hz: f32,
    /// Smoothing of the drift noise.
    pub wander_smooth_ms: f32,
}

impl Default for FieldRotationConfig {
    fn default() -> Self {
        Self {
            spin_hz: 0.045,
            wander_amount: 0.55,
            wander_rate_hz: 0.08,
            wander_smooth_ms: 500.0,
        }
    }
}

/// Energy-dependent damping: a louder tail gets a darker cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicDampingConfig {
    /// Turns dynamic damping on or off.
    pub enabled: bool,
    /// Blend between the static cutoff (0) and the dynamic one (1).
    pub amount: f32,
    /// Cutoff at full excitation.
    pub min_hz: f32,
    /// Cutoff when the tail is quiet.
    pub max_hz: f32,
    /// Scales the tail-energy proxy before mapping.
    pub sensitivity: f32,
    /// Envelope attack.
    pub attack_ms: f32,
    /// Envelope release.
    pub release_ms: f32,
}

impl Default for DynamicDampingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            amount: 0.65,
            min_hz: 3500.0,
            max_hz: 12000.0,
            sensitivity: 3.0,
            attack_ms: 12.0,
            release_ms: 280.0,
        }
    }
}

impl DynamicDampingConfig {
    /// Target damping cutoff for a given static cutoff and tail energy in `[0, 1]`.
    ///
    /// ```rust
    /// use nimbus_tail::DynamicDampingConfig;
    ///
    /// let dd = DynamicDampingConfig { amount: 1.0, ..Default::default() };
    /// assert_eq!(dd.cutoff_hz(9000.0, 0.0), dd.max_hz);
    /// assert_eq!(dd.cutoff_hz(9000.0, 1.0), dd.min_hz);
    /// ```
    pub fn cutoff_hz(&self, static_hz: f32, env01: f32) -> f32 {
        let e = (env01 * self.sensitivity).clamp(0.0, 1.0);
        let dynamic = self.max_hz + (self.min_hz - self.max_hz) * e;
        let amount = self.amount.clamp(0.0, 1.0);
        (1.0 - amount) * static_hz + amount * dynamic
    }
}

/// Complete tank configuration.
///
/// Build one with [`TankConfig::for_sample_rate`] and adjust fields; the
/// tank clamps everything into range in [`Tank::set_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct TankConfig {
    /// Active line count, `1..=MAX_LINES`.
    pub lines: usize,
    /// Feedback matrix.
    pub matrix: MatrixType,
    /// Nominal delay per line, in samples.
    pub delay_samples: [f32; MAX_LINES],
    /// Feedback highpass cutoff.
    pub feedback_hp_hz: f32,
    /// Static damping lowpass cutoff.
    pub damping_hz: f32,
    /// Low / mid crossover.
    pub crossover_low_hz: f32,
    /// Mid / high crossover.
    pub crossover_high_hz: f32,
    /// RT60 multipliers per band.
    pub band_multipliers: BandMultipliers,
    /// Saturation drive, `0..=10`.
    pub drive: f32,
    /// Saturated share of the feedback, `0..=1`.
    pub saturation_mix: f32,
    /// Modulation depth in samples.
    pub mod_depth_samples: f32,
    /// Base LFO rate.
    pub mod_rate_hz: f32,
    /// Per-line depth multipliers.
    pub mod_depth_mul: [f32; MAX_LINES],
    /// Per-line rate multipliers.
    pub mod_rate_mul: [f32; MAX_LINES],
    /// Modulation source.
    pub modulation: ModulationMode,
    /// Random read jitter.
    pub jitter: JitterConfig,
    /// Field-rotation parameters.
    pub field: FieldRotationConfig,
    /// Energy-dependent damping.
    pub dynamic_damping: DynamicDampingConfig,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self::for_sample_rate(48000.0)
    }
}

impl TankConfig {
    /// Default 16-line layout scaled to `sample_rate`.
    pub fn for_sample_rate(sample_rate: f32) -> Self {
        let ms = |v: f32| v * sample_rate / 1000.0;
        let t = |i: usize| i as f32 / (MAX_LINES - 1) as f32;
        Self {
            lines: MAX_LINES,
            matrix: MatrixType::Householder,
            delay_samples: core::array::from_fn(|i| ms(DEFAULT_DELAYS_MS[i])),
            feedback_hp_hz: 30.0,
            damping_hz: 9000.0,
            crossover_low_hz: 250.0,
            crossover_high_hz: 3500.0,
            band_multipliers: BandMultipliers::default(),
            drive: 1.2,
            saturation_mix: 0.25,
            mod_depth_samples: ms(DEFAULT_MOD_DEPTH_MS),
            mod_rate_hz: DEFAULT_MOD_RATE_HZ,
            mod_depth_mul: core::array::from_fn(|i| 0.85 + 0.25 * t(i)),
            mod_rate_mul: core::array::from_fn(|i| 0.60 + 0.30 * t(i)),
            modulation: ModulationMode::PerLine,
            jitter: JitterConfig::default(),
            field: FieldRotationConfig::default(),
            dynamic_damping: DynamicDampingConfig::default(),
        }
    }

    /// Returns a copy with every field clamped into its safe range.
    ///
    /// `max_delay` bounds the nominal delays (pass `f32::INFINITY` when the
    /// buffer size is not known yet).
    pub fn sanitized(&self, sample_rate: f32, max_delay: f32) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        let upper = max_delay.max(MIN_READ_DELAY);

        let mut c = self.clone();
        c.lines = c.lines.clamp(1, MAX_LINES);
        for d in c.delay_samples.iter_mut() {
            *d = finite_or(*d, MIN_READ_DELAY).clamp(MIN_READ_DELAY, upper);
        }
        c.feedback_hp_hz = clamp_cutoff(c.feedback_hp_hz, sample_rate);
        c.damping_hz = clamp_cutoff(c.damping_hz, sample_rate);
        c.crossover_low_hz = clamp_cutoff(c.crossover_low_hz, sample_rate);
        c.crossover_high_hz = clamp_cutoff(c.crossover_high_hz, sample_rate).max(c.crossover_low_hz);
        c.band_multipliers = c.band_multipliers.sanitized();
        c.drive = finite_or(c.drive, 0.0).clamp(0.0, MAX_DRIVE);
        c.saturation_mix = finite_or(c.saturation_mix, 0.0).clamp(0.0, 1.0);
        c.mod_depth_samples = finite_or(c.mod_depth_samples, 0.0).max(0.0);
        c.mod_rate_hz = finite_or(c.mod_rate_hz, 0.0).clamp(0.0, MAX_MOD_RATE_HZ);
        for m in c.mod_depth_mul.iter_mut().chain(c.mod_rate_mul.iter_mut()) {
            *m = finite_or(*m, 1.0).clamp(0.0, 4.0);
        }

        c.jitter.amount = finite_or(c.jitter.amount, 0.0).clamp(0.0, 2.0);
        c.field.spin_hz = finite_or(c.field.spin_hz, 0.0).clamp(0.0, MAX_MOD_RATE_HZ);
        c.field.wander_amount = finite_or(c.field.wander_amount, 0.0).clamp(0.0, 2.0);

        let dd = &mut c.dynamic_damping;
        dd.amount = finite_or(dd.amount, 0.0).clamp(0.0, 1.0);
        dd.min_hz = clamp_cutoff(dd.min_hz, sample_rate);
        dd.max_hz = clamp_cutoff(dd.max_hz, sample_rate);
        dd.sensitivity = finite_or(dd.sensitivity, 1.0).clamp(0.0, 100.0);
        dd.attack_ms = finite_or(dd.attack_ms, 12.0).max(0.1);
        dd.release_ms = finite_or(dd.release_ms, 280.0).max(0.1);
        c
    }
}

/// Everything one feedback line owns.
#[derive(Debug, Clone, Default)]
struct LineState {
    delay: DelayLine,
    highpass: OnePoleHighpass,
    damping: OnePole,
    split_low: OnePole,
    split_high: OnePole,
    jitter: SmoothNoise,
    wander: SmoothNoise,
    /// Fixed phase offset (turns) for field rotation.
    field_offset: f32,
    /// Nominal delay in seconds, for the RT60 table.
    delay_s: f32,
}

impl LineState {
    fn clear(&mut self) {
        self.delay.clear();
        self.highpass.reset();
        self.damping.reset();
        self.split_low.reset();
        self.split_high.reset();
        self.jitter.clear();
        self.wander.clear();
    }
}

/// The feedback delay network.
///
/// Uninitialized until [`init`](Self::init); every processing call before
/// that writes an all-zero output vector.
#[derive(Debug, Clone)]
pub struct Tank {
    lines: [LineState; MAX_LINES],
    config: TankConfig,
    sample_rate: f32,
    seed: u32,
    initialized: bool,
    envelope: EnvelopeFollower,
    env01: f32,
    /// Smoothed damping cutoff.
    damping_hz: f32,
    damping_glide: f32,
    field_phase: Phasor,
    decay: DecayModel,
}

impl Default for Tank {
    fn default() -> Self {
        Self::new()
    }
}

impl Tank {
    /// Creates an uninitialized tank with the default 48 kHz configuration.
    pub fn new() -> Self {
        let config = TankConfig::default();
        Self {
            lines: core::array::from_fn(|_| LineState::default()),
            damping_hz: config.damping_hz,
            config,
            sample_rate: 48000.0,
            seed: 1,
            initialized: false,
            envelope: EnvelopeFollower::default(),
            env01: 0.0,
            damping_glide: 0.0,
            field_phase: Phasor::default(),
            decay: DecayModel::default(),
        }
    }

    /// Allocates every line for `max_delay_samples` (at least 8) and resets state.
    ///
    /// A zero seed is replaced with 1. The current configuration is re-applied
    /// for the new sample rate.
    pub fn init(&mut self, sample_rate: f32, max_delay_samples: usize, seed: u32) {
        self.sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            48000.0
        };
        self.seed = if seed == 0 { 1 } else { seed };
        let capacity = max_delay_samples.max(MIN_TANK_CAPACITY);
        let sr = self.sample_rate;

        for (i, line) in self.lines.iter_mut().enumerate() {
            let k = (i as u32).wrapping_add(1);
            line.delay.init(capacity);
            line.highpass = OnePoleHighpass::new(sr, 30.0);
            line.damping = OnePole::new(sr, 9000.0);
            line.split_low = OnePole::new(sr, 250.0);
            line.split_high = OnePole::new(sr, 3500.0);
            line.jitter = SmoothNoise::new(sr, self.seed.wrapping_add(JITTER_SEED_STEP.wrapping_mul(k)));
            line.wander = SmoothNoise::new(sr, (self.seed ^ WANDER_SEED_MIX).wrapping_mul(k) | 1);
            line.field_offset = wrap_turns(i as f32 * FIELD_SPREAD);
        }

        self.envelope = EnvelopeFollower::new(sr);
        self.damping_glide = expf(-1.0 / (DAMPING_GLIDE_MS * 0.001 * sr));
        self.initialized = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("tank_init: sr={sr} capacity={capacity} seed={:#x}", self.seed);

        let config = self.config.clone();
        self.set_config(config);
        self.clear();
    }

    /// Flushes every delay line, filter, noise source and the envelope.
    ///
    /// Stays initialized; the next zero-injection sample reads silence.
    pub fn clear(&mut self) {
        for line in self.lines.iter_mut() {
            line.clear();
        }
        self.envelope.reset();
        self.env01 = 0.0;
        self.damping_hz = self.config.damping_hz;
        self.field_phase = Phasor::default();
    }

    /// Applies a configuration, clamping it into range.
    ///
    /// Safe to call between blocks; invalidates the RT60 gain table.
    pub fn set_config(&mut self, config: TankConfig) {
        let max_delay = if self.initialized {
            self.lines[0].delay.max_delay()
        } else {
            f32::INFINITY
        };
        let clean = config.sanitized(self.sample_rate, max_delay);

        #[cfg(feature = "tracing")]
        if clean.lines != config.lines {
            tracing::warn!(
                "tank_config: {} lines requested, clamped to {}",
                config.lines,
                clean.lines
            );
        }
        #[cfg(feature = "tracing")]
        if clean.delay_samples != config.delay_samples {
            tracing::warn!("tank_config: nominal delays clamped to [{MIN_READ_DELAY}, {max_delay}]");
        }

        let sr = self.sample_rate;
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.highpass.set_frequency(clean.feedback_hp_hz);
            line.damping.set_frequency(clean.damping_hz);
            line.split_low.set_frequency(clean.crossover_low_hz);
            line.split_high.set_frequency(clean.crossover_high_hz);
            line.jitter.set_rate_hz(clean.jitter.rate_hz);
            line.jitter.set_smooth_ms(clean.jitter.smooth_ms);
            line.wander.set_rate_hz(clean.field.wander_rate_hz);
            line.wander.set_smooth_ms(clean.field.wander_smooth_ms);
            line.delay_s = clean.delay_samples[i] / sr;
        }
        self.envelope.set_times_ms(
            clean.dynamic_damping.attack_ms,
            clean.dynamic_damping.release_ms,
        );
        if !self.initialized {
            self.damping_hz = clean.damping_hz;
        }
        self.config = clean;
        self.decay.invalidate();
    }

    /// Current (clamped) configuration.
    pub fn config(&self) -> &TankConfig {
        &self.config
    }

    /// True once [`init`](Self::init) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Tail-energy proxy in `[0, 1]`.
    pub fn env01(&self) -> f32 {
        self.env01
    }

    /// Per-line buffer capacity in samples (0 before init).
    pub fn capacity(&self) -> usize {
        self.lines[0].delay.capacity()
    }

    /// Sample rate set by the last [`init`](Self::init).
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current smoothed damping cutoff.
    pub fn damping_hz(&self) -> f32 {
        self.damping_hz
    }

    /// Cached loop gains of `line` for the last processed decay value.
    pub fn band_gains(&self, line: usize) -> BandGains {
        self.decay.gains(line)
    }

    /// Scalar injection: spreads `injection / N` over the active lines.
    #[inline]
    pub fn process_sample(
        &mut self,
        injection: f32,
        decay01: f32,
        lfo: &mut LfoBank,
        out: &mut [f32; MAX_LINES],
    ) {
        let n = self.config.lines;
        let per_line = injection / n as f32;
        let mut vector = [0.0; MAX_LINES];
        vector[..n].fill(per_line);
        self.process_sample_vec(&vector, decay01, lfo, out);
    }

    /// Runs one sample with a per-line injection vector.
    ///
    /// Only the first `lines` entries of `injection` are read; `out` receives
    /// the matrix-mixed line outputs and zeros beyond `lines`.
    ///
    /// In [`ModulationMode::PerLine`] each voice of `lfo` advances once per
    /// call. A bank with fewer voices than `lines` makes line `i` reuse voice
    /// `i % lfo.len()`.
    pub fn process_sample_vec(
        &mut self,
        injection: &[f32; MAX_LINES],
        decay01: f32,
        lfo: &mut LfoBank,
        out: &mut [f32; MAX_LINES],
    ) {
        out.fill(0.0);
        if !self.initialized {
            return;
        }

        let cfg = &self.config;
        let n = cfg.lines;
        let sr = self.sample_rate;
        let depth = cfg.mod_depth_samples;
        let jitter_scale = if cfg.jitter.enabled { cfg.jitter.amount } else { 0.0 };
        let field_phase = match cfg.modulation {
            ModulationMode::FieldRotation => Some(self.field_phase.advance(cfg.field.spin_hz, sr)),
            ModulationMode::PerLine => None,
        };

        // 1. modulated reads
        let voices = lfo.len();
        let mut y = [0.0f32; MAX_LINES];
        let mut osc_per_voice = [0.0f32; MAX_LINES];
        let mut peak = 0.0f32;
        for (i, line) in self.lines[..n].iter_mut().enumerate() {
            let (osc, wander) = match field_phase {
                Some(phase) => (
                    sinf(TAU * (phase + line.field_offset)),
                    cfg.field.wander_amount * line.wander.process(),
                ),
                // lines beyond the bank size share a voice already advanced this sample
                None if i >= voices => (osc_per_voice[i % voices], 0.0),
                None => {
                    let osc = lfo.process(i, cfg.mod_rate_hz * cfg.mod_rate_mul[i]);
                    osc_per_voice[i] = osc;
                    (osc, 0.0)
                }
            };
            let jitter = if cfg.jitter.enabled {
                line.jitter.process()
            } else {
                0.0
            };
            let offset = depth * (osc * cfg.mod_depth_mul[i] + jitter_scale * jitter + wander);
            let read = (cfg.delay_samples[i] + offset).max(MIN_READ_DELAY);
            y[i] = line.delay.read(read);
            peak = peak.max(y[i].abs());
        }

        // 2. tail energy
        let env = self.envelope.process(peak);
        self.env01 = (env * 2.0).clamp(0.0, 1.0);

        // 3. mix
        mix(&mut y, n, cfg.matrix);
        out[..n].copy_from_slice(&y[..n]);

        // 4. shared damping coefficient
        let target_hz = if cfg.dynamic_damping.enabled {
            cfg.dynamic_damping.cutoff_hz(cfg.damping_hz, self.env01)
        } else {
            cfg.damping_hz
        };
        self.damping_hz = target_hz + self.damping_glide * (self.damping_hz - target_hz);
        let damping_coeff = coefficient(self.damping_hz, sr);

        // 5. RT60 table
        let decay01 = if decay01.is_finite() {
            decay01.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut delays_s = [0.0f32; MAX_LINES];
        if self.decay.cached_decay() != Some(decay01) {
            for (d, line) in delays_s.iter_mut().zip(self.lines.iter()) {
                *d = line.delay_s;
            }
        }
        self.decay.update(decay01, &delays_s, n, cfg.band_multipliers);

        // 6. writeback
        for (i, line) in self.lines[..n].iter_mut().enumerate() {
            let fb = line.highpass.process(y[i]);
            line.damping.set_coeff(damping_coeff);
            let fb = line.damping.process(fb);

            let low = line.split_low.process(fb);
            let low_mid = line.split_high.process(fb);
            let mid = low_mid - low;
            let high = fb - low_mid;

            let g = self.decay.gains(i);
            let colored = low * g.low + mid * g.mid + high * g.high;
            let saturated = soft_saturate(colored, cfg.drive);
            let fb = colored + cfg.saturation_mix * (saturated - colored);

            line.delay.push(flush_denormal(injection[i] + fb));
        }
    }
}
