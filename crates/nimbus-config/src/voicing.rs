//! Voicing file format and conversion into DSP configs.

use serde::{Deserialize, Serialize};
use std::path::Path;

use nimbus_tail::{
    BandMultipliers, DEFAULT_DELAYS_MS, DIFFUSION_G_RANGE, Diffusion, DynamicDampingConfig,
    FieldRotationConfig, InputDiffusionConfig, JitterConfig, LateDiffusionConfig,
    MAX_INPUT_STAGES, MAX_LINES, MatrixType, ModulationMode, StereoInjector, Tank, TankConfig,
};

use crate::error::ConfigError;

/// Feedback matrix selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixSetting {
    /// Walsh-Hadamard; power-of-two line counts only.
    Hadamard,
    /// Householder reflection.
    #[default]
    Householder,
}

impl From<MatrixSetting> for MatrixType {
    fn from(m: MatrixSetting) -> Self {
        match m {
            MatrixSetting::Hadamard => MatrixType::Hadamard,
            MatrixSetting::Householder => MatrixType::Householder,
        }
    }
}

impl From<MatrixType> for MatrixSetting {
    fn from(m: MatrixType) -> Self {
        match m {
            MatrixType::Hadamard => MatrixSetting::Hadamard,
            MatrixType::Householder => MatrixSetting::Householder,
        }
    }
}

/// Delay-read modulation source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModulationSetting {
    /// One LFO per line.
    #[default]
    PerLine,
    /// One rotating phase field shared by all lines.
    FieldRotation,
}

impl From<ModulationSetting> for ModulationMode {
    fn from(m: ModulationSetting) -> Self {
        match m {
            ModulationSetting::PerLine => ModulationMode::PerLine,
            ModulationSetting::FieldRotation => ModulationMode::FieldRotation,
        }
    }
}

impl From<ModulationMode> for ModulationSetting {
    fn from(m: ModulationMode) -> Self {
        match m {
            ModulationMode::PerLine => ModulationSetting::PerLine,
            ModulationMode::FieldRotation => ModulationSetting::FieldRotation,
        }
    }
}

/// RT60 multipliers per band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandSettings {
    /// Low band.
    pub low: f32,
    /// Mid band.
    pub mid: f32,
    /// High band.
    pub high: f32,
}

impl Default for BandSettings {
    fn default() -> Self {
        let m = BandMultipliers::default();
        Self {
            low: m.low,
            mid: m.mid,
            high: m.high,
        }
    }
}

impl From<BandSettings> for BandMultipliers {
    fn from(b: BandSettings) -> Self {
        BandMultipliers {
            low: b.low,
            mid: b.mid,
            high: b.high,
        }
    }
}

/// Random read jitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterSettings {
    /// Jitter on/off.
    pub enabled: bool,
    /// Jitter share of the modulation depth.
    pub amount: f32,
    /// Rate of new random targets.
    pub rate_hz: f32,
    /// Glide time toward each target.
    pub smooth_ms: f32,
}

impl Default for JitterSettings {
    fn default() -> Self {
        let j = JitterConfig::default();
        Self {
            enabled: j.enabled,
            amount: j.amount,
            rate_hz: j.rate_hz,
            smooth_ms: j.smooth_ms,
        }
    }
}

impl From<JitterSettings> for JitterConfig {
    fn from(j: JitterSettings) -> Self {
        JitterConfig {
            enabled: j.enabled,
            amount: j.amount,
            rate_hz: j.rate_hz,
            smooth_ms: j.smooth_ms,
        }
    }
}

/// Field-rotation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    /// Rotation speed of the shared phase.
    pub spin_hz: f32,
    /// Wander share of the modulation depth.
    pub wander_amount: f32,
    /// Rate of new wander targets.
    pub wander_rate_hz: f32,
    /// Wander glide time.
    pub wander_smooth_ms: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        let f = FieldRotationConfig::default();
        Self {
            spin_hz: f.spin_hz,
            wander_amount: f.wander_amount,
            wander_rate_hz: f.wander_rate_hz,
            wander_smooth_ms: f.wander_smooth_ms,
        }
    }
}

impl From<FieldSettings> for FieldRotationConfig {
    fn from(f: FieldSettings) -> Self {
        FieldRotationConfig {
            spin_hz: f.spin_hz,
            wander_amount: f.wander_amount,
            wander_rate_hz: f.wander_rate_hz,
            wander_smooth_ms: f.wander_smooth_ms,
        }
    }
}

/// Energy-dependent damping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicDampingSettings {
    /// Dynamic damping on/off.
    pub enabled: bool,
    /// Blend between static and dynamic cutoff.
    pub amount: f32,
    /// Cutoff at full tail energy.
    pub min_hz: f32,
    /// Cutoff at silence.
    pub max_hz: f32,
    /// Energy scaling before the mapping.
    pub sensitivity: f32,
    /// Envelope attack.
    pub attack_ms: f32,
    /// Envelope release.
    pub release_ms: f32,
}

impl Default for DynamicDampingSettings {
    fn default() -> Self {
        let d = DynamicDampingConfig::default();
        Self {
            enabled: d.enabled,
            amount: d.amount,
            min_hz: d.min_hz,
            max_hz: d.max_hz,
            sensitivity: d.sensitivity,
            attack_ms: d.attack_ms,
            release_ms: d.release_ms,
        }
    }
}

impl From<DynamicDampingSettings> for DynamicDampingConfig {
    fn from(d: DynamicDampingSettings) -> Self {
        DynamicDampingConfig {
            enabled: d.enabled,
            amount: d.amount,
            min_hz: d.min_hz,
            max_hz: d.max_hz,
            sensitivity: d.sensitivity,
            attack_ms: d.attack_ms,
            release_ms: d.release_ms,
        }
    }
}

/// Tank settings in physical units.
///
/// `delay_ms` may list fewer than `lines` entries; missing lines use the
/// default layout. Every delay is multiplied by `delay_scale`. Per-line
/// modulation multipliers spread linearly across the `*_spread` ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankSettings {
    /// Active line count.
    pub lines: usize,
    /// Feedback matrix.
    pub matrix: MatrixSetting,
    /// Scale applied to every delay time.
    pub delay_scale: f32,
    /// Feedback highpass cutoff.
    pub feedback_hp_hz: f32,
    /// Static damping cutoff.
    pub damping_hz: f32,
    /// Low / mid crossover.
    pub crossover_low_hz: f32,
    /// Mid / high crossover.
    pub crossover_high_hz: f32,
    /// Saturation drive.
    pub drive: f32,
    /// Saturated share of the feedback.
    pub saturation_mix: f32,
    /// Modulation depth.
    pub mod_depth_ms: f32,
    /// Base LFO rate.
    pub mod_rate_hz: f32,
    /// Modulation source.
    pub modulation: ModulationSetting,
    /// Nominal delay per line.
    pub delay_ms: Vec<f32>,
    /// Depth multiplier of the first and last line.
    pub mod_depth_spread: [f32; 2],
    /// Rate multiplier of the first and last line.
    pub mod_rate_spread: [f32; 2],
    /// RT60 multipliers per band.
    pub bands: BandSettings,
    /// Random read jitter.
    pub jitter: JitterSettings,
    /// Field-rotation parameters.
    pub field: FieldSettings,
    /// Energy-dependent damping.
    pub dynamic_damping: DynamicDampingSettings,
}

impl Default for TankSettings {
    fn default() -> Self {
        let cfg = TankConfig::default();
        Self {
            lines: cfg.lines,
            matrix: cfg.matrix.into(),
            delay_scale: 1.0,
            feedback_hp_hz: cfg.feedback_hp_hz,
            damping_hz: cfg.damping_hz,
            crossover_low_hz: cfg.crossover_low_hz,
            crossover_high_hz: cfg.crossover_high_hz,
            drive: cfg.drive,
            saturation_mix: cfg.saturation_mix,
            mod_depth_ms: 6.0,
            mod_rate_hz: cfg.mod_rate_hz,
            modulation: cfg.modulation.into(),
            delay_ms: DEFAULT_DELAYS_MS.to_vec(),
            mod_depth_spread: [cfg.mod_depth_mul[0], cfg.mod_depth_mul[MAX_LINES - 1]],
            mod_rate_spread: [cfg.mod_rate_mul[0], cfg.mod_rate_mul[MAX_LINES - 1]],
            bands: BandSettings::default(),
            jitter: JitterSettings::default(),
            field: FieldSettings::default(),
            dynamic_damping: DynamicDampingSettings::default(),
        }
    }
}

impl TankSettings {
    /// Converts to a clamped [`TankConfig`] for `sample_rate`.
    ///
    /// Values the tank would clamp are logged at `warn`.
    pub fn to_tank_config(&self, sample_rate: f32) -> TankConfig {
        let mut cfg = TankConfig::for_sample_rate(sample_rate);
        let to_samples = |ms: f32| ms * self.delay_scale * sample_rate / 1000.0;

        if self.delay_ms.len() > MAX_LINES {
            tracing::warn!(
                "voicing: {} delay times given, ignoring all past {MAX_LINES}",
                self.delay_ms.len()
            );
        }
        for (i, d) in cfg.delay_samples.iter_mut().enumerate() {
            let ms = self.delay_ms.get(i).copied().unwrap_or(DEFAULT_DELAYS_MS[i]);
            *d = to_samples(ms);
        }

        let spread = |range: [f32; 2], i: usize| {
            let t = i as f32 / (MAX_LINES - 1) as f32;
            range[0] + (range[1] - range[0]) * t
        };
        cfg.mod_depth_mul = core::array::from_fn(|i| spread(self.mod_depth_spread, i));
        cfg.mod_rate_mul = core::array::from_fn(|i| spread(self.mod_rate_spread, i));

        cfg.lines = self.lines;
        cfg.matrix = self.matrix.into();
        cfg.feedback_hp_hz = self.feedback_hp_hz;
        cfg.damping_hz = self.damping_hz;
        cfg.crossover_low_hz = self.crossover_low_hz;
        cfg.crossover_high_hz = self.crossover_high_hz;
        cfg.band_multipliers = self.bands.into();
        cfg.drive = self.drive;
        cfg.saturation_mix = self.saturation_mix;
        cfg.mod_depth_samples = self.mod_depth_ms * sample_rate / 1000.0;
        cfg.mod_rate_hz = self.mod_rate_hz;
        cfg.modulation = self.modulation.into();
        cfg.jitter = self.jitter.into();
        cfg.field = self.field.into();
        cfg.dynamic_damping = self.dynamic_damping.into();

        let clean = cfg.sanitized(sample_rate, f32::INFINITY);
        if clean != cfg {
            tracing::warn!("voicing: tank settings clamped into range at {sample_rate} Hz");
        }
        clean
    }

    fn floats(&self) -> Vec<(String, f32)> {
        let mut out = vec![
            ("tank.delay_scale".to_string(), self.delay_scale),
            ("tank.feedback_hp_hz".to_string(), self.feedback_hp_hz),
            ("tank.damping_hz".to_string(), self.damping_hz),
            ("tank.crossover_low_hz".to_string(), self.crossover_low_hz),
            ("tank.crossover_high_hz".to_string(), self.crossover_high_hz),
            ("tank.drive".to_string(), self.drive),
            ("tank.saturation_mix".to_string(), self.saturation_mix),
            ("tank.mod_depth_ms".to_string(), self.mod_depth_ms),
            ("tank.mod_rate_hz".to_string(), self.mod_rate_hz),
            ("tank.mod_depth_spread".to_string(), self.mod_depth_spread[0]),
            ("tank.mod_depth_spread".to_string(), self.mod_depth_spread[1]),
            ("tank.mod_rate_spread".to_string(), self.mod_rate_spread[0]),
            ("tank.mod_rate_spread".to_string(), self.mod_rate_spread[1]),
            ("tank.bands.low".to_string(), self.bands.low),
            ("tank.bands.mid".to_string(), self.bands.mid),
            ("tank.bands.high".to_string(), self.bands.high),
            ("tank.jitter.amount".to_string(), self.jitter.amount),
            ("tank.jitter.rate_hz".to_string(), self.jitter.rate_hz),
            ("tank.jitter.smooth_ms".to_string(), self.jitter.smooth_ms),
            ("tank.field.spin_hz".to_string(), self.field.spin_hz),
            ("tank.field.wander_amount".to_string(), self.field.wander_amount),
            ("tank.field.wander_rate_hz".to_string(), self.field.wander_rate_hz),
            ("tank.field.wander_smooth_ms".to_string(), self.field.wander_smooth_ms),
        ];
        let d = &self.dynamic_damping;
        out.extend([
            ("tank.dynamic_damping.amount".to_string(), d.amount),
            ("tank.dynamic_damping.min_hz".to_string(), d.min_hz),
            ("tank.dynamic_damping.max_hz".to_string(), d.max_hz),
            ("tank.dynamic_damping.sensitivity".to_string(), d.sensitivity),
            ("tank.dynamic_damping.attack_ms".to_string(), d.attack_ms),
            ("tank.dynamic_damping.release_ms".to_string(), d.release_ms),
        ]);
        out.extend(
            self.delay_ms
                .iter()
                .enumerate()
                .map(|(i, &ms)| (format!("tank.delay_ms[{i}]"), ms)),
        );
        out
    }
}

/// Diffusion settings.
///
/// Empty time lists keep the seed-derived defaults; shorter lists override
/// only the leading stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionSettings {
    /// Active input stages.
    pub input_stages: usize,
    /// Input allpass coefficient.
    pub input_g: f32,
    /// Late coefficient at zero amount.
    pub late_min_g: f32,
    /// Late coefficient at full amount.
    pub late_max_g: f32,
    /// Late crossfade amount.
    pub late_amount: f32,
    /// Input stage times, left.
    pub input_times_ms_left: Vec<f32>,
    /// Input stage times, right.
    pub input_times_ms_right: Vec<f32>,
    /// Late stage times, left.
    pub late_times_ms_left: Vec<f32>,
    /// Late stage times, right.
    pub late_times_ms_right: Vec<f32>,
}

impl Default for DiffusionSettings {
    fn default() -> Self {
        let input = InputDiffusionConfig::default();
        let late = LateDiffusionConfig::default();
        Self {
            input_stages: input.stages,
            input_g: input.g,
            late_min_g: late.min_g,
            late_max_g: late.max_g,
            late_amount: 0.5,
            input_times_ms_left: Vec::new(),
            input_times_ms_right: Vec::new(),
            late_times_ms_left: Vec::new(),
            late_times_ms_right: Vec::new(),
        }
    }
}

fn override_times(target: &mut [f32], given: &[f32], label: &str) {
    if given.len() > target.len() {
        tracing::warn!(
            "voicing: {} {label} times given, using the first {}",
            given.len(),
            target.len()
        );
    }
    for (t, &g) in target.iter_mut().zip(given) {
        *t = g;
    }
}

fn warn_g(label: &str, g: f32) {
    if !(DIFFUSION_G_RANGE.0..=DIFFUSION_G_RANGE.1).contains(&g) {
        tracing::warn!(
            "voicing: {label} {g} outside [{}, {}], clamped",
            DIFFUSION_G_RANGE.0,
            DIFFUSION_G_RANGE.1
        );
    }
}

impl DiffusionSettings {
    /// Input chain config on top of the defaults for `seed`.
    pub fn input_config(&self, seed: u32) -> InputDiffusionConfig {
        let mut cfg = InputDiffusionConfig::for_seed(seed);
        if self.input_stages > MAX_INPUT_STAGES {
            tracing::warn!(
                "voicing: {} input stages requested, clamped to {MAX_INPUT_STAGES}",
                self.input_stages
            );
        }
        warn_g("input_g", self.input_g);
        cfg.stages = self.input_stages;
        cfg.g = self.input_g;
        override_times(&mut cfg.times_ms_left, &self.input_times_ms_left, "input left");
        override_times(&mut cfg.times_ms_right, &self.input_times_ms_right, "input right");
        cfg
    }

    /// Late chain config on top of the defaults for `seed`.
    pub fn late_config(&self, seed: u32) -> LateDiffusionConfig {
        let mut cfg = LateDiffusionConfig::for_seed(seed);
        warn_g("late_min_g", self.late_min_g);
        warn_g("late_max_g", self.late_max_g);
        cfg.min_g = self.late_min_g;
        cfg.max_g = self.late_max_g;
        override_times(&mut cfg.times_ms_left, &self.late_times_ms_left, "late left");
        override_times(&mut cfg.times_ms_right, &self.late_times_ms_right, "late right");
        cfg
    }

    fn floats(&self) -> Vec<(String, f32)> {
        let mut out = vec![
            ("diffusion.input_g".to_string(), self.input_g),
            ("diffusion.late_min_g".to_string(), self.late_min_g),
            ("diffusion.late_max_g".to_string(), self.late_max_g),
            ("diffusion.late_amount".to_string(), self.late_amount),
        ];
        for (name, list) in [
            ("input_times_ms_left", &self.input_times_ms_left),
            ("input_times_ms_right", &self.input_times_ms_right),
            ("late_times_ms_left", &self.late_times_ms_left),
            ("late_times_ms_right", &self.late_times_ms_right),
        ] {
            out.extend(
                list.iter()
                    .enumerate()
                    .map(|(i, &ms)| (format!("diffusion.{name}[{i}]"), ms)),
            );
        }
        out
    }
}

/// A complete reverb voicing.
///
/// Stored as TOML; every field except `name` has a default, so partial
/// files load.
///
/// # TOML Format
///
/// ```toml
/// name = "Hall"
/// description = "Large concert hall"
/// seed = 1234
/// decay = 0.93
/// tap_pattern = 0
/// late_tap_pattern = 1
/// tap_morph = 0.25
///
/// [tank]
/// delay_scale = 1.15
/// mod_depth_ms = 4.5
/// mod_rate_hz = 0.18
///
/// [tank.bands]
/// low = 1.12
/// high = 0.86
///
/// [diffusion]
/// input_g = 0.68
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voicing {
    /// Display name.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Seed for the tank and diffusion random sources.
    #[serde(default = "default_seed")]
    pub seed: u32,

    /// Suggested `decay01`.
    #[serde(default = "default_decay")]
    pub decay: f32,

    /// Stereo injection width, `0..=2`.
    #[serde(default = "default_width")]
    pub width: f32,

    /// Primary tap pattern id.
    #[serde(default)]
    pub tap_pattern: i32,

    /// Tap pattern the output morphs toward.
    #[serde(default = "default_late_tap_pattern")]
    pub late_tap_pattern: i32,

    /// Morph between the two tap patterns, `0..=1`.
    #[serde(default)]
    pub tap_morph: f32,

    /// Tank settings.
    #[serde(default)]
    pub tank: TankSettings,

    /// Diffusion settings.
    #[serde(default)]
    pub diffusion: DiffusionSettings,
}

fn default_seed() -> u32 {
    1234
}

fn default_decay() -> f32 {
    0.92
}

fn default_width() -> f32 {
    1.0
}

fn default_late_tap_pattern() -> i32 {
    1
}

impl Default for Voicing {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Voicing {
    /// Create a voicing with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            seed: default_seed(),
            decay: default_decay(),
            width: default_width(),
            tap_pattern: 0,
            late_tap_pattern: default_late_tap_pattern(),
            tap_morph: 0.0,
            tank: TankSettings::default(),
            diffusion: DiffusionSettings::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse and validate a voicing from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let voicing: Voicing = toml::from_str(toml_str)?;
        voicing.validate()?;
        Ok(voicing)
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a voicing from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let voicing = Self::from_toml_str(&content)?;
        tracing::debug!("voicing '{}' loaded from {}", voicing.name, path.display());
        Ok(voicing)
    }

    /// Save the voicing to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Rejects non-finite numbers and over-long delay lists.
    ///
    /// Out-of-range but finite values are accepted; they are clamped when
    /// converted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tank.delay_ms.len() > MAX_LINES {
            return Err(ConfigError::TooManyLines {
                count: self.tank.delay_ms.len(),
                max: MAX_LINES,
            });
        }
        let top = [
            ("decay".to_string(), self.decay),
            ("width".to_string(), self.width),
            ("tap_morph".to_string(), self.tap_morph),
        ];
        top.into_iter()
            .chain(self.tank.floats())
            .chain(self.diffusion.floats())
            .find(|(_, v)| !v.is_finite())
            .map_or(Ok(()), |(field, v)| Err(ConfigError::non_finite(field, v)))
    }

    /// Tank config for `sample_rate`.
    pub fn to_tank_config(&self, sample_rate: f32) -> TankConfig {
        self.tank.to_tank_config(sample_rate)
    }

    /// Pushes this voicing into initialized processors.
    ///
    /// The tank config is built for the tank's own sample rate. Seeds only
    /// affect the diffusion times and the injector shuffle here; pass
    /// [`seed`](Self::seed) to `init` for the rest.
    pub fn apply(&self, tank: &mut Tank, diffusion: &mut Diffusion, injector: &mut StereoInjector) {
        tank.set_config(self.to_tank_config(tank.sample_rate()));
        diffusion.set_input_config(self.diffusion.input_config(self.seed));
        diffusion.set_late_config(self.diffusion.late_config(self.seed));
        injector.set_seed(self.seed);
        injector.set_width(self.width);
        tracing::debug!("voicing '{}' applied", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dsp_defaults() {
        let v = Voicing::new("x");
        let cfg = v.to_tank_config(48000.0);
        let reference = TankConfig::for_sample_rate(48000.0);
        assert_eq!(cfg.lines, reference.lines);
        assert_eq!(cfg.matrix, reference.matrix);
        assert_eq!(cfg.band_multipliers, reference.band_multipliers);
        for i in 0..MAX_LINES {
            assert!((cfg.delay_samples[i] - reference.delay_samples[i]).abs() < 1e-2);
            assert!((cfg.mod_depth_mul[i] - reference.mod_depth_mul[i]).abs() < 1e-5);
            assert!((cfg.mod_rate_mul[i] - reference.mod_rate_mul[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_partial_file_loads() {
        let v = Voicing::from_toml_str("name = \"Tiny\"\n[tank]\nlines = 8\n").unwrap();
        assert_eq!(v.name, "Tiny");
        assert_eq!(v.tank.lines, 8);
        assert_eq!(v.tank.damping_hz, TankSettings::default().damping_hz);
        assert_eq!(v.diffusion, DiffusionSettings::default());
        assert_eq!(v.late_tap_pattern, 1);
    }

    #[test]
    fn test_enum_names() {
        let v = Voicing::from_toml_str(
            "name = \"E\"\n[tank]\nmatrix = \"hadamard\"\nmodulation = \"field_rotation\"\n",
        )
        .unwrap();
        assert_eq!(v.tank.matrix, MatrixSetting::Hadamard);
        assert_eq!(v.tank.modulation, ModulationSetting::FieldRotation);
        let cfg = v.to_tank_config(44100.0);
        assert_eq!(cfg.matrix, MatrixType::Hadamard);
        assert_eq!(cfg.modulation, ModulationMode::FieldRotation);
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = Voicing::from_toml_str("name = \"N\"\n[tank]\ndamping_hz = nan\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::NonFinite { ref field, .. } if field == "tank.damping_hz"),
            "got {err}"
        );
        let err = Voicing::from_toml_str("name = \"N\"\ndecay = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { .. }));
    }

    #[test]
    fn test_too_many_delays_rejected() {
        let mut v = Voicing::new("long");
        v.tank.delay_ms = vec![30.0; MAX_LINES + 1];
        assert!(matches!(
            v.validate(),
            Err(ConfigError::TooManyLines { count: 17, max: 16 })
        ));
    }

    #[test]
    fn test_delay_scale_and_partial_delays() {
        let mut v = Voicing::new("s");
        v.tank.delay_scale = 2.0;
        v.tank.delay_ms = vec![10.0];
        let cfg = v.to_tank_config(48000.0);
        assert!((cfg.delay_samples[0] - 960.0).abs() < 1e-3);
        let expected = DEFAULT_DELAYS_MS[1] * 2.0 * 48.0;
        assert!((cfg.delay_samples[1] - expected).abs() < 1e-2);
    }

    #[test]
    fn test_out_of_range_is_clamped_not_rejected() {
        let mut v = Voicing::new("c");
        v.tank.lines = 99;
        v.tank.drive = 50.0;
        v.diffusion.input_stages = 20;
        v.diffusion.input_g = 0.99;
        v.validate().unwrap();

        let cfg = v.to_tank_config(48000.0);
        assert_eq!(cfg.lines, MAX_LINES);
        assert!(cfg.drive <= 10.0);

        let mut diffusion = Diffusion::new();
        diffusion.init(48000.0, v.seed);
        diffusion.set_input_config(v.diffusion.input_config(v.seed));
        assert_eq!(diffusion.active_input_stages(), MAX_INPUT_STAGES);
        assert_eq!(diffusion.input_config().g, DIFFUSION_G_RANGE.1);
    }

    #[test]
    fn test_time_overrides() {
        let mut d = DiffusionSettings::default();
        d.input_times_ms_left = vec![2.5, 3.5];
        d.late_times_ms_right = vec![9.0, 9.5, 10.0, 11.0];
        let input = d.input_config(7);
        let seeded = InputDiffusionConfig::for_seed(7);
        assert_eq!(input.times_ms_left[0], 2.5);
        assert_eq!(input.times_ms_left[1], 3.5);
        assert_eq!(input.times_ms_left[2], seeded.times_ms_left[2]);
        assert_eq!(input.times_ms_right, seeded.times_ms_right);
        assert_eq!(d.late_config(7).times_ms_right, [9.0, 9.5, 10.0]);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut v = Voicing::new("Round").with_description("trip");
        v.tank.modulation = ModulationSetting::FieldRotation;
        v.tank.bands.low = 1.2;
        v.diffusion.late_times_ms_left = vec![5.0];
        let s = v.to_toml_string().unwrap();
        let back = Voicing::from_toml_str(&s).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn test_apply_configures_processors() {
        let mut v = Voicing::new("apply");
        v.tank.lines = 8;
        v.width = 1.5;
        v.diffusion.input_stages = 3;

        let mut tank = Tank::new();
        tank.init(48000.0, 24000, v.seed);
        let mut diffusion = Diffusion::new();
        diffusion.init(48000.0, v.seed);
        let mut injector = StereoInjector::new(1);
        v.apply(&mut tank, &mut diffusion, &mut injector);

        assert_eq!(tank.config().lines, 8);
        assert_eq!(diffusion.active_input_stages(), 3);
        assert_eq!(injector.width(), 1.5);
    }
}
