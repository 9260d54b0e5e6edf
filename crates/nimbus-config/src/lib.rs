//! Voicing files for the nimbus reverb tail.
//!
//! A [`Voicing`] collects everything that defines the character of the tail
//! in physical units (milliseconds, hertz, multipliers) and converts it into
//! the sample-based configs of `nimbus-tail`.
//!
//! # Features
//!
//! - **TOML files**: load and save voicings; partial files fill in defaults
//! - **Validation**: non-finite numbers are rejected at load time, range
//!   problems are clamped and logged with `tracing`
//! - **Factory voicings**: room, hall, cathedral, plate, vintage and sky
//!
//! # Example
//!
//! ```rust,no_run
//! use nimbus_config::{Voicing, get_factory_voicing};
//! use nimbus_tail::{Diffusion, StereoInjector, Tank};
//!
//! let voicing = Voicing::load("my_hall.toml").unwrap();
//!
//! let mut tank = Tank::new();
//! tank.init(48000.0, 120_000, voicing.seed);
//! let mut diffusion = Diffusion::new();
//! diffusion.init(48000.0, voicing.seed);
//! let mut injector = StereoInjector::new(voicing.seed);
//! voicing.apply(&mut tank, &mut diffusion, &mut injector);
//!
//! let plate = get_factory_voicing("plate").unwrap();
//! plate.save("plate.toml").unwrap();
//! ```

mod error;
mod voicing;

/// Factory voicings bundled with the library.
pub mod factory_voicings;

pub use error::ConfigError;
pub use factory_voicings::{
    FACTORY_VOICING_NAMES, factory_voicings, get_factory_voicing, is_factory_voicing,
};
pub use voicing::{
    BandSettings, DiffusionSettings, DynamicDampingSettings, FieldSettings, JitterSettings,
    MatrixSetting, ModulationSetting, TankSettings, Voicing,
};
