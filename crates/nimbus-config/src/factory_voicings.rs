//! Factory voicings bundled with the library.
//!
//! Each voicing is an embedded TOML document that only lists what differs
//! from the defaults; everything else is filled in by serde.

use crate::Voicing;

/// Internal names of the factory voicings.
pub static FACTORY_VOICING_NAMES: &[&str] =
    &["room", "hall", "cathedral", "plate", "vintage", "sky"];

static FACTORY_VOICINGS_TOML: &[(&str, &str)] = &[
    ("room", ROOM_VOICING),
    ("hall", HALL_VOICING),
    ("cathedral", CATHEDRAL_VOICING),
    ("plate", PLATE_VOICING),
    ("vintage", VINTAGE_VOICING),
    ("sky", SKY_VOICING),
];

const ROOM_VOICING: &str = r#"
name = "Room"
description = "Small, bright room with a quick tail"
decay = 0.86

[tank]
delay_scale = 0.78
damping_hz = 11000.0
mod_depth_ms = 4.5
mod_rate_hz = 0.35
mod_depth_spread = [0.85, 1.15]
mod_rate_spread = [0.8, 1.2]

[tank.bands]
low = 1.02
high = 0.92

[diffusion]
input_stages = 5
input_g = 0.70
"#;

const HALL_VOICING: &str = r#"
name = "Hall"
description = "Concert hall: soft onset, lows linger, highs fall away"
decay = 0.93

[tank]
delay_scale = 1.15
damping_hz = 9000.0
mod_depth_ms = 4.5
mod_rate_hz = 0.18
mod_depth_spread = [0.85, 1.15]
mod_rate_spread = [0.8, 1.2]

[tank.bands]
low = 1.12
mid = 1.0
high = 0.86

[diffusion]
input_stages = 6
input_g = 0.68
late_min_g = 0.48
late_max_g = 0.74
"#;

const CATHEDRAL_VOICING: &str = r#"
name = "Cathedral"
description = "Very large stone space with a dark, long tail"
decay = 0.95

[tank]
delay_scale = 1.35
damping_hz = 7500.0
mod_depth_ms = 7.5
mod_rate_hz = 0.18
mod_depth_spread = [0.85, 1.15]
mod_rate_spread = [0.8, 1.2]

[tank.bands]
low = 1.12
high = 0.82

[diffusion]
input_stages = 7
input_g = 0.75
"#;

const PLATE_VOICING: &str = r#"
name = "Plate"
description = "Dense, bright plate"
decay = 0.90
tap_pattern = 3

[tank]
matrix = "hadamard"
delay_scale = 0.95
damping_hz = 12000.0
mod_depth_ms = 5.0
mod_rate_hz = 0.30
mod_depth_spread = [0.92, 1.08]
mod_rate_spread = [0.9, 1.1]

[tank.bands]
low = 1.0
high = 0.93

[diffusion]
input_stages = 7
input_g = 0.77
"#;

const VINTAGE_VOICING: &str = r#"
name = "Vintage"
description = "Darker, slower modulated hall in the style of early digital units"
decay = 0.90

[tank]
delay_scale = 1.05
damping_hz = 8200.0
mod_depth_ms = 6.0
mod_rate_hz = 0.16

[tank.bands]
low = 1.06
high = 0.86
"#;

const SKY_VOICING: &str = r#"
name = "Sky"
description = "Huge diffuse wash with a slowly rotating field"
decay = 0.95
width = 1.4
tap_morph = 0.35

[tank]
delay_scale = 1.20
damping_hz = 9000.0
mod_depth_ms = 8.0
mod_rate_hz = 0.14
modulation = "field_rotation"
mod_depth_spread = [0.75, 1.25]
mod_rate_spread = [0.7, 1.3]

[tank.bands]
low = 1.10
high = 0.84

[diffusion]
input_stages = 8
input_g = 0.78
late_amount = 0.7
"#;

/// Get all factory voicings.
pub fn factory_voicings() -> Vec<Voicing> {
    FACTORY_VOICINGS_TOML
        .iter()
        .filter_map(|(_, toml)| Voicing::from_toml_str(toml).ok())
        .collect()
}

/// Get a factory voicing by name (case-insensitive).
///
/// Matches either the internal name or the voicing's display name.
///
/// # Example
///
/// ```rust
/// use nimbus_config::get_factory_voicing;
///
/// let hall = get_factory_voicing("Hall").unwrap();
/// assert_eq!(hall.name, "Hall");
/// assert!(get_factory_voicing("nonexistent").is_none());
/// ```
pub fn get_factory_voicing(name: &str) -> Option<Voicing> {
    let name_lower = name.to_lowercase();
    FACTORY_VOICINGS_TOML
        .iter()
        .filter_map(|(key, toml)| Voicing::from_toml_str(toml).ok().map(|v| (key, v)))
        .find(|(key, v)| key.to_lowercase() == name_lower || v.name.to_lowercase() == name_lower)
        .map(|(_, v)| v)
}

/// Check if a name refers to a factory voicing.
pub fn is_factory_voicing(name: &str) -> bool {
    get_factory_voicing(name).is_some()
}
