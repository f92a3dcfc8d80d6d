//! Factory presets bundled with the tonegraph library.
//!
//! These graphs are always available without external files. They cover the
//! three classic teaching patches: a single subtractive voice, two detuned
//! oscillators through a mixer, and a filter driven by external input.

use crate::GraphConfig;

/// Array of factory preset names for external access.
pub static FACTORY_PRESET_NAMES: &[&str] = &["subtractive", "dual_osc", "filter_sweep"];

/// TOML content for factory presets.
static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("subtractive", SUBTRACTIVE_PRESET),
    ("dual_osc", DUAL_OSC_PRESET),
    ("filter_sweep", FILTER_SWEEP_PRESET),
];

/// Saw into a resonant lowpass.
const SUBTRACTIVE_PRESET: &str = r#"
name = "Subtractive"
description = "Band-limited saw through a resonant lowpass"
sample_rate = 44100
block_size = 512
output = "out"

[[nodes]]
type = "oscillator"
id = "osc"
subtype = "saw"
[nodes.params]
frequency = "110Hz"

[[nodes]]
type = "filter"
id = "lp"
subtype = "lowpass"
[nodes.params]
cutoff = "1.2kHz"
resonance = "2"

[[nodes]]
type = "output"
id = "out"

[[connections]]
source = "osc"
dest = "lp"

[[connections]]
source = "lp"
dest = "out"
"#;

/// Two detuned saws summed before the filter.
const DUAL_OSC_PRESET: &str = r#"
name = "Dual Osc"
description = "Two detuned saws mixed into a lowpass"
sample_rate = 44100
block_size = 512
output = "out"

[[nodes]]
type = "oscillator"
id = "osc1"
subtype = "saw"
[nodes.params]
frequency = "110Hz"
detune = "-7ct"

[[nodes]]
type = "oscillator"
id = "osc2"
subtype = "saw"
[nodes.params]
frequency = "110Hz"
detune = "7ct"

[[nodes]]
type = "mixer"
id = "mix"
num_inputs = 2
[nodes.params]
gain0 = "-6dB"
gain1 = "-6dB"

[[nodes]]
type = "filter"
id = "lp"
subtype = "lowpass"
[nodes.params]
cutoff = "2kHz"
resonance = "0.707"

[[nodes]]
type = "output"
id = "out"

[[connections]]
source = "osc1"
dest = "mix"
input = 0

[[connections]]
source = "osc2"
dest = "mix"
input = 1

[[connections]]
source = "mix"
dest = "lp"

[[connections]]
source = "lp"
dest = "out"
"#;

/// External input through a narrow bandpass.
const FILTER_SWEEP_PRESET: &str = r#"
name = "Filter Sweep"
description = "External input through a resonant bandpass"
sample_rate = 44100
block_size = 512
input = "bp"
output = "out"

[[nodes]]
type = "filter"
id = "bp"
subtype = "bandpass"
[nodes.params]
cutoff = "1kHz"
resonance = "4"

[[nodes]]
type = "output"
id = "out"

[[connections]]
source = "bp"
dest = "out"
"#;

/// Get all factory presets.
///
/// # Example
///
/// ```rust
/// use tonegraph_config::factory_presets;
///
/// for preset in factory_presets() {
///     println!("  - {}: {}", preset.name, preset.description.as_deref().unwrap_or(""));
/// }
/// ```
pub fn factory_presets() -> Vec<GraphConfig> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| GraphConfig::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by internal name or display name, case-insensitively.
///
/// ```rust
/// use tonegraph_config::get_factory_preset;
///
/// let preset = get_factory_preset("Dual Osc").unwrap();
/// assert_eq!(preset.nodes.len(), 5);
/// ```
pub fn get_factory_preset(name: &str) -> Option<GraphConfig> {
    let name_lower = name.trim().to_lowercase();

    for (preset_name, toml) in FACTORY_PRESETS_TOML {
        if *preset_name == name_lower {
            return GraphConfig::from_toml(toml).ok();
        }
    }

    factory_presets()
        .into_iter()
        .find(|p| p.name.to_lowercase() == name_lower)
}

/// Get the names of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// Check if a name refers to a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}
