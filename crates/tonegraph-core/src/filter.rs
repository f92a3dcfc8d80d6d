//! Filter capability interface.

use core::fmt;
use core::str::FromStr;

use crate::node::ParseNameError;

/// Filter response type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// Passes frequencies below the cutoff.
    #[default]
    Lowpass,
    /// Passes frequencies above the cutoff.
    Highpass,
    /// Passes frequencies near the cutoff.
    Bandpass,
    /// Rejects frequencies near the cutoff.
    Notch,
}

impl FilterType {
    /// All filter types in display order.
    pub const ALL: [FilterType; 4] = [
        FilterType::Lowpass,
        FilterType::Highpass,
        FilterType::Bandpass,
        FilterType::Notch,
    ];

    /// Lowercase identifier, as accepted by [`FromStr`].
    pub const fn id(self) -> &'static str {
        match self {
            FilterType::Lowpass => "lowpass",
            FilterType::Highpass => "highpass",
            FilterType::Bandpass => "bandpass",
            FilterType::Notch => "notch",
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            FilterType::Lowpass => "Lowpass",
            FilterType::Highpass => "Highpass",
            FilterType::Bandpass => "Bandpass",
            FilterType::Notch => "Notch",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = ParseNameError;

    /// Case-insensitive; accepts `lp`/`hp`/`bp`/`br` abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowpass" | "lp" | "low" => Ok(FilterType::Lowpass),
            "highpass" | "hp" | "high" => Ok(FilterType::Highpass),
            "bandpass" | "bp" | "band" => Ok(FilterType::Bandpass),
            "notch" | "bandreject" | "br" => Ok(FilterType::Notch),
            _ => Err(ParseNameError::new("filter type", s)),
        }
    }
}

/// Domain operations of a filter node.
///
/// Reached through [`SignalNode::as_filter_mut`](crate::SignalNode::as_filter_mut).
/// Setters clamp; they never reject a value, even one that would make the
/// filter unstable. Stability is a diagnostic.
pub trait FilterNode {
    /// Set the cutoff frequency in Hz.
    fn set_cutoff(&mut self, hz: f32);
    /// Cutoff frequency in Hz after clamping.
    fn cutoff(&self) -> f32;
    /// Set the resonance (Q).
    fn set_resonance(&mut self, q: f32);
    /// Resonance after clamping.
    fn resonance(&self) -> f32;
    /// Select the response type.
    fn set_filter_type(&mut self, filter_type: FilterType);
    /// Current response type.
    fn filter_type(&self) -> FilterType;

    /// Number of poles.
    fn order(&self) -> usize {
        2
    }

    /// Asymptotic slope of the stop band.
    fn rolloff_db_per_octave(&self) -> f32 {
        6.0 * self.order() as f32
    }

    /// True when every pole lies strictly inside the unit circle.
    fn is_stable(&self) -> bool;

    /// Largest pole magnitude.
    fn pole_radius(&self) -> f64;

    /// Angle of the upper pole in radians (0 for real poles on the positive axis).
    fn pole_angle(&self) -> f64;
}
