//! Oscillator capability interface.
//!
//! The concrete band-limited oscillator lives in `tonegraph-synth`; the core
//! only defines the controls the graph, the registry and the parameter
//! binding layer talk to.

use core::fmt;
use core::str::FromStr;

use crate::analysis::HarmonicCoefficient;
use crate::node::ParseNameError;

/// Octave offset range accepted by [`OscillatorNode::set_octave_offset`].
pub const OCTAVE_RANGE: (i32, i32) = (-2, 2);

/// Detune range in cents accepted by [`OscillatorNode::set_detune_cents`].
pub const DETUNE_RANGE_CENTS: (f32, f32) = (-100.0, 100.0);

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// Pure fundamental.
    #[default]
    Sine,
    /// All harmonics, falling as 1/k.
    Saw,
    /// Odd harmonics, falling as 1/k.
    Square,
    /// Odd harmonics, falling as 1/k².
    Triangle,
}

impl Waveform {
    /// All waveforms in display order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Triangle,
    ];

    /// Lowercase identifier, as accepted by [`FromStr`].
    pub const fn id(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Saw => "saw",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Saw => "Saw",
            Waveform::Square => "Square",
            Waveform::Triangle => "Triangle",
        }
    }

    /// True for waveforms with a jump discontinuity (saw, square).
    pub const fn is_discontinuous(self) -> bool {
        matches!(self, Waveform::Saw | Waveform::Square)
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Waveform::Sine),
            "saw" | "sawtooth" => Ok(Waveform::Saw),
            "square" | "sq" => Ok(Waveform::Square),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            _ => Err(ParseNameError::new("waveform", s)),
        }
    }
}

/// Domain operations of an oscillator node.
///
/// Reached through
/// [`SignalNode::as_oscillator_mut`](crate::SignalNode::as_oscillator_mut).
pub trait OscillatorNode {
    /// Set the base frequency in Hz.
    fn set_frequency(&mut self, hz: f32);
    /// Base frequency in Hz.
    fn frequency(&self) -> f32;
    /// `base × 2^(octave + cents/1200)`.
    fn actual_frequency(&self) -> f32;

    /// Octave offset, clamped to [`OCTAVE_RANGE`].
    fn set_octave_offset(&mut self, octaves: i32);
    /// Current octave offset.
    fn octave_offset(&self) -> i32;

    /// Detune in cents, clamped to [`DETUNE_RANGE_CENTS`].
    fn set_detune_cents(&mut self, cents: f32);
    /// Current detune in cents.
    fn detune_cents(&self) -> f32;

    /// Select the waveform.
    fn set_waveform(&mut self, waveform: Waveform);
    /// Current waveform.
    fn waveform(&self) -> Waveform;

    /// Toggle PolyBLEP correction on discontinuous waveforms.
    fn set_band_limited(&mut self, enabled: bool);
    /// Whether PolyBLEP correction is applied.
    fn is_band_limited(&self) -> bool;

    /// Set the phase accumulator, wrapped into `[0, 1)`.
    fn set_phase(&mut self, phase: f64);
    /// Current phase in `[0, 1)`.
    fn phase(&self) -> f64;
    /// Restart the cycle.
    fn reset_phase(&mut self) {
        self.set_phase(0.0);
    }

    /// Closed-form Fourier series of the current waveform at the actual
    /// frequency, harmonics `1..=count`.
    fn theoretical_harmonics(&self, count: usize) -> Vec<HarmonicCoefficient>;

    /// One-line description of the waveform's harmonic content.
    fn harmonic_description(&self) -> &'static str;
}
