//! Band-limited oscillator.
//!
//! PolyBLEP (Polynomial Band-Limited Step) smooths the jump in saw and square
//! waveforms over one sample on each side of the discontinuity. With
//! band-limiting disabled the naive waveform is produced unchanged, so the
//! aliasing it causes can be heard and measured.

use core::f64::consts::{PI, TAU};

use tonegraph_core::{
    DETUNE_RANGE_CENTS, HarmonicCoefficient, NodeKind, OCTAVE_RANGE, OscillatorNode, SignalNode,
    Waveform, pitch_ratio,
};

/// Frequency a new oscillator starts at.
pub const DEFAULT_FREQUENCY_HZ: f32 = 440.0;

/// Phase-accumulator oscillator with optional PolyBLEP correction.
///
/// The phase is kept in `f64` in `[0, 1)` and advances by
/// `actual_frequency / sample_rate` per sample, where
///
/// ```text
/// actual_frequency = frequency × 2^(octave + cents/1200)
/// ```
///
/// # Example
///
/// ```rust
/// use tonegraph_core::{OscillatorNode, SignalNode, Waveform};
/// use tonegraph_synth::PolyBlepOscillator;
///
/// let mut osc = PolyBlepOscillator::with_params(48000.0, Waveform::Saw, 220.0);
/// osc.set_octave_offset(1);
/// assert_eq!(osc.actual_frequency(), 440.0);
///
/// let sample = osc.process(0.0);
/// assert!(sample.abs() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct PolyBlepOscillator {
    phase: f64,
    phase_inc: f64,
    sample_rate: f32,
    frequency: f32,
    actual_frequency: f32,
    octave_offset: i32,
    detune_cents: f32,
    waveform: Waveform,
    band_limited: bool,
    last_output: f32,
}

impl Default for PolyBlepOscillator {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl PolyBlepOscillator {
    /// Band-limited sine at 440 Hz.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, Waveform::Sine, DEFAULT_FREQUENCY_HZ)
    }

    /// Band-limited oscillator with the given waveform and base frequency.
    pub fn with_params(sample_rate: f32, waveform: Waveform, frequency: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            phase_inc: 0.0,
            sample_rate,
            frequency: frequency.max(0.0),
            actual_frequency: frequency.max(0.0),
            octave_offset: 0,
            detune_cents: 0.0,
            waveform,
            band_limited: true,
            last_output: 0.0,
        };
        osc.update_actual_frequency();
        osc
    }

    /// Phase increment per sample.
    pub fn phase_increment(&self) -> f64 {
        self.phase_inc
    }

    fn update_actual_frequency(&mut self) {
        let ratio = pitch_ratio(
            f64::from(self.octave_offset),
            f64::from(self.detune_cents),
        );
        self.actual_frequency = (f64::from(self.frequency) * ratio) as f32;
        self.update_phase_increment();
    }

    fn update_phase_increment(&mut self) {
        if self.sample_rate > 0.0 {
            self.phase_inc = f64::from(self.actual_frequency) / f64::from(self.sample_rate);
        }
    }

    /// Evaluate the current waveform at the current phase.
    fn generate(&self) -> f64 {
        let t = self.phase;
        let dt = self.phase_inc;
        match (self.waveform, self.band_limited) {
            (Waveform::Sine, _) => libm::sin(TAU * t),
            (Waveform::Triangle, _) => {
                if t < 0.5 {
                    4.0 * t - 1.0
                } else {
                    3.0 - 4.0 * t
                }
            }
            (Waveform::Saw, false) => 2.0 * t - 1.0,
            (Waveform::Saw, true) => 2.0 * t - 1.0 - poly_blep(t, dt),
            (Waveform::Square, false) => square(t),
            (Waveform::Square, true) => {
                square(t) + poly_blep(t, dt) - poly_blep((t + 0.5) % 1.0, dt)
            }
        }
    }
}

#[inline]
fn square(t: f64) -> f64 {
    if t < 0.5 { 1.0 } else { -1.0 }
}

/// Two-sample polynomial band-limited step residual.
///
/// `t` is the phase in `[0, 1)`, `dt` the phase increment. Non-zero only
/// within `dt` of the wrap point.
#[inline]
pub fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

impl SignalNode for PolyBlepOscillator {
    /// Input is ignored.
    fn process(&mut self, _input: f32) -> f32 {
        let output = self.generate() as f32;
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            // phase_inc can exceed 1 above Nyquist
            self.phase = self.phase.fract();
        }
        self.last_output = output;
        output
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.last_output = 0.0;
    }

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.phase = 0.0;
        self.update_phase_increment();
    }

    fn last_output(&self) -> f32 {
        self.last_output
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "PolyBLEP Oscillator"
    }

    fn description(&self) -> &str {
        "Band-limited oscillator using Polynomial Band-Limited Step (PolyBLEP) correction"
    }

    fn processing_type(&self) -> &str {
        "Sound Source"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Oscillator
    }

    fn can_accept_input(&self) -> bool {
        false
    }

    /// Fourier series of the current waveform.
    fn equation(&self) -> Option<String> {
        let series = match self.waveform {
            Waveform::Sine => "x(t) = sin(ω₀t)",
            Waveform::Saw => "x(t) = (2/π) Σ_{k≥1} (-1)^(k+1)/k · sin(kω₀t)",
            Waveform::Square => "x(t) = (4/π) Σ_{k odd} 1/k · sin(kω₀t)",
            Waveform::Triangle => "x(t) = (8/π²) Σ_{k odd} (-1)^((k-1)/2)/k² · sin(kω₀t)",
        };
        Some(series.to_string())
    }

    fn as_oscillator(&self) -> Option<&dyn OscillatorNode> {
        Some(self)
    }

    fn as_oscillator_mut(&mut self) -> Option<&mut dyn OscillatorNode> {
        Some(self)
    }
}

impl OscillatorNode for PolyBlepOscillator {
    fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz.max(0.0);
        self.update_actual_frequency();
    }

    fn frequency(&self) -> f32 {
        self.frequency
    }

    fn actual_frequency(&self) -> f32 {
        self.actual_frequency
    }

    fn set_octave_offset(&mut self, octaves: i32) {
        self.octave_offset = octaves.clamp(OCTAVE_RANGE.0, OCTAVE_RANGE.1);
        self.update_actual_frequency();
    }

    fn octave_offset(&self) -> i32 {
        self.octave_offset
    }

    fn set_detune_cents(&mut self, cents: f32) {
        self.detune_cents = cents.clamp(DETUNE_RANGE_CENTS.0, DETUNE_RANGE_CENTS.1);
        self.update_actual_frequency();
    }

    fn detune_cents(&self) -> f32 {
        self.detune_cents
    }

    fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    fn waveform(&self) -> Waveform {
        self.waveform
    }

    fn set_band_limited(&mut self, enabled: bool) {
        self.band_limited = enabled;
    }

    fn is_band_limited(&self) -> bool {
        self.band_limited
    }

    fn set_phase(&mut self, phase: f64) {
        self.phase = phase.rem_euclid(1.0);
    }

    fn phase(&self) -> f64 {
        self.phase
    }

    fn theoretical_harmonics(&self, count: usize) -> Vec<HarmonicCoefficient> {
        let fundamental = f64::from(self.actual_frequency);
        (1..=count as u32)
            .map(|k| {
                let kf = f64::from(k);
                let odd = k % 2 == 1;
                let (magnitude, phase) = match self.waveform {
                    Waveform::Sine => (if k == 1 { 1.0 } else { 0.0 }, 0.0),
                    Waveform::Saw => (2.0 / (kf * PI), if odd { 0.0 } else { PI }),
                    Waveform::Square => (if odd { 4.0 / (kf * PI) } else { 0.0 }, 0.0),
                    Waveform::Triangle if odd => {
                        let flip = ((k - 1) / 2) % 2 == 1;
                        (8.0 / (kf * kf * PI * PI), if flip { PI } else { 0.0 })
                    }
                    Waveform::Triangle => (0.0, 0.0),
                };
                HarmonicCoefficient::new(k, fundamental, magnitude, phase)
            })
            .collect()
    }

    fn harmonic_description(&self) -> &'static str {
        match self.waveform {
            Waveform::Sine => "Pure tone: fundamental only, no harmonics",
            Waveform::Saw => "All harmonics (1, 2, 3, ...), amplitude falls as 1/k",
            Waveform::Square => "Odd harmonics only (1, 3, 5, ...), amplitude falls as 1/k",
            Waveform::Triangle => "Odd harmonics only (1, 3, 5, ...), amplitude falls as 1/k²",
        }
    }
}
