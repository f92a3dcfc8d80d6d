//! State Variable Filter node.
//!
//! A two-pole filter offering lowpass, highpass, bandpass, and notch responses
//! from one set of integrators, with exact z-domain introspection.
//!
//! # Topology
//!
//! Implements the Topology-Preserving Transform (TPT) SVF after Zavalishin,
//! "The Art of VA Filter Design" (2012). Trapezoidal integrators preserve the
//! analog prototype's response under bilinear warping, and cutoff can be swept
//! without the artifacts of Direct Form biquads.
//!
//! # Analysis
//!
//! With `g = tan(π·fc/fs)`, `k = 1/Q` and `a0 = 1 + g·k + g²`, the four
//! outputs of [`process`](SignalNode::process) have the exact transfer functions
//!
//! ```text
//! denominator : 1 + ((2g² − 2)/a0)·z⁻¹ + ((1 − g·k + g²)/a0)·z⁻²
//! lowpass     : g²·(1 + 2z⁻¹ + z⁻²) / a0
//! highpass    :    (1 − 2z⁻¹ + z⁻²) / a0
//! bandpass    : g ·(1       − z⁻²) / a0
//! notch       : ((1 + g²) + (2g² − 2)·z⁻¹ + (1 + g²)·z⁻²) / a0
//! ```
//!
//! All analysis is derived from the stored `g` and `k`, the same values the
//! audio path uses, so plots and sound cannot drift apart.
//!
//! # Reference
//!
//! Zavalishin, "The Art of VA Filter Design", rev. 2.1.2 (2018), Chapter 3.

use core::f32::consts::PI;

use libm::{atan, tanf};
use num_complex::Complex64;

use crate::analysis::TransferFunction;
use crate::filter::{FilterNode, FilterType};
use crate::flush_denormal;
use crate::node::{NodeKind, SignalNode};

/// Lowest cutoff in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;
/// Highest cutoff as a fraction of the sample rate (0.98 × Nyquist).
pub const MAX_CUTOFF_RATIO: f32 = 0.49;
/// Resonance range.
pub const RESONANCE_RANGE: (f32, f32) = (0.5, 20.0);

/// State Variable Filter (2-pole, 12 dB/oct).
///
/// ## Parameters
///
/// - `cutoff`: Hz, clamped to 20.0 ..= sr×0.49 (default 1000.0)
/// - `resonance`: Q, clamped to 0.5 ..= 20.0 (default 0.707)
/// - `filter_type`: which output is returned (default `Lowpass`)
///
/// # Example
///
/// ```rust
/// use tonegraph_core::{FilterNode, FilterType, SignalNode, StateVariableFilter};
///
/// let mut svf = StateVariableFilter::new(48000.0);
/// svf.set_cutoff(1000.0);
/// svf.set_resonance(0.707);
/// svf.set_filter_type(FilterType::Lowpass);
///
/// let _y = svf.process(0.5);
/// assert!(svf.is_stable());
/// assert_eq!(svf.poles().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    // Filter state
    ic1eq: f32,
    ic2eq: f32,

    // Coefficients
    g: f32,
    k: f32,

    // Parameters
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    filter_type: FilterType,

    last_output: f32,
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl StateVariableFilter {
    /// Create a lowpass SVF at 1000 Hz, Q = 0.707.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.707,
            filter_type: FilterType::Lowpass,
            last_output: 0.0,
        };
        svf.cutoff = svf.clamp_cutoff(svf.cutoff);
        svf.update_coefficients();
        svf
    }

    /// Create an SVF with explicit type, cutoff and Q.
    pub fn with_params(sample_rate: f32, filter_type: FilterType, cutoff: f32, q: f32) -> Self {
        let mut svf = Self::new(sample_rate);
        svf.filter_type = filter_type;
        svf.set_cutoff(cutoff);
        svf.set_resonance(q);
        svf
    }

    /// The pre-warped integrator gain `g = tan(π·fc/fs)`.
    pub fn g(&self) -> f32 {
        self.g
    }

    /// The damping `k = 1/Q`.
    pub fn k(&self) -> f32 {
        self.k
    }

    fn clamp_cutoff(&self, hz: f32) -> f32 {
        let max = (self.sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
        hz.clamp(MIN_CUTOFF_HZ, max)
    }

    fn update_coefficients(&mut self) {
        self.g = tanf(PI * self.cutoff / self.sample_rate);
        self.k = 1.0 / self.resonance;
    }

    /// Process one sample and return all outputs `(lowpass, highpass, bandpass, notch)`.
    pub fn process_all(&mut self, input: f32) -> (f32, f32, f32, f32) {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) / (1.0 + self.g * (self.g + self.k));
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        let lp = v2;
        let bp = v1;
        let hp = input - self.k * v1 - v2;
        let notch = lp + hp;

        (lp, hp, bp, notch)
    }

    /// Normalised biquad coefficients `(b0, b1, b2, a1, a2)` of the selected
    /// output.
    pub fn coefficients(&self) -> (f64, f64, f64, f64, f64) {
        let g = f64::from(self.g);
        let k = f64::from(self.k);
        let g2 = g * g;
        let a0 = 1.0 + g * k + g2;
        let a1 = (2.0 * g2 - 2.0) / a0;
        let a2 = (1.0 - g * k + g2) / a0;

        let (b0, b1, b2) = match self.filter_type {
            FilterType::Lowpass => (g2, 2.0 * g2, g2),
            FilterType::Highpass => (1.0, -2.0, 1.0),
            FilterType::Bandpass => (g, 0.0, -g),
            FilterType::Notch => (1.0 + g2, 2.0 * g2 - 2.0, 1.0 + g2),
        };
        (b0 / a0, b1 / a0, b2 / a0, a1, a2)
    }

    fn pole_pair(&self) -> (Complex64, Complex64) {
        let (_, _, _, a1, a2) = self.coefficients();
        crate::analysis::quadratic_roots(1.0, a1, a2)
    }
}

impl FilterNode for StateVariableFilter {
    /// Clamped to 20 Hz ..= 0.49 × sample rate.
    fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = self.clamp_cutoff(hz);
        self.update_coefficients();
    }

    fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Clamped to 0.5 ..= 20. Q = 0.707 is Butterworth.
    fn set_resonance(&mut self, q: f32) {
        self.resonance = q.clamp(RESONANCE_RANGE.0, RESONANCE_RANGE.1);
        self.update_coefficients();
    }

    fn resonance(&self) -> f32 {
        self.resonance
    }

    fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    fn is_stable(&self) -> bool {
        let (p1, p2) = self.pole_pair();
        p1.norm() < 1.0 && p2.norm() < 1.0
    }

    fn pole_radius(&self) -> f64 {
        let (p1, p2) = self.pole_pair();
        p1.norm().max(p2.norm())
    }

    fn pole_angle(&self) -> f64 {
        self.pole_pair().0.arg()
    }
}

impl SignalNode for StateVariableFilter {
    fn process(&mut self, input: f32) -> f32 {
        let (lp, hp, bp, notch) = self.process_all(input);

        self.last_output = match self.filter_type {
            FilterType::Lowpass => lp,
            FilterType::Highpass => hp,
            FilterType::Bandpass => bp,
            FilterType::Notch => notch,
        };
        self.last_output
    }

    fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
        self.last_output = 0.0;
    }

    /// Re-clamps the cutoff against the new Nyquist.
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.cutoff = self.clamp_cutoff(self.cutoff);
        self.update_coefficients();
    }

    fn last_output(&self) -> f32 {
        self.last_output
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "State Variable Filter"
    }

    fn description(&self) -> &str {
        match self.filter_type {
            FilterType::Lowpass => "2-pole TPT lowpass, 12 dB/octave",
            FilterType::Highpass => "2-pole TPT highpass, 12 dB/octave",
            FilterType::Bandpass => "2-pole TPT bandpass, 6 dB/octave skirts",
            FilterType::Notch => "2-pole TPT notch",
        }
    }

    fn processing_type(&self) -> &str {
        "Filter"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filter
    }

    fn is_lti(&self) -> bool {
        true
    }

    fn supports_analysis(&self) -> bool {
        true
    }

    fn transfer_function(&self) -> Option<TransferFunction> {
        let (b0, b1, b2, a1, a2) = self.coefficients();
        Some(TransferFunction::biquad(b0, b1, b2, a1, a2))
    }

    fn poles(&self) -> Option<Vec<Complex64>> {
        let (p1, p2) = self.pole_pair();
        Some(vec![p1, p2])
    }

    /// Fixed by response type; the notch pair sits on the unit circle at the
    /// warped cutoff angle `2·atan(g)`.
    fn zeros(&self) -> Option<Vec<Complex64>> {
        let one = Complex64::new(1.0, 0.0);
        let zeros = match self.filter_type {
            FilterType::Lowpass => vec![-one, -one],
            FilterType::Highpass => vec![one, one],
            FilterType::Bandpass => vec![one, -one],
            FilterType::Notch => {
                let omega = 2.0 * atan(f64::from(self.g));
                vec![
                    Complex64::from_polar(1.0, omega),
                    Complex64::from_polar(1.0, -omega),
                ]
            }
        };
        Some(zeros)
    }

    /// Runs a reset copy of this filter on a unit impulse.
    fn impulse_response(&self, num_samples: usize) -> Option<Vec<f32>> {
        let mut probe = self.clone();
        SignalNode::reset(&mut probe);
        let response = (0..num_samples)
            .map(|n| probe.process(if n == 0 { 1.0 } else { 0.0 }))
            .collect();
        Some(response)
    }

    fn as_filter(&self) -> Option<&dyn FilterNode> {
        Some(self)
    }

    fn as_filter_mut(&mut self) -> Option<&mut dyn FilterNode> {
        Some(self)
    }
}
