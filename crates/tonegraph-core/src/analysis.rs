//! Analysis value types: transfer functions, frequency responses, harmonics.
//!
//! Everything here is plain data computed on demand from a node's live
//! coefficients. Analysis runs in `f64`; the coefficients themselves come
//! from the `f32` values the audio path uses, so the two agree to the last
//! bit of the audio coefficients.
//!
//! # Conventions
//!
//! A [`TransferFunction`] stores its polynomials in powers of `z⁻¹`:
//!
//! ```text
//!         b0 + b1·z⁻¹ + b2·z⁻² + …
//! H(z) = ─────────────────────────
//!          1 + a1·z⁻¹ + a2·z⁻² + …
//! ```
//!
//! The denominator is always normalised so its leading coefficient is 1.

use core::f64::consts::PI;
use core::fmt::Write as _;

use libm::{pow, sqrt};
use num_complex::Complex64;

use crate::math::magnitude_to_db;

/// Lowest frequency of a sampled frequency response, in Hz.
pub const RESPONSE_MIN_HZ: f64 = 20.0;

/// Rational z-domain transfer function of an LTI node.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    numerator: Vec<f64>,
    denominator: Vec<f64>,
}

impl Default for TransferFunction {
    /// Identity system, H(z) = 1.
    fn default() -> Self {
        Self {
            numerator: vec![1.0],
            denominator: vec![1.0],
        }
    }
}

impl TransferFunction {
    /// Build a transfer function, normalising by the leading denominator term.
    ///
    /// An empty denominator, or one whose leading term is zero, is treated as
    /// `[1.0]` scaled by nothing: the numerator is kept as given.
    pub fn new(numerator: Vec<f64>, denominator: Vec<f64>) -> Self {
        let a0 = denominator.first().copied().unwrap_or(0.0);
        if a0 == 0.0 || !a0.is_finite() {
            return Self {
                numerator,
                denominator: vec![1.0],
            };
        }
        Self {
            numerator: numerator.iter().map(|b| b / a0).collect(),
            denominator: denominator.iter().map(|a| a / a0).collect(),
        }
    }

    /// Second-order section `(b0 + b1·z⁻¹ + b2·z⁻²) / (1 + a1·z⁻¹ + a2·z⁻²)`.
    pub fn biquad(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self {
            numerator: vec![b0, b1, b2],
            denominator: vec![1.0, a1, a2],
        }
    }

    /// Numerator coefficients `b0, b1, …`.
    pub fn numerator(&self) -> &[f64] {
        &self.numerator
    }

    /// Denominator coefficients `1, a1, a2, …`.
    pub fn denominator(&self) -> &[f64] {
        &self.denominator
    }

    /// Filter order: the highest power of `z⁻¹` present.
    pub fn order(&self) -> usize {
        self.numerator
            .len()
            .max(self.denominator.len())
            .saturating_sub(1)
    }

    /// Evaluate H at an arbitrary point of the z-plane.
    pub fn evaluate(&self, z: Complex64) -> Complex64 {
        let z_inv = z.inv();
        let num = eval_poly_z_inv(&self.numerator, z_inv);
        let den = eval_poly_z_inv(&self.denominator, z_inv);
        num / den
    }

    /// Evaluate H on the unit circle at normalised angular frequency `omega`
    /// (radians per sample, `0..=π`).
    pub fn evaluate_at_omega(&self, omega: f64) -> Complex64 {
        self.evaluate(Complex64::from_polar(1.0, omega))
    }

    /// Magnitude in dB at `freq_hz`, floored at −200 dB.
    pub fn magnitude_db_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        magnitude_to_db(self.evaluate_at_omega(omega).norm())
    }

    /// Sample the response at `num_points` log-spaced frequencies from
    /// [`RESPONSE_MIN_HZ`] to Nyquist.
    pub fn frequency_response(&self, sample_rate: f64, num_points: usize) -> FrequencyResponse {
        let mut response = FrequencyResponse::with_capacity(sample_rate, num_points);
        for freq_hz in log_spaced_frequencies(sample_rate, num_points) {
            let omega = 2.0 * PI * freq_hz / sample_rate;
            let h = self.evaluate_at_omega(omega);
            response.points.push(FrequencyResponsePoint::new(freq_hz, omega, h));
        }
        response
    }

    /// Impulse response from the difference equation.
    ///
    /// `y[n] = Σ bₖ·x[n−k] − Σ aₖ·y[n−k]` with `x = δ`.
    pub fn impulse_response(&self, num_samples: usize) -> Vec<f32> {
        let mut y = vec![0.0_f64; num_samples];
        for n in 0..num_samples {
            let mut acc = self.numerator.get(n).copied().unwrap_or(0.0);
            for (k, a) in self.denominator.iter().enumerate().skip(1) {
                if k > n {
                    break;
                }
                acc -= a * y[n - k];
            }
            y[n] = acc;
        }
        y.into_iter().map(|v| v as f32).collect()
    }

    /// Roots of the denominator in the z-plane.
    pub fn poles(&self) -> Vec<Complex64> {
        polynomial_roots(&self.denominator)
    }

    /// Roots of the numerator in the z-plane.
    pub fn zeros(&self) -> Vec<Complex64> {
        polynomial_roots(&self.numerator)
    }

    /// True when every pole lies strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.poles().iter().all(|p| p.norm() < 1.0)
    }

    /// Difference equation in plain text, e.g.
    /// `y[n] = 0.0200 x[n] + 0.0400 x[n-1] + 0.0200 x[n-2] - (-1.5610) y[n-1] - 0.6414 y[n-2]`.
    pub fn equation(&self) -> String {
        let mut out = String::from("y[n] =");
        for (k, b) in self.numerator.iter().enumerate() {
            let sep = if k == 0 { " " } else { " + " };
            let _ = write!(out, "{sep}{b:.4} {}", tap("x", k));
        }
        for (k, a) in self.denominator.iter().enumerate().skip(1) {
            let _ = write!(out, " - ({a:.4}) {}", tap("y", k));
        }
        out
    }
}

fn tap(signal: &str, delay: usize) -> String {
    if delay == 0 {
        format!("{signal}[n]")
    } else {
        format!("{signal}[n-{delay}]")
    }
}

/// Horner evaluation of `c0 + c1·w + c2·w² + …` with `w = z⁻¹`.
fn eval_poly_z_inv(coeffs: &[f64], z_inv: Complex64) -> Complex64 {
    coeffs
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * z_inv + c)
}

/// `num_points` log-spaced frequencies from 20 Hz to Nyquist, inclusive.
pub fn log_spaced_frequencies(sample_rate: f64, num_points: usize) -> impl Iterator<Item = f64> {
    let nyquist = sample_rate * 0.5;
    let lo = RESPONSE_MIN_HZ.min(nyquist);
    let ratio = nyquist / lo;
    let steps = num_points.saturating_sub(1).max(1) as f64;
    (0..num_points).map(move |i| lo * pow(ratio, i as f64 / steps))
}

/// Roots of a polynomial written in powers of `z⁻¹`.
///
/// `c0 + c1·z⁻¹ + … + cm·z⁻ᵐ = 0` is multiplied through by `zᵐ`, giving the
/// ordinary polynomial `c0·zᵐ + c1·zᵐ⁻¹ + … + cm`. Leading zero
/// coefficients lower the degree. Degrees 1 and 2 are solved in closed form
/// (quadratic formula); higher degrees use Durand–Kerner iteration.
pub fn polynomial_roots(coeffs: &[f64]) -> Vec<Complex64> {
    let start = coeffs.iter().position(|&c| c != 0.0);
    let Some(start) = start else {
        return Vec::new();
    };
    let poly = &coeffs[start..];
    match poly.len() {
        0 | 1 => Vec::new(),
        2 => vec![Complex64::new(-poly[1] / poly[0], 0.0)],
        3 => {
            let (a, b) = quadratic_roots(poly[0], poly[1], poly[2]);
            vec![a, b]
        }
        _ => durand_kerner(poly),
    }
}

/// Roots of `a·z² + b·z + c`.
///
/// Real pair when the discriminant is non-negative, complex-conjugate pair
/// otherwise (positive imaginary part first).
pub fn quadratic_roots(a: f64, b: f64, c: f64) -> (Complex64, Complex64) {
    let disc = b * b - 4.0 * a * c;
    let two_a = 2.0 * a;
    if disc >= 0.0 {
        let s = sqrt(disc);
        (
            Complex64::new((-b + s) / two_a, 0.0),
            Complex64::new((-b - s) / two_a, 0.0),
        )
    } else {
        let re = -b / two_a;
        let im = sqrt(-disc) / two_a;
        (Complex64::new(re, im), Complex64::new(re, -im))
    }
}

fn durand_kerner(poly: &[f64]) -> Vec<Complex64> {
    let degree = poly.len() - 1;
    let lead = poly[0];
    let monic: Vec<f64> = poly.iter().map(|c| c / lead).collect();
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..degree).map(|i| seed.powu(i as u32)).collect();

    for _ in 0..500 {
        let mut max_step = 0.0_f64;
        for i in 0..degree {
            let zi = roots[i];
            let value = monic
                .iter()
                .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * zi + c);
            let mut denom = Complex64::new(1.0, 0.0);
            for (j, &zj) in roots.iter().enumerate() {
                if j != i {
                    denom *= zi - zj;
                }
            }
            if denom.norm() == 0.0 {
                continue;
            }
            let step = value / denom;
            roots[i] = zi - step;
            max_step = max_step.max(step.norm());
        }
        if max_step < 1e-14 {
            break;
        }
    }
    roots
}

/// One sample of a frequency response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyResponsePoint {
    /// Frequency in Hz.
    pub frequency_hz: f64,
    /// Normalised angular frequency in radians per sample (`0..=π`).
    pub omega: f64,
    /// Linear magnitude |H|.
    pub magnitude: f64,
    /// Magnitude in dB, floored at −200 dB.
    pub magnitude_db: f64,
    /// Phase in radians (`−π..=π`).
    pub phase_radians: f64,
    /// Phase in degrees.
    pub phase_degrees: f64,
}

impl FrequencyResponsePoint {
    /// Build a point from the complex response value.
    pub fn new(frequency_hz: f64, omega: f64, h: Complex64) -> Self {
        let magnitude = h.norm();
        let phase_radians = h.arg();
        Self {
            frequency_hz,
            omega,
            magnitude,
            magnitude_db: magnitude_to_db(magnitude),
            phase_radians,
            phase_degrees: phase_radians.to_degrees(),
        }
    }
}

/// Sampled frequency response curve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrequencyResponse {
    /// Points in ascending frequency.
    pub points: Vec<FrequencyResponsePoint>,
    /// Sample rate the response was computed for.
    pub sample_rate: f64,
}

impl FrequencyResponse {
    /// Empty response with room for `capacity` points.
    pub fn with_capacity(sample_rate: f64, capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            sample_rate,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no points were sampled.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Magnitude in dB at `freq_hz`, linearly interpolated on a log-frequency
    /// axis between the neighbouring points.
    ///
    /// Frequencies outside the sampled range clamp to the end points.
    /// Returns `None` for an empty response.
    pub fn magnitude_db_at(&self, freq_hz: f64) -> Option<f64> {
        let first = self.points.first()?;
        if freq_hz <= first.frequency_hz {
            return Some(first.magnitude_db);
        }
        for pair in self.points.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if hi.frequency_hz >= freq_hz {
                let span = libm::log(hi.frequency_hz / lo.frequency_hz);
                let t = if span > 0.0 {
                    libm::log(freq_hz / lo.frequency_hz) / span
                } else {
                    0.0
                };
                return Some(lo.magnitude_db + t * (hi.magnitude_db - lo.magnitude_db));
            }
        }
        self.points.last().map(|p| p.magnitude_db)
    }

    /// First frequency whose magnitude is at or below `reference_db − 3`.
    pub fn find_cutoff_frequency(&self, reference_db: f64) -> Option<f64> {
        let target = reference_db - 3.0;
        self.points
            .iter()
            .find(|p| p.magnitude_db <= target)
            .map(|p| p.frequency_hz)
    }

    /// The point with the largest magnitude.
    pub fn peak(&self) -> Option<&FrequencyResponsePoint> {
        self.points
            .iter()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }
}

/// One term of a waveform's Fourier series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicCoefficient {
    /// Harmonic number (1 = fundamental).
    pub harmonic: u32,
    /// Frequency of this harmonic in Hz.
    pub frequency_hz: f64,
    /// Linear amplitude relative to a unit-amplitude waveform.
    pub magnitude: f64,
    /// Amplitude in dB, −100 when the harmonic is absent.
    pub magnitude_db: f64,
    /// Phase in radians.
    pub phase: f64,
}

impl HarmonicCoefficient {
    /// Build a coefficient for harmonic `harmonic` of `fundamental_hz`.
    pub fn new(harmonic: u32, fundamental_hz: f64, magnitude: f64, phase: f64) -> Self {
        let magnitude_db = if magnitude > 0.0 {
            20.0 * libm::log10(magnitude)
        } else {
            -100.0
        };
        Self {
            harmonic,
            frequency_hz: fundamental_hz * f64::from(harmonic),
            magnitude,
            magnitude_db,
            phase,
        }
    }
}
