//! Small math helpers shared by the nodes and the analysis types.

use libm::{exp2, expf, log10, logf};

/// Smallest linear magnitude considered by the dB conversions (−200 dB).
pub const MAGNITUDE_FLOOR: f64 = 1e-10;

/// Convert decibels to linear gain.
///
/// ```rust
/// use tonegraph_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels, floored at −200 dB.
///
/// ```rust
/// use tonegraph_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) + 6.02).abs() < 0.01);
/// assert!(linear_to_db(0.0).is_finite());
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(MAGNITUDE_FLOOR as f32)) * FACTOR
}

/// Double-precision magnitude to dB used by the analysis types.
///
/// Magnitudes below [`MAGNITUDE_FLOOR`] map to −200 dB instead of −∞.
#[inline]
pub fn magnitude_to_db(magnitude: f64) -> f64 {
    20.0 * log10(magnitude.max(MAGNITUDE_FLOOR))
}

/// Frequency ratio for an octave offset plus a detune in cents.
///
/// `2^(octaves + cents / 1200)`
#[inline]
pub fn pitch_ratio(octaves: f64, cents: f64) -> f64 {
    exp2(octaves + cents / 1200.0)
}

/// Flush subnormal floats to zero.
///
/// Values below 1e-20 are replaced with zero, leaving margin before the
/// IEEE 754 subnormal range. Used on filter integrator state.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
