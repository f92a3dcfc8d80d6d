//! Property tests for the PolyBLEP oscillator.

use proptest::prelude::*;
use tonegraph_core::{OscillatorNode, SignalNode, Waveform};
use tonegraph_synth::{PolyBlepOscillator, poly_blep};

fn any_waveform() -> impl Strategy<Value = Waveform> {
    prop::sample::select(Waveform::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn output_is_bounded(
        waveform in any_waveform(),
        freq in 20.0f32..20000.0,
        octave in -2i32..=2,
        cents in -100.0f32..100.0,
        band_limited in any::<bool>(),
    ) {
        let mut osc = PolyBlepOscillator::with_params(48000.0, waveform, freq);
        osc.set_octave_offset(octave);
        osc.set_detune_cents(cents);
        osc.set_band_limited(band_limited);
        // Keep the two correction regions of the square apart.
        prop_assume!(osc.actual_frequency() < 12000.0);
        for _ in 0..1024 {
            let y = osc.process(0.0);
            prop_assert!(y.is_finite());
            prop_assert!(y.abs() <= 1.0 + 1e-5, "{} at {} Hz: {}", waveform, osc.actual_frequency(), y);
            prop_assert!((0.0..1.0).contains(&osc.phase()));
        }
    }

    #[test]
    fn controls_stay_clamped(octave in -50i32..50, cents in -5000.0f32..5000.0) {
        let mut osc = PolyBlepOscillator::new(44100.0);
        osc.set_octave_offset(octave);
        osc.set_detune_cents(cents);
        prop_assert!((-2..=2).contains(&osc.octave_offset()));
        prop_assert!((-100.0..=100.0).contains(&osc.detune_cents()));
        let ratio = osc.actual_frequency() / osc.frequency();
        prop_assert!(ratio >= 0.25 * 0.94 && ratio <= 4.0 * 1.06);
    }

    #[test]
    fn blep_residual_is_bounded(t in 0.0f64..1.0, dt in 1e-4f64..0.5) {
        let r = poly_blep(t, dt);
        prop_assert!((-1.0..=1.0).contains(&r));
        if t >= dt && t <= 1.0 - dt {
            prop_assert_eq!(r, 0.0);
        }
    }
}
