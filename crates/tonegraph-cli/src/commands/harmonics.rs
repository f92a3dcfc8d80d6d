//! Theoretical harmonic content command.

use clap::Args;
use tonegraph_core::{OscillatorNode, Waveform};
use tonegraph_registry::NodeRegistry;

#[derive(Args)]
pub struct HarmonicsArgs {
    /// Waveform: sine, saw, square or triangle
    #[arg(long, default_value = "saw")]
    waveform: Waveform,

    /// Base frequency in Hz
    #[arg(long, default_value = "440.0")]
    frequency: f32,

    /// Octave offset (-2..=2)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    octave: i32,

    /// Detune in cents (-100..=100)
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    detune: f32,

    /// Number of harmonics
    #[arg(long, default_value = "10")]
    count: usize,

    /// Sample rate, used to mark harmonics above Nyquist
    #[arg(long, default_value = "44100")]
    sample_rate: u32,
}

pub fn run(args: HarmonicsArgs) -> anyhow::Result<()> {
    let sample_rate = args.sample_rate as f32;
    let mut osc = NodeRegistry::create_oscillator(args.waveform, true, sample_rate);
    osc.set_frequency(args.frequency);
    osc.set_octave_offset(args.octave);
    osc.set_detune_cents(args.detune);

    println!(
        "{} at {:.2} Hz ({})",
        args.waveform,
        osc.actual_frequency(),
        osc.harmonic_description()
    );
    println!();
    println!(
        "  {:>3}  {:>10}  {:>10}  {:>9}  {:>9}",
        "k", "Freq (Hz)", "Magnitude", "dB", "Phase"
    );
    println!(
        "  {:>3}  {:>10}  {:>10}  {:>9}  {:>9}",
        "-", "---------", "---------", "--", "-----"
    );

    let nyquist = f64::from(sample_rate) / 2.0;
    for h in osc.theoretical_harmonics(args.count) {
        let marker = if h.frequency_hz >= nyquist { "  aliases" } else { "" };
        println!(
            "  {:>3}  {:>10.1}  {:>10.6}  {:>9.2}  {:>9.4}{}",
            h.harmonic, h.frequency_hz, h.magnitude, h.magnitude_db, h.phase, marker
        );
    }

    Ok(())
}
