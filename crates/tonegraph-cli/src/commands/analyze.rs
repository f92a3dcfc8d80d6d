//! Filter analysis command.

use clap::Args;
use tonegraph_core::{Complex64, FilterNode, FilterType, SignalNode};
use tonegraph_registry::NodeRegistry;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Filter response: lowpass, highpass, bandpass or notch
    #[arg(long = "type", default_value = "lowpass")]
    filter_type: FilterType,

    /// Cutoff frequency in Hz
    #[arg(long, default_value = "1000.0")]
    cutoff: f32,

    /// Resonance (Q)
    #[arg(long, default_value = "0.707")]
    q: f32,

    /// Sample rate in Hz
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Number of log-spaced frequency response points
    #[arg(long, default_value = "24")]
    points: usize,

    /// Also print the first N impulse response samples
    #[arg(long, default_value = "0")]
    impulse: usize,
}

fn format_complex(z: Complex64) -> String {
    if z.im.abs() < 1e-12 {
        format!("{:+.6}", z.re)
    } else {
        format!("{:+.6} {} {:.6}j", z.re, if z.im < 0.0 { '-' } else { '+' }, z.im.abs())
    }
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let sample_rate = args.sample_rate as f32;
    let filter = NodeRegistry::create_filter(args.filter_type, args.cutoff, args.q, sample_rate);
    let tf = filter
        .transfer_function()
        .ok_or_else(|| anyhow::anyhow!("filter has no transfer function"))?;

    println!(
        "{} {}: fc = {:.1} Hz, Q = {:.3}, fs = {} Hz",
        filter.name(),
        filter.filter_type(),
        filter.cutoff(),
        filter.resonance(),
        args.sample_rate
    );
    if filter.cutoff() != args.cutoff || filter.resonance() != args.q {
        println!("  (parameters clamped from fc = {}, Q = {})", args.cutoff, args.q);
    }
    println!();

    println!("Transfer function (order {})", tf.order());
    println!("  b = {:?}", tf.numerator());
    println!("  a = {:?}", tf.denominator());
    println!("  {}", tf.equation());
    println!();

    println!("Poles");
    for (i, p) in tf.poles().iter().enumerate() {
        println!(
            "  p{} = {:30}  |p| = {:.6}  angle = {:.4} rad",
            i + 1,
            format_complex(*p),
            p.norm(),
            p.arg()
        );
    }
    println!("Zeros");
    for (i, z) in tf.zeros().iter().enumerate() {
        println!("  z{} = {}", i + 1, format_complex(*z));
    }
    println!();

    println!(
        "Stable: {} (pole radius {:.6})",
        if filter.is_stable() { "yes" } else { "no" },
        filter.pole_radius()
    );
    println!();

    let response = tf.frequency_response(f64::from(sample_rate), args.points);
    println!("  {:>10}  {:>10}  {:>10}", "Freq (Hz)", "Mag (dB)", "Phase (°)");
    println!("  {:>10}  {:>10}  {:>10}", "---------", "--------", "---------");
    for point in &response.points {
        println!(
            "  {:>10.1}  {:>10.2}  {:>10.1}",
            point.frequency_hz, point.magnitude_db, point.phase_degrees
        );
    }
    println!();

    let reference = response.points.first().map_or(0.0, |p| p.magnitude_db);
    match (args.filter_type, response.find_cutoff_frequency(reference)) {
        (FilterType::Lowpass, Some(f)) => println!("-3 dB point: {f:.1} Hz"),
        (FilterType::Lowpass, None) => println!("-3 dB point: above sampled range"),
        _ => {
            if let Some(peak) = response.peak() {
                println!(
                    "Peak: {:.2} dB at {:.1} Hz",
                    peak.magnitude_db, peak.frequency_hz
                );
            }
        }
    }

    if args.impulse > 0 {
        println!();
        println!("Impulse response");
        for (n, h) in tf.impulse_response(args.impulse).iter().enumerate() {
            println!("  h[{n}] = {h:+.6}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_complex() {
        assert_eq!(format_complex(Complex64::new(-1.0, 0.0)), "-1.000000");
        assert_eq!(format_complex(Complex64::new(0.5, -0.25)), "+0.500000 - 0.250000j");
    }
}
