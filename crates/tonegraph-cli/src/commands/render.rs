//! Offline rendering of a graph to a WAV file.

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use tonegraph_config::{GraphConfig, get_factory_preset};
use tonegraph_core::SignalNode;
use tonegraph_registry::NodeRegistry;

#[derive(Args)]
pub struct RenderArgs {
    /// Factory preset name or path to a .toml / .json graph file
    graph: String,

    /// Output WAV file
    output: PathBuf,

    /// Duration in seconds
    #[arg(short, long, default_value = "2.0")]
    duration: f32,

    /// Override the graph's sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Override the graph's block size
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16 or 32 float)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

fn load_graph_config(source: &str) -> anyhow::Result<GraphConfig> {
    if let Some(preset) = get_factory_preset(source) {
        tracing::debug!(preset = %preset.name, "using factory preset");
        return Ok(preset);
    }
    let path = Path::new(source);
    if !path.exists() {
        anyhow::bail!("'{source}' is neither a factory preset nor an existing file");
    }
    GraphConfig::load(path).with_context(|| format!("failed to load graph '{source}'"))
}

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, bit_depth: u16) -> anyhow::Result<()> {
    let sample_format = match bit_depth {
        16 => hound::SampleFormat::Int,
        32 => hound::SampleFormat::Float,
        other => anyhow::bail!("unsupported bit depth {other} (use 16 or 32)"),
    };
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &s in samples {
        if bit_depth == 16 {
            let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer.write_sample(v)?;
        } else {
            writer.write_sample(s)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !args.duration.is_finite() || args.duration <= 0.0 {
        anyhow::bail!("duration must be positive");
    }

    let mut config = load_graph_config(&args.graph)?;
    if let Some(sr) = args.sample_rate {
        config.sample_rate = sr;
    }
    if let Some(bs) = args.block_size {
        config.block_size = bs;
    }

    let registry = NodeRegistry::new();
    let mut graph = config.build(&registry)?;
    graph.validate()?;

    let sample_rate = config.sample_rate;
    let num_samples = (args.duration * sample_rate as f32).round() as usize;
    let has_input = graph.input_node().is_some();

    tracing::info!(
        graph = %config.name,
        nodes = graph.node_count(),
        samples = num_samples,
        "rendering"
    );

    let mut output = Vec::with_capacity(num_samples);
    let mut peak = 0.0f32;
    for i in 0..num_samples {
        // Graphs with an input node are driven by a single impulse.
        let x = if has_input && i == 0 { 1.0 } else { 0.0 };
        let y = graph.process(x);
        peak = peak.max(y.abs());
        output.push(y);
    }

    write_wav(&args.output, &output, sample_rate, args.bit_depth)?;

    println!(
        "Rendered '{}' to {} ({} samples, {:.2}s @ {} Hz, peak {:.1} dB)",
        config.name,
        args.output.display(),
        output.len(),
        args.duration,
        sample_rate,
        tonegraph_core::linear_to_db(peak)
    );

    Ok(())
}
