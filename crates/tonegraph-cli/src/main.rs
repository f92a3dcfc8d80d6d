//! Tonegraph CLI - inspect filters and oscillators, render graphs to WAV.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tonegraph")]
#[command(author, version, about = "Tonegraph signal graph CLI", long_about = None)]
struct Cli {
    /// Log graph construction and structural edits (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List node types known to the registry
    Nodes(commands::nodes::NodesArgs),

    /// Print the transfer function, poles, zeros and response of a filter
    Analyze(commands::analyze::AnalyzeArgs),

    /// Print the theoretical Fourier series of an oscillator waveform
    Harmonics(commands::harmonics::HarmonicsArgs),

    /// Render a preset or graph file to a WAV file
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Harmonics(args) => commands::harmonics::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
