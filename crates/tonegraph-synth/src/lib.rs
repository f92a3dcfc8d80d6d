//! Tonegraph Synth - sound sources for the tonegraph signal graph
//!
//! This crate provides the band-limited oscillator that feeds filter graphs
//! built with `tonegraph-core`.
//!
//! # Oscillators
//!
//! - [`PolyBlepOscillator`] - Sine, saw, square and triangle with PolyBLEP
//!   anti-aliasing that can be switched off for comparison
//! - [`poly_blep`] - The two-sample correction polynomial itself
//!
//! Every oscillator reports the closed-form Fourier series of its current
//! waveform through
//! [`OscillatorNode::theoretical_harmonics`](tonegraph_core::OscillatorNode::theoretical_harmonics),
//! so a spectrum display can overlay theory on measurement.
//!
//! # Example
//!
//! ```rust
//! use tonegraph_core::{OscillatorNode, OutputNode, SignalGraph, SignalNode, Waveform};
//! use tonegraph_synth::PolyBlepOscillator;
//!
//! let mut graph = SignalGraph::new(48000.0, 256);
//! let osc = PolyBlepOscillator::with_params(48000.0, Waveform::Square, 220.0);
//! graph.add_node("osc", Box::new(osc), 1)?;
//! graph.add_node("out", Box::new(OutputNode::new()), 1)?;
//! graph.connect("osc", "out", 0)?;
//! graph.set_output_node("out")?;
//!
//! let harmonics = graph
//!     .node("osc")
//!     .and_then(|n| n.as_oscillator())
//!     .map(|o| o.theoretical_harmonics(3))
//!     .unwrap_or_default();
//! assert_eq!(harmonics[1].magnitude, 0.0);
//!
//! let block: Vec<f32> = (0..256).map(|_| graph.process(0.0)).collect();
//! assert!(block.iter().all(|s| s.abs() <= 1.0 + 1e-6));
//! # Ok::<(), tonegraph_core::GraphError>(())
//! ```

pub mod oscillator;

pub use oscillator::{DEFAULT_FREQUENCY_HZ, PolyBlepOscillator, poly_blep};
