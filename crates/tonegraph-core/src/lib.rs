//! Tonegraph Core - real-time signal graph for an educational synthesizer
//!
//! This crate provides the processing core: a dynamically reconfigurable graph
//! of single-channel audio nodes, a queue that serialises graph edits against
//! the audio thread, and exact analytic introspection of the filters running
//! in it.
//!
//! # Core Abstractions
//!
//! ## Nodes
//!
//! - [`SignalNode`] - Object-safe trait for every processing unit
//! - [`NodeKind`] - Explicit kind tag replacing runtime type recovery
//! - [`FilterNode`] / [`OscillatorNode`] - Domain controls reached through
//!   [`SignalNode::as_filter_mut`] and [`SignalNode::as_oscillator_mut`]
//! - [`StateVariableFilter`] - Two-pole TPT filter with transfer-function analysis
//! - [`MixerNode`], [`OutputNode`] - Routing utilities
//!
//! ## Containers
//!
//! - [`SignalGraph`] - DAG with multi-input summation and cached topological order
//! - [`SignalChain`] - Linear pipeline
//!
//! ## Concurrency
//!
//! - [`ModificationManager`] / [`ModificationHandle`] - Queue of graph edits
//!   applied by the audio thread at block boundaries
//! - [`ProbeBuffer`] - Lock-free sample tap for scopes
//!
//! ## Analysis
//!
//! - [`TransferFunction`] - H(z) with poles, zeros, frequency and impulse response
//! - [`FrequencyResponse`], [`HarmonicCoefficient`] - Value types for plots
//!
//! # Example
//!
//! ```rust
//! use tonegraph_core::{FilterType, SignalNode, StateVariableFilter};
//!
//! let filter = StateVariableFilter::with_params(44100.0, FilterType::Lowpass, 1000.0, 0.707);
//! let poles = filter.poles().unwrap();
//! assert!(poles.iter().all(|p| p.norm() < 1.0));
//!
//! let response = filter.frequency_response(256).unwrap();
//! let at_cutoff = response.magnitude_db_at(1000.0).unwrap();
//! assert!((at_cutoff + 3.0).abs() < 0.5);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: `process` never allocates, locks or fails
//! - **Analysis matches audio**: transfer functions come from the live coefficients
//! - **Object-safe traits**: graphs hold `Box<dyn SignalNode>`
//! - **Optional logging**: enable the `tracing` feature for structural edit logs

pub mod analysis;
pub mod chain;
pub mod filter;
pub mod graph;
pub mod math;
pub mod mixer;
pub mod modification;
pub mod node;
pub mod oscillator;
pub mod probe;
pub mod svf;

// Re-export main types at crate root
pub use analysis::{
    FrequencyResponse, FrequencyResponsePoint, HarmonicCoefficient, TransferFunction,
    log_spaced_frequencies,
};
pub use chain::SignalChain;
pub use filter::{FilterNode, FilterType};
pub use graph::{
    Connection, DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, GraphError, GraphEvent, SignalGraph,
};
pub use math::{db_to_linear, flush_denormal, linear_to_db, magnitude_to_db, pitch_ratio};
pub use mixer::{MixerNode, OutputNode};
pub use modification::{
    Modification, ModificationHandle, ModificationManager, PendingModification, VoiceState,
};
pub use node::{NodeKind, ParseNameError, SignalNode};
pub use num_complex::Complex64;
pub use oscillator::{DETUNE_RANGE_CENTS, OCTAVE_RANGE, OscillatorNode, Waveform};
pub use probe::ProbeBuffer;
pub use svf::StateVariableFilter;
