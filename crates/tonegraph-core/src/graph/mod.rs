//! Dynamic DAG of processing nodes.
//!
//! [`SignalGraph`] owns its nodes by string id and routes single-channel
//! samples along explicit edges. Structural edits happen between samples;
//! when they originate on another thread they are funnelled through the
//! [`ModificationManager`](crate::ModificationManager).
//!
//! # Scheduling
//!
//! The processing order is a Kahn topological sort over the edge lists with
//! ties broken by insertion order, so two graphs built the same way always
//! run their nodes in the same sequence. The order is cached and rebuilt only
//! after a structural change.
//!
//! # Example
//!
//! ```rust
//! use tonegraph_core::{FilterType, OutputNode, SignalGraph, SignalNode, StateVariableFilter};
//!
//! let mut graph = SignalGraph::new(48000.0, 256);
//! let filter = StateVariableFilter::with_params(48000.0, FilterType::Lowpass, 1000.0, 0.707);
//! graph.add_node("filter", Box::new(filter), 1)?;
//! graph.add_node("out", Box::new(OutputNode::new()), 1)?;
//! graph.connect("filter", "out", 0)?;
//! graph.set_input_node("filter")?;
//! graph.set_output_node("out")?;
//!
//! let y = graph.process(1.0);
//! assert!(y > 0.0 && y < 1.0);
//! # Ok::<(), tonegraph_core::GraphError>(())
//! ```

mod edge;
mod event;
mod node;
mod processing;

pub use edge::Connection;
pub use event::GraphEvent;
pub use processing::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, GraphError, SignalGraph};
