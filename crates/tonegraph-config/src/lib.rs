//! Configuration and preset management for tonegraph signal graphs.
//!
//! Graphs are described declaratively (nodes, connections, input and output
//! designations, engine parameters) and built through a
//! [`NodeRegistry`](tonegraph_registry::NodeRegistry).
//!
//! # Features
//!
//! - **Graph Files**: Load and save graph descriptions as TOML or JSON
//! - **Build**: Instantiate, configure, wire and prepare a [`SignalGraph`](tonegraph_core::SignalGraph)
//! - **Capture**: Describe a live graph back into a [`GraphConfig`]
//! - **Factory Presets**: Built-in graphs for common patches
//!
//! # Example
//!
//! ```rust
//! use tonegraph_config::{GraphConfig, NodeConfig, get_factory_preset};
//! use tonegraph_core::SignalNode;
//! use tonegraph_registry::NodeRegistry;
//!
//! let registry = NodeRegistry::new();
//!
//! let config = GraphConfig::new("Beep")
//!     .with_node(NodeConfig::new("osc", "osc").with_param("frequency", "1kHz"))
//!     .with_node(NodeConfig::new("output", "out"))
//!     .with_connection("osc", "out", 0)
//!     .with_output("out");
//! let mut graph = config.build(&registry)?;
//! let _ = graph.process(0.0);
//!
//! let subtractive = get_factory_preset("subtractive").unwrap();
//! assert_eq!(subtractive.output.as_deref(), Some("out"));
//! # Ok::<(), tonegraph_config::ConfigError>(())
//! ```

mod error;
mod graph_config;
mod node_config;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use graph_config::{ConfigFormat, GraphConfig};
pub use node_config::{ConnectionConfig, NodeConfig, parse_bool, parse_param_value};
