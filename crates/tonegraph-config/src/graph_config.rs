//! Graph file format and operations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tonegraph_core::{SignalGraph, SignalNode};
use tonegraph_registry::NodeRegistry;

use crate::error::ConfigError;
use crate::node_config::{ConnectionConfig, NodeConfig};

/// On-disk format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Format for a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Description of a complete signal graph.
///
/// # TOML Format
///
/// ```toml
/// name = "Subtractive"
/// description = "Saw through a resonant lowpass"
/// sample_rate = 44100
/// block_size = 512
/// output = "out"
///
/// [[nodes]]
/// type = "oscillator"
/// id = "osc"
/// subtype = "saw"
/// [nodes.params]
/// frequency = "110Hz"
///
/// [[nodes]]
/// type = "filter"
/// id = "lp"
/// subtype = "lowpass"
/// [nodes.params]
/// cutoff = "1.2kHz"
/// resonance = "2"
///
/// [[nodes]]
/// type = "output"
/// id = "out"
///
/// [[connections]]
/// source = "osc"
/// dest = "lp"
///
/// [[connections]]
/// source = "lp"
/// dest = "out"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    /// Name of the graph.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate passed to `prepare` (defaults to 44100).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Maximum block size passed to `prepare` (defaults to 512).
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Id of the node receiving external input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Id of the node whose output is the graph output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Nodes in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Edges.
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_block_size() -> usize {
    tonegraph_core::DEFAULT_BLOCK_SIZE
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl GraphConfig {
    /// Create an empty graph configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            input: None,
            output: None,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Append a node.
    pub fn with_node(mut self, node: NodeConfig) -> Self {
        self.nodes.push(node);
        self
    }

    /// Append an edge into input `input` of `dest`.
    pub fn with_connection(
        mut self,
        source: impl Into<String>,
        dest: impl Into<String>,
        input: usize,
    ) -> Self {
        self.connections
            .push(ConnectionConfig::new(source, dest, input));
        self
    }

    /// Designate the input node.
    pub fn with_input(mut self, id: impl Into<String>) -> Self {
        self.input = Some(id.into());
        self
    }

    /// Designate the output node.
    pub fn with_output(mut self, id: impl Into<String>) -> Self {
        self.output = Some(id.into());
        self
    }

    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        match format {
            ConfigFormat::Toml => Self::from_toml(&content),
            ConfigFormat::Json => Self::from_json(&content),
        }
    }

    /// Save to a `.toml` or `.json` file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => self.to_toml()?,
            ConfigFormat::Json => self.to_json()?,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::JsonParse)
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::JsonSerialize)
    }

    /// Instantiate every node through `registry`, wire the connections,
    /// designate input and output, and prepare the graph.
    ///
    /// Fails on the first unknown type, invalid parameter or rejected edge.
    pub fn build(&self, registry: &NodeRegistry) -> Result<SignalGraph, ConfigError> {
        let sample_rate = self.sample_rate as f32;
        let mut graph = SignalGraph::new(sample_rate, self.block_size);

        for config in &self.nodes {
            let node = config.instantiate(registry, sample_rate)?;
            let num_inputs = config.num_inputs.unwrap_or_else(|| node.num_inputs());
            graph.add_node(&config.id, node, num_inputs)?;
        }

        for c in &self.connections {
            graph.connect(&c.source, &c.dest, c.input)?;
        }

        if let Some(id) = &self.input {
            graph.set_input_node(id)?;
        }
        if let Some(id) = &self.output {
            graph.set_output_node(id)?;
        }

        graph.prepare(sample_rate, self.block_size);

        tracing::debug!(
            name = %self.name,
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "built graph"
        );
        Ok(graph)
    }

    /// Describe a live graph.
    ///
    /// Oscillators, filters, mixers and outputs are supported; any other node
    /// kind yields [`ConfigError::UnsupportedNode`].
    pub fn capture(name: impl Into<String>, graph: &SignalGraph) -> Result<Self, ConfigError> {
        let mut config = GraphConfig::new(name)
            .with_sample_rate(graph.sample_rate().round() as u32)
            .with_block_size(graph.block_size());

        for id in graph.node_ids() {
            if let Some(node) = graph.node(&id) {
                let num_inputs = graph.num_inputs(&id).unwrap_or(1);
                config.nodes.push(NodeConfig::capture(&id, node, num_inputs)?);
            }
        }

        config.connections = graph
            .connections()
            .into_iter()
            .map(|c| ConnectionConfig::new(c.source, c.dest, c.input))
            .collect();
        config.input = graph.input_node().map(str::to_string);
        config.output = graph.output_node().map(str::to_string);
        Ok(config)
    }
}
