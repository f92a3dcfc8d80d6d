//! Node registry and factory for tonegraph signal graphs.
//!
//! This crate maps type names to node constructors so graphs can be built
//! from configuration files and command-line arguments. The registry is an
//! ordinary value: the application creates one at startup and passes it by
//! reference to whatever builds graphs.
//!
//! # Features
//!
//! - **Node Discovery**: List every registered node type with metadata
//! - **Factory Pattern**: Create nodes by name at runtime, case-insensitively
//! - **Aliases**: `osc` and `polyblep` resolve to `oscillator`, `svf` to `filter`
//! - **Extensible**: Register custom creators next to the built-ins
//!
//! # Example
//!
//! ```rust
//! use tonegraph_core::{NodeKind, SignalNode};
//! use tonegraph_registry::{NodeCategory, NodeRegistry};
//!
//! let registry = NodeRegistry::new();
//!
//! for node in registry.all_nodes() {
//!     println!("{}: {}", node.name, node.description);
//! }
//!
//! let filter = registry.create("SVF", 48000.0).unwrap();
//! assert_eq!(filter.kind(), NodeKind::Filter);
//! assert!(registry.create("reverb", 48000.0).is_none());
//!
//! let sources = registry.nodes_in_category(NodeCategory::Source);
//! assert_eq!(sources[0].id, "oscillator");
//! ```

use std::collections::HashMap;
use std::fmt;

use tonegraph_core::mixer::DEFAULT_MIXER_INPUTS;
use tonegraph_core::{
    FilterNode, FilterType, MixerNode, OscillatorNode, OutputNode, SignalNode,
    StateVariableFilter, Waveform,
};
use tonegraph_synth::PolyBlepOscillator;

/// Category of node for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Oscillators and other sound sources
    Source,
    /// Filters with analytic introspection
    Filter,
    /// Mixers, outputs and routing helpers
    Utility,
}

impl NodeCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Source",
            NodeCategory::Filter => "Filter",
            NodeCategory::Utility => "Utility",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Oscillators and other signal generators",
            NodeCategory::Filter => "Lowpass, highpass, bandpass and notch filters",
            NodeCategory::Utility => "Mixers, outputs and routing helpers",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes a node type in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Unique identifier for the node type (lowercase, no spaces).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Brief description of the node.
    pub description: String,
    /// Category for organization.
    pub category: NodeCategory,
    /// Alternative names accepted by [`NodeRegistry::create`].
    pub aliases: Vec<String>,
}

impl NodeDescriptor {
    /// Descriptor with no aliases.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: NodeCategory,
    ) -> Self {
        Self {
            id: id.into().to_ascii_lowercase(),
            name: name.into(),
            description: description.into(),
            category,
            aliases: Vec::new(),
        }
    }

    /// Add aliases (stored lowercase).
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_ascii_lowercase()).collect();
        self
    }
}

/// Creator function: builds a node prepared for the given sample rate.
pub type NodeCreator = Box<dyn Fn(f32) -> Box<dyn SignalNode> + Send + Sync>;

/// Internal entry in the registry.
struct RegistryEntry {
    descriptor: NodeDescriptor,
    creator: NodeCreator,
}

/// Registry of node types that can be created by name.
///
/// Built-in types: `oscillator` (aliases `osc`, `polyblep`), `filter`
/// (`svf`, `statevarfilter`), `mixer` and `output`.
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
    /// Lowercase id or alias to entry index.
    names: HashMap<String, usize>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("nodes", &self.all_nodes())
            .finish_non_exhaustive()
    }
}

impl NodeRegistry {
    /// Create a registry with all built-in nodes registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_nodes();
        registry
    }

    /// Create a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::with_capacity(4),
            names: HashMap::new(),
        }
    }

    fn register_builtin_nodes(&mut self) {
        self.register(
            NodeDescriptor::new(
                "oscillator",
                "PolyBLEP Oscillator",
                "Band-limited sine, saw, square and triangle oscillator",
                NodeCategory::Source,
            )
            .with_aliases(&["osc", "polyblep"]),
            |sr| Box::new(PolyBlepOscillator::new(sr)),
        );

        self.register(
            NodeDescriptor::new(
                "filter",
                "State Variable Filter",
                "Two-pole TPT filter with lowpass, highpass, bandpass and notch outputs",
                NodeCategory::Filter,
            )
            .with_aliases(&["svf", "statevarfilter"]),
            |sr| Box::new(StateVariableFilter::new(sr)),
        );

        self.register(
            NodeDescriptor::new(
                "mixer",
                "Mixer",
                "Sums its inputs with per-input gain",
                NodeCategory::Utility,
            ),
            |sr| {
                let mut mixer = MixerNode::new(DEFAULT_MIXER_INPUTS);
                mixer.prepare(sr, 0);
                Box::new(mixer)
            },
        );

        self.register(
            NodeDescriptor::new(
                "output",
                "Output",
                "Terminal node whose value is the graph output",
                NodeCategory::Utility,
            ),
            |sr| {
                let mut output = OutputNode::new();
                output.prepare(sr, 0);
                Box::new(output)
            },
        );
    }

    /// Register a node type.
    ///
    /// An existing entry with the same id is replaced. The id and aliases take
    /// precedence over aliases of previously registered types.
    pub fn register<F>(&mut self, descriptor: NodeDescriptor, creator: F)
    where
        F: Fn(f32) -> Box<dyn SignalNode> + Send + Sync + 'static,
    {
        let index = match self.entries.iter().position(|e| e.descriptor.id == descriptor.id) {
            Some(index) => {
                let old = &self.entries[index].descriptor;
                for alias in &old.aliases {
                    if self.names.get(alias) == Some(&index) {
                        self.names.remove(alias);
                    }
                }
                index
            }
            None => self.entries.len(),
        };

        self.names.insert(descriptor.id.clone(), index);
        for alias in &descriptor.aliases {
            self.names.insert(alias.clone(), index);
        }

        let entry = RegistryEntry {
            descriptor,
            creator: Box::new(creator),
        };
        if index == self.entries.len() {
            self.entries.push(entry);
        } else {
            self.entries[index] = entry;
        }
    }

    /// Register a creator under a type name with a minimal descriptor.
    pub fn register_creator<F>(&mut self, type_name: &str, creator: F)
    where
        F: Fn(f32) -> Box<dyn SignalNode> + Send + Sync + 'static,
    {
        let descriptor = NodeDescriptor::new(type_name, type_name, "", NodeCategory::Utility);
        self.register(descriptor, creator);
    }

    fn entry(&self, type_name: &str) -> Option<&RegistryEntry> {
        let key = type_name.trim().to_ascii_lowercase();
        self.names.get(&key).map(|&i| &self.entries[i])
    }

    /// Create a node by type name or alias, case-insensitively.
    ///
    /// Returns `None` if the name is not registered.
    pub fn create(&self, type_name: &str, sample_rate: f32) -> Option<Box<dyn SignalNode>> {
        self.entry(type_name).map(|e| (e.creator)(sample_rate))
    }

    /// Oscillator with the given waveform and band-limiting.
    pub fn create_oscillator(
        waveform: Waveform,
        band_limited: bool,
        sample_rate: f32,
    ) -> PolyBlepOscillator {
        let mut osc = PolyBlepOscillator::new(sample_rate);
        osc.set_waveform(waveform);
        osc.set_band_limited(band_limited);
        osc
    }

    /// Filter with the given response, cutoff and Q.
    ///
    /// Cutoff and Q are clamped by the filter.
    pub fn create_filter(
        filter_type: FilterType,
        cutoff_hz: f32,
        q: f32,
        sample_rate: f32,
    ) -> StateVariableFilter {
        let mut filter = StateVariableFilter::new(sample_rate);
        filter.set_filter_type(filter_type);
        filter.set_cutoff(cutoff_hz);
        filter.set_resonance(q);
        filter
    }

    /// Returns descriptors for all registered node types, in registration order.
    pub fn all_nodes(&self) -> Vec<&NodeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for node types in a specific category.
    pub fn nodes_in_category(&self, category: NodeCategory) -> Vec<&NodeDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by id or alias.
    pub fn descriptor(&self, type_name: &str) -> Option<&NodeDescriptor> {
        self.entry(type_name).map(|e| &e.descriptor)
    }

    /// True if `type_name` is a registered id or alias.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.entry(type_name).is_some()
    }

    /// Every accepted name (ids and aliases), sorted.
    pub fn registered_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered node types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no node types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonegraph_core::NodeKind;

    #[test]
    fn test_registry_creation() {
        let registry = NodeRegistry::new();
        assert_eq!(registry.len(), 4);
        assert!(!registry.is_empty());
        assert!(NodeRegistry::empty().is_empty());
    }

    #[test]
    fn test_create_is_case_insensitive() {
        let registry = NodeRegistry::new();
        for name in ["oscillator", "OSC", "PolyBlep", " osc "] {
            let node = registry.create(name, 48000.0);
            assert_eq!(node.map(|n| n.kind()), Some(NodeKind::Oscillator), "{name}");
        }
        for name in ["filter", "SVF", "StateVarFilter"] {
            let node = registry.create(name, 48000.0);
            assert_eq!(node.map(|n| n.kind()), Some(NodeKind::Filter), "{name}");
        }
        assert!(registry.create("reverb", 48000.0).is_none());
        assert!(registry.create("", 48000.0).is_none());
    }

    #[test]
    fn test_created_nodes_use_sample_rate() {
        let registry = NodeRegistry::new();
        for descriptor in registry.all_nodes() {
            let mut node = registry.create(&descriptor.id, 96000.0).unwrap();
            assert_eq!(node.sample_rate(), 96000.0, "{}", descriptor.id);
            assert!(node.process(0.5).is_finite());
        }
    }

    #[test]
    fn test_descriptors_and_categories() {
        let registry = NodeRegistry::new();
        let filter = registry.descriptor("svf").unwrap();
        assert_eq!(filter.id, "filter");
        assert_eq!(filter.category, NodeCategory::Filter);
        assert_eq!(filter.aliases, vec!["svf", "statevarfilter"]);

        assert_eq!(registry.nodes_in_category(NodeCategory::Source).len(), 1);
        assert_eq!(registry.nodes_in_category(NodeCategory::Utility).len(), 2);
        assert_eq!(NodeCategory::Utility.to_string(), "Utility");
    }

    #[test]
    fn test_registered_types_sorted() {
        let registry = NodeRegistry::new();
        assert_eq!(
            registry.registered_types(),
            vec![
                "filter",
                "mixer",
                "osc",
                "oscillator",
                "output",
                "polyblep",
                "statevarfilter",
                "svf"
            ]
        );
    }

    #[test]
    fn test_register_custom_creator() {
        let mut registry = NodeRegistry::new();
        registry.register_creator("Lowpass", |sr| {
            Box::new(NodeRegistry::create_filter(FilterType::Lowpass, 500.0, 0.707, sr))
        });
        assert!(registry.is_registered("lowpass"));
        assert_eq!(registry.len(), 5);

        let node = registry.create("LOWPASS", 44100.0).unwrap();
        assert_eq!(node.as_filter().map(|f| f.cutoff()), Some(500.0));
    }

    #[test]
    fn test_register_replaces_existing_id() {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeDescriptor::new("oscillator", "Square Osc", "", NodeCategory::Source)
                .with_aliases(&["sq"]),
            |sr| {
                Box::new(NodeRegistry::create_oscillator(
                    Waveform::Square,
                    false,
                    sr,
                ))
            },
        );
        assert_eq!(registry.len(), 4);
        assert!(!registry.is_registered("polyblep"));
        assert!(registry.is_registered("sq"));

        let node = registry.create("oscillator", 48000.0).unwrap();
        let osc = node.as_oscillator().unwrap();
        assert_eq!(osc.waveform(), Waveform::Square);
        assert!(!osc.is_band_limited());
    }

    #[test]
    fn test_create_filter_clamps() {
        let filter = NodeRegistry::create_filter(FilterType::Notch, 1e6, 100.0, 44100.0);
        assert_eq!(filter.filter_type(), FilterType::Notch);
        assert!(filter.cutoff() < 21610.0);
        assert_eq!(filter.resonance(), 20.0);
    }
}
