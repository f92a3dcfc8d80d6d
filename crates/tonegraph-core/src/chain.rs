//! Linear chain of nodes processed in series.

use std::sync::Arc;

use crate::graph::GraphError;
use crate::node::{NodeKind, SignalNode};
use crate::probe::ProbeBuffer;

struct Module {
    id: String,
    node: Box<dyn SignalNode>,
    probe: Option<Arc<ProbeBuffer>>,
}

/// Ordered pipeline: each module's output feeds the next.
///
/// The simple case of [`SignalGraph`](crate::SignalGraph). An empty chain
/// passes its input through.
pub struct SignalChain {
    modules: Vec<Module>,
    next_auto_id: usize,
    sample_rate: f32,
    block_size: usize,
    probing: bool,
    last_output: f32,
}

impl Default for SignalChain {
    fn default() -> Self {
        Self::new(crate::graph::DEFAULT_SAMPLE_RATE, crate::graph::DEFAULT_BLOCK_SIZE)
    }
}

impl SignalChain {
    /// Create an empty chain.
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            modules: Vec::new(),
            next_auto_id: 0,
            sample_rate,
            block_size,
            probing: false,
            last_output: 0.0,
        }
    }

    fn resolve_id(&mut self, id: Option<&str>) -> Result<String, GraphError> {
        let id = match id {
            Some("") => return Err(GraphError::EmptyId),
            Some(id) => id.to_string(),
            None => loop {
                let candidate = format!("module{}", self.next_auto_id);
                self.next_auto_id += 1;
                if self.index_of(&candidate).is_none() {
                    break candidate;
                }
            },
        };
        if self.index_of(&id).is_some() {
            return Err(GraphError::DuplicateId(id));
        }
        Ok(id)
    }

    /// Append a module. With no id, one of the form `module<N>` is generated.
    ///
    /// Returns the module's id.
    pub fn add_module(
        &mut self,
        node: Box<dyn SignalNode>,
        id: Option<&str>,
    ) -> Result<String, GraphError> {
        let index = self.modules.len();
        self.insert_module(index, node, id)
    }

    /// Insert a module at `index` (clamped to the chain length).
    pub fn insert_module(
        &mut self,
        index: usize,
        mut node: Box<dyn SignalNode>,
        id: Option<&str>,
    ) -> Result<String, GraphError> {
        let id = self.resolve_id(id)?;
        node.prepare(self.sample_rate, self.block_size);
        let index = index.min(self.modules.len());
        self.modules.insert(
            index,
            Module {
                id: id.clone(),
                node,
                probe: self.probing.then(|| Arc::new(ProbeBuffer::default())),
            },
        );

        #[cfg(feature = "tracing")]
        tracing::debug!("chain_insert: '{id}' at {index}");
        Ok(id)
    }

    /// Remove the module at `index`, returning ownership.
    pub fn remove_module(&mut self, index: usize) -> Option<Box<dyn SignalNode>> {
        if index >= self.modules.len() {
            return None;
        }
        let module = self.modules.remove(index);

        #[cfg(feature = "tracing")]
        tracing::debug!("chain_remove: '{}' at {index}", module.id);
        Some(module.node)
    }

    /// Module at `index`.
    pub fn module(&self, index: usize) -> Option<&dyn SignalNode> {
        self.modules.get(index).map(|m| m.node.as_ref())
    }

    /// Mutable module at `index`.
    pub fn module_mut(&mut self, index: usize) -> Option<&mut dyn SignalNode> {
        match self.modules.get_mut(index) {
            Some(m) => Some(m.node.as_mut()),
            None => None,
        }
    }

    /// Module with the given id.
    pub fn module_by_id(&self, id: &str) -> Option<&dyn SignalNode> {
        self.module(self.index_of(id)?)
    }

    /// Id of the module at `index`.
    pub fn module_id(&self, index: usize) -> Option<&str> {
        self.modules.get(index).map(|m| m.id.as_str())
    }

    /// Position of the module with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.id == id)
    }

    /// Probe attached to the module at `index`, once probing is enabled.
    pub fn probe(&self, index: usize) -> Option<Arc<ProbeBuffer>> {
        self.modules.get(index)?.probe.clone()
    }

    /// Push each module's output into its probe while processing.
    ///
    /// Enabling allocates missing probes; call off the audio thread.
    pub fn set_probing_enabled(&mut self, enabled: bool) {
        self.probing = enabled;
        if enabled {
            for m in &mut self.modules {
                m.probe
                    .get_or_insert_with(|| Arc::new(ProbeBuffer::default()));
            }
        }
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when the chain has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Drop all modules.
    pub fn clear(&mut self) {
        self.modules.clear();
        self.last_output = 0.0;
    }
}

impl SignalNode for SignalChain {
    fn process(&mut self, input: f32) -> f32 {
        let mut x = input;
        for m in &mut self.modules {
            x = m.node.process(x);
            if self.probing
                && let Some(probe) = &m.probe
            {
                probe.push(x);
            }
        }
        self.last_output = x;
        x
    }

    fn reset(&mut self) {
        for m in &mut self.modules {
            m.node.reset();
        }
        self.last_output = 0.0;
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = max_block_size;
        for m in &mut self.modules {
            m.node.prepare(sample_rate, max_block_size);
        }
    }

    fn last_output(&self) -> f32 {
        self.last_output
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "Chain"
    }

    fn description(&self) -> &str {
        "Modules processed in series"
    }

    fn processing_type(&self) -> &str {
        "Signal Chain"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Chain
    }

    fn is_lti(&self) -> bool {
        self.modules.iter().all(|m| m.node.is_lti())
    }
}
