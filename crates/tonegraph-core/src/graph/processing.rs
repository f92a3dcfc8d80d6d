//! Signal graph: mutation API, topological scheduling and per-sample execution.
//!
//! Nodes live in a dense vector kept in insertion order, so a slot index
//! doubles as the node's insertion rank; removal shifts later slots down.
//! Edge slots are recycled through a free list. Storage therefore tracks the
//! live graph, not its edit history. The topological order is cached and
//! recomputed lazily after any structural edit.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::filter::FilterNode;
use crate::node::{NodeKind, SignalNode};
use crate::oscillator::OscillatorNode;
use crate::probe::{DEFAULT_PROBE_CAPACITY, ProbeBuffer};

use super::edge::{Connection, Edge};
use super::event::GraphEvent;
use super::node::GraphNode;

/// Sample rate a new graph starts with.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Block size a new graph starts with.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Errors reported by structural graph operations.
///
/// A failed operation leaves the graph untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Node ids must be non-empty.
    #[error("node id must not be empty")]
    EmptyId,
    /// A node with this id already exists.
    #[error("node '{0}' already exists")]
    DuplicateId(String),
    /// No node with this id.
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    /// The source node cannot feed other nodes.
    #[error("node '{0}' cannot produce output")]
    CannotProduceOutput(String),
    /// The destination node cannot take input.
    #[error("node '{0}' cannot accept input")]
    CannotAcceptInput(String),
    /// The destination input index is past the node's declared input count.
    #[error("input {index} out of range for node '{node}' ({num_inputs} inputs)")]
    InputIndexOutOfRange {
        /// Destination node.
        node: String,
        /// Requested input index.
        index: usize,
        /// Declared input count.
        num_inputs: usize,
    },
    /// The same (source, dest, input) edge already exists.
    #[error("connection {0} already exists")]
    DuplicateEdge(Connection),
    /// The edge would close a cycle.
    #[error("connection would create a cycle")]
    CycleDetected,
    /// No output node is designated.
    #[error("no output node set")]
    NoOutputNode,
    /// The output node accepts input but nothing feeds it.
    #[error("output node '{0}' has no incoming connections")]
    OutputUnconnected(String),
}

/// Directed acyclic graph of [`SignalNode`]s, driven one sample at a time.
///
/// # Usage
///
/// 1. Create with [`new`](Self::new) (or `Default`: 44.1 kHz, 512-sample blocks).
/// 2. Add nodes with [`add_node`](Self::add_node).
/// 3. Wire them with [`connect`](Self::connect).
/// 4. Designate the output with [`set_output_node`](Self::set_output_node).
/// 5. Pull samples with [`SignalNode::process`].
///
/// # Summation
///
/// Edges landing on the same input index of a node are summed. A node with a
/// single input receives that sum through [`SignalNode::process`]; a node
/// with several inputs receives the per-index sums through
/// [`SignalNode::process_inputs`] and combines them itself.
///
/// # Real-time Safety
///
/// `process` does not allocate once the order is cached and never fails: a
/// graph without an output node, or with a cycle, yields 0.0.
pub struct SignalGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<Option<Edge>>,
    free_edges: Vec<usize>,
    input: Option<usize>,
    output: Option<usize>,
    order: Vec<usize>,
    order_dirty: bool,
    in_degree: Vec<usize>,
    ready: BinaryHeap<Reverse<usize>>,
    sample_rate: f32,
    block_size: usize,
    probing: bool,
    probe_capacity: usize,
    active_probe: Option<usize>,
    events: Option<Sender<GraphEvent>>,
    last_output: f32,
}

impl fmt::Debug for SignalGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalGraph")
            .field("nodes", &self.node_ids())
            .field("connections", &self.connection_count())
            .field("input", &self.input_node())
            .field("output", &self.output_node())
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}

impl Default for SignalGraph {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, DEFAULT_BLOCK_SIZE)
    }
}

impl SignalGraph {
    /// Create an empty graph.
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            free_edges: Vec::new(),
            input: None,
            output: None,
            order: Vec::new(),
            order_dirty: false,
            in_degree: Vec::new(),
            ready: BinaryHeap::new(),
            sample_rate,
            block_size,
            probing: false,
            probe_capacity: DEFAULT_PROBE_CAPACITY,
            active_probe: None,
            events: None,
            last_output: 0.0,
        }
    }

    /// Maximum block size set by `new` or the last `prepare`.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    // --- Events ---

    /// Attach (or detach) a channel receiving [`GraphEvent`]s.
    pub fn set_event_sender(&mut self, sender: Option<Sender<GraphEvent>>) {
        self.events = sender;
    }

    /// Attach a new bounded event channel and return its receiver.
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<GraphEvent> {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        self.events = Some(tx);
        rx
    }

    fn emit(&self, event: impl FnOnce() -> GraphEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event());
        }
    }

    // --- Node mutations ---

    /// Insert a node under `id` with `num_inputs` declared inputs.
    ///
    /// The node is prepared at the graph's sample rate and block size.
    pub fn add_node(
        &mut self,
        id: &str,
        mut node: Box<dyn SignalNode>,
        num_inputs: usize,
    ) -> Result<(), GraphError> {
        if id.is_empty() {
            return Err(GraphError::EmptyId);
        }
        if self.index.contains_key(id) {
            #[cfg(feature = "tracing")]
            tracing::debug!("graph_add: rejected duplicate id '{id}'");
            return Err(GraphError::DuplicateId(id.to_string()));
        }

        node.prepare(self.sample_rate, self.block_size);
        let mut entry = GraphNode::new(id.to_string(), node, num_inputs);
        // Every declared input must reach the mixer with a gain.
        if let Some(mixer) = entry.node.as_mixer_mut()
            && mixer.gains().len() < entry.num_inputs
        {
            mixer.set_num_inputs(entry.num_inputs);
        }
        if self.probing {
            entry.probe = Some(Arc::new(ProbeBuffer::new(self.probe_capacity)));
        }
        let slot = self.nodes.len();
        self.nodes.push(entry);
        self.index.insert(id.to_string(), slot);
        self.order_dirty = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: '{id}' slot {slot} ({num_inputs} inputs)");
        self.emit(|| GraphEvent::NodeAdded(id.to_string()));
        Ok(())
    }

    /// Remove a node and every edge touching it, returning ownership.
    ///
    /// Clears the input/output designation if the node held it. Returns
    /// `None` when the id is unknown.
    pub fn remove_node(&mut self, id: &str) -> Option<Box<dyn SignalNode>> {
        let slot = *self.index.get(id)?;
        let touching: Vec<usize> = {
            let n = &self.nodes[slot];
            n.incoming.iter().chain(&n.outgoing).copied().collect()
        };
        for edge in touching {
            self.remove_edge(edge);
        }

        self.index.remove(id);
        let removed = self.nodes.remove(slot);

        // Later slots shift down by one.
        let shift = |s: usize| if s > slot { s - 1 } else { s };
        for v in self.index.values_mut() {
            *v = shift(*v);
        }
        for edge in self.edges.iter_mut().flatten() {
            edge.from = shift(edge.from);
            edge.to = shift(edge.to);
        }
        let designation = |d: Option<usize>| match d {
            Some(s) if s == slot => None,
            other => other.map(shift),
        };
        self.input = designation(self.input);
        self.output = designation(self.output);
        self.active_probe = designation(self.active_probe);
        self.order.clear();
        self.order_dirty = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: '{id}'");
        self.emit(|| GraphEvent::NodeRemoved(id.to_string()));
        Some(removed.node)
    }

    /// Drop every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.edges.clear();
        self.free_edges.clear();
        self.input = None;
        self.output = None;
        self.active_probe = None;
        self.order.clear();
        self.order_dirty = false;
        self.last_output = 0.0;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_clear");
        self.emit(|| GraphEvent::Cleared);
    }

    // --- Connections ---

    /// Check whether `connect(source, dest, input)` would succeed, without
    /// changing anything.
    pub fn can_connect(&self, source: &str, dest: &str, input: usize) -> Result<(), GraphError> {
        let from = self.slot(source)?;
        let to = self.slot(dest)?;
        let (src, dst) = (&self.nodes[from], &self.nodes[to]);

        if !src.node.can_produce_output() {
            return Err(GraphError::CannotProduceOutput(source.to_string()));
        }
        if !dst.node.can_accept_input() {
            return Err(GraphError::CannotAcceptInput(dest.to_string()));
        }
        if input >= dst.num_inputs {
            return Err(GraphError::InputIndexOutOfRange {
                node: dest.to_string(),
                index: input,
                num_inputs: dst.num_inputs,
            });
        }
        if self.find_edge(from, to, input).is_some() {
            return Err(GraphError::DuplicateEdge(Connection::new(source, dest, input)));
        }
        // A cycle exists if `dest` already reaches `source`.
        if self.can_reach(to, from) {
            return Err(GraphError::CycleDetected);
        }
        Ok(())
    }

    /// Connect `source`'s output to input `input` of `dest`.
    pub fn connect(&mut self, source: &str, dest: &str, input: usize) -> Result<(), GraphError> {
        if let Err(e) = self.can_connect(source, dest, input) {
            #[cfg(feature = "tracing")]
            tracing::debug!("graph_connect: rejected {source} → {dest}[{input}]: {e}");
            return Err(e);
        }
        let from = self.slot(source)?;
        let to = self.slot(dest)?;
        self.link(from, to, input);

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {source} → {dest}[{input}]");
        self.emit(|| GraphEvent::ConnectionAdded(Connection::new(source, dest, input)));
        Ok(())
    }

    /// Remove every edge from `source` to `dest`. Returns false if none existed.
    pub fn disconnect(&mut self, source: &str, dest: &str) -> bool {
        let (Ok(from), Ok(to)) = (self.slot(source), self.slot(dest)) else {
            return false;
        };
        let matching: Vec<usize> = self.nodes[from]
            .outgoing
            .iter()
            .copied()
            .filter(|&e| self.edges[e].is_some_and(|edge| edge.to == to))
            .collect();
        if matching.is_empty() {
            return false;
        }
        for e in matching {
            self.remove_edge(e);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {source} → {dest}");
        true
    }

    /// Remove the exact edge `source → dest[input]`. Returns false if absent.
    pub fn disconnect_input(&mut self, source: &str, dest: &str, input: usize) -> bool {
        let (Ok(from), Ok(to)) = (self.slot(source), self.slot(dest)) else {
            return false;
        };
        match self.find_edge(from, to, input) {
            Some(e) => {
                self.remove_edge(e);
                #[cfg(feature = "tracing")]
                tracing::debug!("graph_disconnect: {source} → {dest}[{input}]");
                true
            }
            None => false,
        }
    }

    /// True when at least one edge runs from `source` to `dest`.
    pub fn is_connected(&self, source: &str, dest: &str) -> bool {
        self.connections()
            .iter()
            .any(|c| c.source == source && c.dest == dest)
    }

    /// All edges, grouped by source node in insertion order.
    pub fn connections(&self) -> Vec<Connection> {
        self.nodes
            .iter()
            .flat_map(|src| {
                src.outgoing.iter().filter_map(|&e| {
                    let edge = self.edges[e]?;
                    let dst = self.nodes.get(edge.to)?;
                    Some(Connection::new(src.id.clone(), dst.id.clone(), edge.input))
                })
            })
            .collect()
    }

    /// Number of edges.
    pub fn connection_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    // --- Designations ---

    /// Designate the node whose output the graph returns.
    pub fn set_output_node(&mut self, id: &str) -> Result<(), GraphError> {
        self.output = Some(self.slot(id)?);
        Ok(())
    }

    /// Designate the node fed by the external input sample.
    pub fn set_input_node(&mut self, id: &str) -> Result<(), GraphError> {
        self.input = Some(self.slot(id)?);
        Ok(())
    }

    /// The designated output node.
    pub fn output_node(&self) -> Option<&str> {
        self.output.and_then(|s| self.id_of(s))
    }

    /// The designated input node.
    pub fn input_node(&self) -> Option<&str> {
        self.input.and_then(|s| self.id_of(s))
    }

    // --- Lookup ---

    /// True when a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Shared access to a node.
    pub fn node(&self, id: &str) -> Option<&dyn SignalNode> {
        let slot = *self.index.get(id)?;
        Some(self.nodes[slot].node.as_ref())
    }

    /// Exclusive access to a node.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut dyn SignalNode> {
        let slot = *self.index.get(id)?;
        Some(self.nodes[slot].node.as_mut())
    }

    /// Filter controls of a node, if it is a filter.
    pub fn filter_mut(&mut self, id: &str) -> Option<&mut dyn FilterNode> {
        self.node_mut(id)?.as_filter_mut()
    }

    /// Oscillator controls of a node, if it is an oscillator.
    pub fn oscillator_mut(&mut self, id: &str) -> Option<&mut dyn OscillatorNode> {
        self.node_mut(id)?.as_oscillator_mut()
    }

    /// Declared input count of a node.
    pub fn num_inputs(&self, id: &str) -> Option<usize> {
        let slot = *self.index.get(id)?;
        Some(self.nodes[slot].num_inputs)
    }

    /// Visit every node in insertion order.
    pub fn for_each_node(&self, mut f: impl FnMut(&str, &dyn SignalNode)) {
        for n in &self.nodes {
            f(&n.id, n.node.as_ref());
        }
    }

    // --- Scheduling ---

    /// Topological order of node ids.
    ///
    /// Ties are broken by insertion order. Returns an empty list if the graph
    /// contains a cycle.
    pub fn compute_processing_order(&mut self) -> Vec<String> {
        self.refresh_order();
        self.order
            .iter()
            .filter_map(|&s| self.id_of(s).map(str::to_string))
            .collect()
    }

    /// Check that an output is set, the graph is acyclic and the output is fed.
    pub fn validate(&self) -> Result<(), GraphError> {
        let output = self.output.ok_or(GraphError::NoOutputNode)?;

        let mut in_degree = Vec::new();
        let mut ready = BinaryHeap::new();
        let mut order = Vec::new();
        topological_sort(&self.nodes, &self.edges, &mut in_degree, &mut ready, &mut order);
        if order.len() != self.node_count() {
            return Err(GraphError::CycleDetected);
        }

        let out = &self.nodes[output];
        if out.node.can_accept_input()
            && out.incoming.is_empty()
            && self.input != Some(output)
        {
            return Err(GraphError::OutputUnconnected(out.id.clone()));
        }
        Ok(())
    }

    fn refresh_order(&mut self) {
        if !self.order_dirty {
            return;
        }
        topological_sort(
            &self.nodes,
            &self.edges,
            &mut self.in_degree,
            &mut self.ready,
            &mut self.order,
        );
        if self.order.len() != self.index.len() {
            #[cfg(feature = "tracing")]
            tracing::debug!("graph_order: cycle detected, order cleared");
            self.order.clear();
        }
        self.order_dirty = false;
    }

    // --- Probes ---

    /// Push every node's output into its probe while processing.
    ///
    /// Probes are allocated here, for nodes that lack one, and for nodes
    /// added while probing is on. Call off the audio thread.
    pub fn set_probing_enabled(&mut self, enabled: bool) {
        self.probing = enabled;
        if enabled {
            for n in &mut self.nodes {
                if n.probe.is_none() {
                    n.probe = Some(Arc::new(ProbeBuffer::new(self.probe_capacity)));
                }
            }
        }
    }

    /// Capacity of probes allocated from now on.
    pub fn set_probe_capacity(&mut self, capacity: usize) {
        self.probe_capacity = capacity.max(1);
    }

    /// Whether probing is on.
    pub fn is_probing_enabled(&self) -> bool {
        self.probing
    }

    /// Restrict probing to one node, or `None` for all nodes.
    pub fn set_active_probe(&mut self, id: Option<&str>) -> Result<(), GraphError> {
        self.active_probe = match id {
            Some(id) => Some(self.slot(id)?),
            None => None,
        };
        Ok(())
    }

    /// Probe buffer attached to a node. `None` until probing is enabled.
    pub fn probe(&self, id: &str) -> Option<Arc<ProbeBuffer>> {
        let slot = *self.index.get(id)?;
        self.nodes[slot].probe.clone()
    }

    // --- Execution ---

    /// Run one sample through the cached order.
    fn run(&mut self, input: f32) -> f32 {
        self.refresh_order();

        let Self {
            nodes,
            edges,
            order,
            input: input_slot,
            probing,
            active_probe,
            ..
        } = self;

        for &slot in order.iter() {
            let mut inputs = core::mem::take(&mut nodes[slot].inputs);
            inputs.fill(0.0);

            let mut fed = false;
            for &e in &nodes[slot].incoming {
                let Some(edge) = edges[e] else { continue };
                if let Some(acc) = inputs.get_mut(edge.input) {
                    *acc += nodes[edge.from].node.last_output();
                    fed = true;
                }
            }
            if !fed
                && *input_slot == Some(slot)
                && let Some(first) = inputs.first_mut()
            {
                *first = input;
            }

            let n = &mut nodes[slot];
            let out = if n.num_inputs > 1 {
                n.node.process_inputs(&inputs)
            } else {
                n.node.process(inputs.first().copied().unwrap_or(0.0))
            };
            n.inputs = inputs;

            if *probing
                && active_probe.is_none_or(|p| p == slot)
                && let Some(probe) = &n.probe
            {
                probe.push(out);
            }
        }

        self.last_output = match (self.output, self.order.is_empty()) {
            (Some(out), false) => self
                .nodes
                .get(out)
                .map_or(0.0, |n| n.node.last_output()),
            _ => 0.0,
        };
        self.last_output
    }

    // --- Internal helpers ---

    fn slot(&self, id: &str) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    fn id_of(&self, slot: usize) -> Option<&str> {
        self.nodes.get(slot).map(|n| n.id.as_str())
    }

    fn find_edge(&self, from: usize, to: usize, input: usize) -> Option<usize> {
        let node = self.nodes.get(from)?;
        node.outgoing.iter().copied().find(|&e| {
            self.edges[e].is_some_and(|edge| edge.to == to && edge.input == input)
        })
    }

    /// Depth-first reachability over outgoing edges.
    fn can_reach(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if visited[current] {
                continue;
            }
            visited[current] = true;
            stack.extend(
                self.nodes[current]
                    .outgoing
                    .iter()
                    .filter_map(|&e| self.edges[e].map(|edge| edge.to)),
            );
        }
        false
    }

    /// Store an edge without validation, reusing a freed slot when possible.
    fn link(&mut self, from: usize, to: usize, input: usize) {
        let edge = Some(Edge { from, to, input });
        let e = match self.free_edges.pop() {
            Some(e) => {
                self.edges[e] = edge;
                e
            }
            None => {
                self.edges.push(edge);
                self.edges.len() - 1
            }
        };
        self.nodes[from].outgoing.push(e);
        self.nodes[to].incoming.push(e);
        self.order_dirty = true;
    }

    fn remove_edge(&mut self, e: usize) {
        let Some(edge) = self.edges.get_mut(e).and_then(Option::take) else {
            return;
        };
        self.free_edges.push(e);
        self.nodes[edge.from].outgoing.retain(|&x| x != e);
        self.nodes[edge.to].incoming.retain(|&x| x != e);
        self.order_dirty = true;
        self.emit(|| {
            GraphEvent::ConnectionRemoved(Connection::new(
                self.id_of(edge.from).unwrap_or_default(),
                self.id_of(edge.to).unwrap_or_default(),
                edge.input,
            ))
        });
    }

    /// Connect two nodes bypassing every check, cycles included.
    #[cfg(test)]
    pub(crate) fn link_unchecked(&mut self, source: &str, dest: &str, input: usize) {
        if let (Ok(from), Ok(to)) = (self.slot(source), self.slot(dest)) {
            self.link(from, to, input);
        }
    }
}

/// Kahn's algorithm with a min-heap on slot index, so ready nodes run in
/// insertion order. `order` ends shorter than the live node count on a cycle.
fn topological_sort(
    nodes: &[GraphNode],
    edges: &[Option<Edge>],
    in_degree: &mut Vec<usize>,
    ready: &mut BinaryHeap<Reverse<usize>>,
    order: &mut Vec<usize>,
) {
    in_degree.clear();
    in_degree.resize(nodes.len(), 0);
    ready.clear();
    order.clear();

    for edge in edges.iter().flatten() {
        in_degree[edge.to] += 1;
    }
    for (slot, &degree) in in_degree.iter().enumerate() {
        if degree == 0 {
            ready.push(Reverse(slot));
        }
    }

    while let Some(Reverse(slot)) = ready.pop() {
        order.push(slot);
        for &e in &nodes[slot].outgoing {
            if let Some(edge) = edges[e] {
                in_degree[edge.to] -= 1;
                if in_degree[edge.to] == 0 {
                    ready.push(Reverse(edge.to));
                }
            }
        }
    }
}

impl SignalNode for SignalGraph {
    fn process(&mut self, input: f32) -> f32 {
        self.run(input)
    }

    fn reset(&mut self) {
        for n in &mut self.nodes {
            n.node.reset();
            n.inputs.fill(0.0);
        }
        self.last_output = 0.0;
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = max_block_size;
        for n in &mut self.nodes {
            n.node.prepare(sample_rate, max_block_size);
        }
        self.in_degree.reserve(self.nodes.len());
        self.order.reserve(self.nodes.len());
        self.refresh_order();
    }

    fn last_output(&self) -> f32 {
        self.last_output
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "Graph"
    }

    fn description(&self) -> &str {
        "Directed acyclic graph of processing nodes"
    }

    fn processing_type(&self) -> &str {
        "Signal Graph"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Graph
    }
}
