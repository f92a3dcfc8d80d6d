//! Per-node bookkeeping inside the graph.

use std::sync::Arc;

use crate::node::SignalNode;
use crate::probe::ProbeBuffer;

/// A node owned by the graph, with its routing lists.
pub(crate) struct GraphNode {
    pub id: String,
    pub node: Box<dyn SignalNode>,
    /// Declared input count (at least 1).
    pub num_inputs: usize,
    /// Edge slots arriving at this node.
    pub incoming: Vec<usize>,
    /// Edge slots leaving this node.
    pub outgoing: Vec<usize>,
    /// Per-input scratch, reused every sample.
    pub inputs: Vec<f32>,
    /// Allocated once probing is enabled.
    pub probe: Option<Arc<ProbeBuffer>>,
}

impl GraphNode {
    pub fn new(id: String, node: Box<dyn SignalNode>, num_inputs: usize) -> Self {
        let num_inputs = num_inputs.max(1);
        Self {
            id,
            node,
            num_inputs,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            inputs: vec![0.0; num_inputs],
            probe: None,
        }
    }
}
