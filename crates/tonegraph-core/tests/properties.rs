//! Property-based tests for tonegraph-core.
//!
//! Topological order validity over random DAGs and filter stability over the
//! full parameter range.

use proptest::prelude::*;
use tonegraph_core::{
    FilterNode, FilterType, OutputNode, SignalGraph, SignalNode, StateVariableFilter,
};

/// Graph of pass-through nodes. Edges `(a, b)` with `a < b` in node-number
/// space always form a DAG regardless of insertion order.
fn random_dag(insertion: &[usize], edges: &[(usize, usize)]) -> SignalGraph {
    let mut graph = SignalGraph::default();
    for &n in insertion {
        graph
            .add_node(&format!("n{n}"), Box::new(Through::default()), 1)
            .unwrap();
    }
    for &(a, b) in edges {
        let (lo, hi) = (a.min(b), a.max(b));
        if lo != hi {
            // Duplicates are rejected; that is fine here.
            let _ = graph.connect(&format!("n{lo}"), &format!("n{hi}"), 0);
        }
    }
    graph
}

/// Pass-through that may also feed other nodes.
#[derive(Default)]
struct Through(f32);

impl SignalNode for Through {
    fn process(&mut self, input: f32) -> f32 {
        self.0 = input;
        input
    }
    fn reset(&mut self) {
        self.0 = 0.0;
    }
    fn prepare(&mut self, _: f32, _: usize) {}
    fn last_output(&self) -> f32 {
        self.0
    }
    fn sample_rate(&self) -> f32 {
        44100.0
    }
    fn name(&self) -> &str {
        "Through"
    }
}

fn dag_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<(usize, usize)>)> {
    (2usize..16).prop_flat_map(|n| {
        (
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec((0..n, 0..n), 0..40),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every node appears exactly once and every edge points forward.
    #[test]
    fn order_is_topological((insertion, edges) in dag_strategy()) {
        let mut graph = random_dag(&insertion, &edges);
        let order = graph.compute_processing_order();

        prop_assert_eq!(order.len(), insertion.len());
        let mut sorted = order.clone();
        sorted.sort();
        let mut ids = graph.node_ids();
        ids.sort();
        prop_assert_eq!(sorted, ids);

        let position = |id: &str| order.iter().position(|o| o == id);
        for c in graph.connections() {
            prop_assert!(position(&c.source) < position(&c.dest), "{} must precede {}", c.source, c.dest);
        }
    }

    /// Same construction, same order.
    #[test]
    fn order_is_deterministic((insertion, edges) in dag_strategy()) {
        let mut a = random_dag(&insertion, &edges);
        let mut b = random_dag(&insertion, &edges);
        prop_assert_eq!(a.compute_processing_order(), b.compute_processing_order());
    }

    /// Closing any back edge is rejected and leaves the order intact.
    #[test]
    fn back_edges_rejected((insertion, edges) in dag_strategy()) {
        let mut graph = random_dag(&insertion, &edges);
        let before = graph.compute_processing_order();
        for c in graph.connections() {
            prop_assert!(graph.connect(&c.dest, &c.source, 0).is_err());
        }
        prop_assert_eq!(graph.compute_processing_order(), before);
    }

    /// Any clamped parameter set yields a stable filter with finite output.
    #[test]
    fn svf_stable_and_finite(
        cutoff in 1.0f32..30000.0f32,
        q in 0.1f32..40.0f32,
        variant in 0usize..4,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut svf = StateVariableFilter::new(44100.0);
        svf.set_cutoff(cutoff);
        svf.set_resonance(q);
        svf.set_filter_type(FilterType::ALL[variant]);
        prop_assert!(svf.is_stable());
        prop_assert!(svf.poles().unwrap().iter().all(|p| p.norm() < 1.0));

        for _ in 0..32 {
            for &x in &input {
                let y = svf.process(x);
                prop_assert!(y.is_finite(), "cutoff={} q={} produced {}", cutoff, q, y);
            }
        }
    }

    /// A filter inside a graph produces exactly what it produces standalone.
    #[test]
    fn graph_is_transparent(
        cutoff in 50.0f32..15000.0f32,
        input in prop::collection::vec(-1.0f32..=1.0f32, 1..256),
    ) {
        let mut solo = StateVariableFilter::with_params(44100.0, FilterType::Lowpass, cutoff, 0.707);
        let mut graph = SignalGraph::default();
        graph.add_node("f", Box::new(solo.clone()), 1).unwrap();
        graph.add_node("out", Box::new(OutputNode::new()), 1).unwrap();
        graph.connect("f", "out", 0).unwrap();
        graph.set_input_node("f").unwrap();
        graph.set_output_node("out").unwrap();
        for x in input {
            prop_assert_eq!(graph.process(x), solo.process(x));
        }
    }
}
