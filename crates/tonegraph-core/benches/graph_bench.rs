//! Criterion benchmarks for the signal graph.
//!
//! Measures scheduling overhead with trivial `Gain` nodes and realistic cost
//! with state-variable filters. Two axes:
//!
//! - **Order** - rebuilding the cached topological order after an edit
//! - **Execute** - per-sample `process()` throughput over a block
//!
//! Run with: `cargo bench -p tonegraph-core -- graph/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tonegraph_core::{
    FilterType, MixerNode, ModificationManager, OutputNode, SignalGraph, SignalNode,
    StateVariableFilter,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZE: usize = 256;
const NODE_COUNTS: &[usize] = &[4, 16, 64];

// ---------------------------------------------------------------------------
// Trivial Gain node, isolates graph overhead from DSP cost
// ---------------------------------------------------------------------------

struct Gain(f32, f32);

impl SignalNode for Gain {
    fn process(&mut self, input: f32) -> f32 {
        self.1 = input * self.0;
        self.1
    }
    fn reset(&mut self) {
        self.1 = 0.0;
    }
    fn prepare(&mut self, _: f32, _: usize) {}
    fn last_output(&self) -> f32 {
        self.1
    }
    fn sample_rate(&self) -> f32 {
        SAMPLE_RATE
    }
    fn name(&self) -> &str {
        "Gain"
    }
}

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

fn make_linear(n: usize) -> SignalGraph {
    let mut graph = SignalGraph::new(SAMPLE_RATE, BLOCK_SIZE);
    for i in 0..n {
        graph
            .add_node(&format!("g{i}"), Box::new(Gain(0.99, 0.0)), 1)
            .unwrap();
        if i > 0 {
            graph
                .connect(&format!("g{}", i - 1), &format!("g{i}"), 0)
                .unwrap();
        }
    }
    graph.set_input_node("g0").unwrap();
    graph.set_output_node(&format!("g{}", n - 1)).unwrap();
    graph
}

fn make_filter_bank(voices: usize) -> SignalGraph {
    let mut graph = SignalGraph::new(SAMPLE_RATE, BLOCK_SIZE);
    graph.add_node("in", Box::new(MixerNode::new(1)), 1).unwrap();
    graph
        .add_node("mix", Box::new(MixerNode::new(voices)), voices)
        .unwrap();
    for v in 0..voices {
        let id = format!("f{v}");
        let cutoff = 200.0 * (v + 1) as f32;
        let svf = StateVariableFilter::with_params(SAMPLE_RATE, FilterType::Bandpass, cutoff, 4.0);
        graph.add_node(&id, Box::new(svf), 1).unwrap();
        graph.connect("in", &id, 0).unwrap();
        graph.connect(&id, "mix", v).unwrap();
    }
    graph.add_node("out", Box::new(OutputNode::new()), 1).unwrap();
    graph.connect("mix", "out", 0).unwrap();
    graph.set_input_node("in").unwrap();
    graph.set_output_node("out").unwrap();
    graph
}

// ---------------------------------------------------------------------------
// Order benchmarks
// ---------------------------------------------------------------------------

fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/order");
    for &n in NODE_COUNTS {
        group.bench_with_input(BenchmarkId::new("linear", n), &n, |b, &n| {
            let mut graph = make_linear(n);
            let last = format!("g{}", n - 1);
            b.iter(|| {
                // Toggle one edge to dirty the cached order.
                graph.disconnect(&format!("g{}", n - 2), &last);
                graph
                    .connect(&format!("g{}", n - 2), &last, 0)
                    .unwrap();
                black_box(graph.compute_processing_order());
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Execute benchmarks
// ---------------------------------------------------------------------------

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/execute");
    let input = vec![0.5f32; BLOCK_SIZE];

    for &n in NODE_COUNTS {
        let mut graph = make_linear(n);
        group.bench_with_input(BenchmarkId::new("linear_block256", n), &n, |b, _| {
            b.iter(|| {
                for &x in &input {
                    black_box(graph.process(black_box(x)));
                }
            });
        });
    }

    for &voices in &[4usize, 16] {
        let mut graph = make_filter_bank(voices);
        group.bench_with_input(
            BenchmarkId::new("filter_bank_block256", voices),
            &voices,
            |b, _| {
                b.iter(|| {
                    for &x in &input {
                        black_box(graph.process(black_box(x)));
                    }
                });
            },
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Modification drain
// ---------------------------------------------------------------------------

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/modifications");

    group.bench_function("empty_drain", |b| {
        let mut graph = make_linear(4);
        let mut manager = ModificationManager::new();
        b.iter(|| black_box(manager.process_pending_modifications(&mut graph)));
    });

    group.bench_function("parametric_drain_8", |b| {
        let mut graph = make_filter_bank(4);
        let mut manager = ModificationManager::new();
        let handle = manager.handle();
        b.iter(|| {
            for i in 0..8 {
                handle.queue_parametric_modification(
                    move |g| {
                        if let Some(f) = g.filter_mut("f0") {
                            f.set_cutoff(300.0 + i as f32);
                        }
                    },
                    "cutoff",
                );
            }
            black_box(manager.process_pending_modifications(&mut graph));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_order, bench_execute, bench_drain);
criterion_main!(benches);
