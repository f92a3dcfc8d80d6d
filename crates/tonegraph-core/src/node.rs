//! The node capability interface.
//!
//! Every processing unit placed in a [`SignalGraph`](crate::SignalGraph) or
//! [`SignalChain`](crate::SignalChain) implements [`SignalNode`]. The trait has
//! three layers:
//!
//! - **Real-time surface**: [`process`](SignalNode::process),
//!   [`reset`](SignalNode::reset), [`last_output`](SignalNode::last_output).
//!   These never allocate, lock, or fail.
//! - **Setup**: [`prepare`](SignalNode::prepare), called off the audio thread
//!   when the stream starts or its format changes. May allocate.
//! - **Introspection**: identification strings, connection capabilities, and
//!   optional analysis. Nodes without analysis return `None` from every
//!   analysis method.
//!
//! Concrete node types are recovered through the explicit [`NodeKind`] tag
//! and the capability accessors ([`as_filter_mut`](SignalNode::as_filter_mut),
//! [`as_oscillator_mut`](SignalNode::as_oscillator_mut), ...), never through
//! downcasting.

use core::fmt;

use num_complex::Complex64;
use thiserror::Error;

use crate::analysis::{FrequencyResponse, TransferFunction};
use crate::filter::FilterNode;
use crate::mixer::MixerNode;
use crate::oscillator::OscillatorNode;

/// Explicit tag describing what a node is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Sound source driven by a phase accumulator.
    Oscillator,
    /// Linear filter with analytic introspection.
    Filter,
    /// Multi-input summing node.
    Mixer,
    /// Terminal pass-through node.
    Output,
    /// Nested [`SignalChain`](crate::SignalChain).
    Chain,
    /// Nested [`SignalGraph`](crate::SignalGraph).
    Graph,
    /// Anything else.
    #[default]
    Custom,
}

impl NodeKind {
    /// Returns a human-readable name for the kind.
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Oscillator => "Oscillator",
            NodeKind::Filter => "Filter",
            NodeKind::Mixer => "Mixer",
            NodeKind::Output => "Output",
            NodeKind::Chain => "Chain",
            NodeKind::Graph => "Graph",
            NodeKind::Custom => "Custom",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing a waveform or filter-type name fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseNameError {
    /// What was being parsed (e.g. `"waveform"`).
    pub what: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseNameError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

/// Contract implemented by every processing unit.
///
/// `Send` is required so a fully built graph can be handed to the audio
/// thread.
///
/// # Real-time Safety
///
/// [`process`](Self::process), [`process_inputs`](Self::process_inputs),
/// [`reset`](Self::reset) and [`last_output`](Self::last_output) are called on
/// the audio thread: no allocation, no locking, no panics.
///
/// # Example
///
/// ```rust
/// use tonegraph_core::{NodeKind, SignalNode};
///
/// struct Gain {
///     gain: f32,
///     last: f32,
///     sample_rate: f32,
/// }
///
/// impl SignalNode for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         self.last = input * self.gain;
///         self.last
///     }
///     fn reset(&mut self) {
///         self.last = 0.0;
///     }
///     fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
///         self.sample_rate = sample_rate;
///     }
///     fn last_output(&self) -> f32 {
///         self.last
///     }
///     fn sample_rate(&self) -> f32 {
///         self.sample_rate
///     }
///     fn name(&self) -> &str {
///         "Gain"
///     }
/// }
///
/// let mut gain = Gain { gain: 0.5, last: 0.0, sample_rate: 48000.0 };
/// assert_eq!(gain.process(1.0), 0.5);
/// assert_eq!(gain.kind(), NodeKind::Custom);
/// assert!(gain.transfer_function().is_none());
/// ```
pub trait SignalNode: Send {
    // --- Real-time surface ---

    /// Process one sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process one sample given per-input-index values.
    ///
    /// Called by the graph for nodes declared with more than one input. The
    /// default sums all inputs and forwards to [`process`](Self::process).
    fn process_inputs(&mut self, inputs: &[f32]) -> f32 {
        let sum: f32 = inputs.iter().sum();
        self.process(sum)
    }

    /// Process a block sample by sample.
    ///
    /// `input` and `output` must have the same length.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.process(*x);
        }
    }

    /// Clear all internal state (phase, filter memory, last output).
    fn reset(&mut self);

    /// Configure for a sample rate and maximum block size.
    ///
    /// Called off the audio thread; may allocate.
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize);

    /// The value returned by the most recent `process` call.
    fn last_output(&self) -> f32;

    /// Sample rate set by the last `prepare`.
    fn sample_rate(&self) -> f32;

    // --- Identification ---

    /// Short display name.
    fn name(&self) -> &str;

    /// One-line description for tooltips.
    fn description(&self) -> &str {
        ""
    }

    /// What kind of processing this node performs ("Sound Source", ...).
    fn processing_type(&self) -> &str {
        "Processor"
    }

    /// Explicit kind tag.
    fn kind(&self) -> NodeKind {
        NodeKind::Custom
    }

    /// Number of input indices the node understands.
    fn num_inputs(&self) -> usize {
        1
    }

    // --- Connection capabilities ---

    /// Whether other nodes may connect into this one.
    fn can_accept_input(&self) -> bool {
        true
    }

    /// Whether this node may feed other nodes.
    fn can_produce_output(&self) -> bool {
        true
    }

    // --- Analysis ---

    /// True for linear time-invariant nodes.
    fn is_lti(&self) -> bool {
        false
    }

    /// True when the analysis methods return data.
    fn supports_analysis(&self) -> bool {
        false
    }

    /// Transfer function derived from the live coefficients.
    fn transfer_function(&self) -> Option<TransferFunction> {
        None
    }

    /// Poles in the z-plane.
    fn poles(&self) -> Option<Vec<Complex64>> {
        self.transfer_function().map(|tf| tf.poles())
    }

    /// Zeros in the z-plane.
    fn zeros(&self) -> Option<Vec<Complex64>> {
        self.transfer_function().map(|tf| tf.zeros())
    }

    /// Frequency response at `num_points` log-spaced points, 20 Hz to Nyquist.
    fn frequency_response(&self, num_points: usize) -> Option<FrequencyResponse> {
        let sample_rate = f64::from(self.sample_rate());
        self.transfer_function()
            .map(|tf| tf.frequency_response(sample_rate, num_points))
    }

    /// First `num_samples` of the impulse response.
    fn impulse_response(&self, num_samples: usize) -> Option<Vec<f32>> {
        self.transfer_function()
            .map(|tf| tf.impulse_response(num_samples))
    }

    /// Difference equation as text.
    fn equation(&self) -> Option<String> {
        self.transfer_function().map(|tf| tf.equation())
    }

    // --- Capability accessors ---

    /// Filter controls, if this node is a filter.
    fn as_filter(&self) -> Option<&dyn FilterNode> {
        None
    }

    /// Mutable filter controls, if this node is a filter.
    fn as_filter_mut(&mut self) -> Option<&mut dyn FilterNode> {
        None
    }

    /// Oscillator controls, if this node is an oscillator.
    fn as_oscillator(&self) -> Option<&dyn OscillatorNode> {
        None
    }

    /// Mutable oscillator controls, if this node is an oscillator.
    fn as_oscillator_mut(&mut self) -> Option<&mut dyn OscillatorNode> {
        None
    }

    /// Mixer gains, if this node is a mixer.
    fn as_mixer(&self) -> Option<&MixerNode> {
        None
    }

    /// Mutable mixer gains, if this node is a mixer.
    fn as_mixer_mut(&mut self) -> Option<&mut MixerNode> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain {
        factor: f32,
        last: f32,
    }

    impl SignalNode for Gain {
        fn process(&mut self, input: f32) -> f32 {
            self.last = input * self.factor;
            self.last
        }
        fn reset(&mut self) {
            self.last = 0.0;
        }
        fn prepare(&mut self, _sample_rate: f32, _max_block_size: usize) {}
        fn last_output(&self) -> f32 {
            self.last
        }
        fn sample_rate(&self) -> f32 {
            48000.0
        }
        fn name(&self) -> &str {
            "Gain"
        }
    }

    struct HalfDelay;

    impl SignalNode for HalfDelay {
        fn process(&mut self, input: f32) -> f32 {
            input
        }
        fn reset(&mut self) {}
        fn prepare(&mut self, _: f32, _: usize) {}
        fn last_output(&self) -> f32 {
            0.0
        }
        fn sample_rate(&self) -> f32 {
            1000.0
        }
        fn name(&self) -> &str {
            "HalfDelay"
        }
        fn transfer_function(&self) -> Option<TransferFunction> {
            Some(TransferFunction::new(vec![0.5, 0.5], vec![1.0]))
        }
    }

    #[test]
    fn test_defaults_report_no_analysis() {
        let gain = Gain {
            factor: 2.0,
            last: 0.0,
        };
        assert!(!gain.supports_analysis());
        assert!(gain.transfer_function().is_none());
        assert!(gain.poles().is_none());
        assert!(gain.zeros().is_none());
        assert!(gain.frequency_response(16).is_none());
        assert!(gain.impulse_response(16).is_none());
        assert!(gain.as_filter().is_none());
        assert!(gain.as_oscillator().is_none());
        assert_eq!(gain.num_inputs(), 1);
        assert!(gain.can_accept_input() && gain.can_produce_output());
    }

    #[test]
    fn test_process_inputs_sums() {
        let mut gain = Gain {
            factor: 2.0,
            last: 0.0,
        };
        assert_eq!(gain.process_inputs(&[0.25, 0.5]), 1.5);
        assert_eq!(gain.last_output(), 1.5);
        gain.reset();
        assert_eq!(gain.last_output(), 0.0);
    }

    #[test]
    fn test_process_block() {
        let mut gain = Gain {
            factor: 3.0,
            last: 0.0,
        };
        let input = [1.0, -1.0, 0.5];
        let mut output = [0.0; 3];
        gain.process_block(&input, &mut output);
        assert_eq!(output, [3.0, -3.0, 1.5]);
    }

    #[test]
    fn test_analysis_derived_from_transfer_function() {
        let node = HalfDelay;
        let zeros = node.zeros().unwrap();
        assert_eq!(zeros.len(), 1);
        assert!((zeros[0].re + 1.0).abs() < 1e-12);
        assert!(node.poles().unwrap().is_empty());
        assert_eq!(node.impulse_response(3).unwrap(), vec![0.5, 0.5, 0.0]);
        let response = node.frequency_response(8).unwrap();
        assert_eq!(response.len(), 8);
        assert_eq!(response.sample_rate, 1000.0);
        assert!(node.equation().unwrap().contains("x[n-1]"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(NodeKind::Filter.to_string(), "Filter");
        assert_eq!(NodeKind::default(), NodeKind::Custom);
    }
}
