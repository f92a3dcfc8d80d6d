//! Multi-input mixer and the terminal output node.

use crate::node::{NodeKind, SignalNode};

/// Default number of mixer inputs.
pub const DEFAULT_MIXER_INPUTS: usize = 2;

/// Weighted sum of N inputs.
///
/// In a graph, edges landing on the same input index are summed first; the
/// mixer then applies one gain per index:
///
/// ```text
/// y = Σᵢ gainᵢ · inputᵢ
/// ```
///
/// Used standalone through [`process`](SignalNode::process), the single value
/// is treated as input 0.
#[derive(Debug, Clone)]
pub struct MixerNode {
    gains: Vec<f32>,
    last_output: f32,
    sample_rate: f32,
}

impl Default for MixerNode {
    fn default() -> Self {
        Self::new(DEFAULT_MIXER_INPUTS)
    }
}

impl MixerNode {
    /// Create a mixer with `num_inputs` inputs at unity gain (at least one).
    pub fn new(num_inputs: usize) -> Self {
        Self {
            gains: vec![1.0; num_inputs.max(1)],
            last_output: 0.0,
            sample_rate: 44100.0,
        }
    }

    /// Change the input count. New inputs start at unity gain.
    pub fn set_num_inputs(&mut self, num_inputs: usize) {
        self.gains.resize(num_inputs.max(1), 1.0);
    }

    /// Set the gain of one input. Out-of-range indices are ignored.
    pub fn set_input_gain(&mut self, index: usize, gain: f32) {
        if let Some(g) = self.gains.get_mut(index) {
            *g = gain;
        }
    }

    /// Gain of one input, 1.0 for out-of-range indices.
    pub fn input_gain(&self, index: usize) -> f32 {
        self.gains.get(index).copied().unwrap_or(1.0)
    }

    /// All gains in index order.
    pub fn gains(&self) -> &[f32] {
        &self.gains
    }
}

impl SignalNode for MixerNode {
    fn process(&mut self, input: f32) -> f32 {
        self.last_output = input * self.gains[0];
        self.last_output
    }

    fn process_inputs(&mut self, inputs: &[f32]) -> f32 {
        self.last_output = inputs
            .iter()
            .enumerate()
            .map(|(i, x)| x * self.input_gain(i))
            .sum();
        self.last_output
    }

    fn reset(&mut self) {
        self.last_output = 0.0;
    }

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
    }

    fn last_output(&self) -> f32 {
        self.last_output
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "Mixer"
    }

    fn description(&self) -> &str {
        "Weighted sum of its input signals"
    }

    fn processing_type(&self) -> &str {
        "Signal Mixer"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Mixer
    }

    fn num_inputs(&self) -> usize {
        self.gains.len()
    }

    fn is_lti(&self) -> bool {
        true
    }

    fn as_mixer(&self) -> Option<&MixerNode> {
        Some(self)
    }

    fn as_mixer_mut(&mut self) -> Option<&mut MixerNode> {
        Some(self)
    }
}

/// Terminal node: passes its input through and feeds nothing downstream.
#[derive(Debug, Clone)]
pub struct OutputNode {
    last_output: f32,
    sample_rate: f32,
}

impl Default for OutputNode {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputNode {
    /// Create an output node.
    pub fn new() -> Self {
        Self {
            last_output: 0.0,
            sample_rate: 44100.0,
        }
    }
}

impl SignalNode for OutputNode {
    fn process(&mut self, input: f32) -> f32 {
        self.last_output = input;
        input
    }

    fn reset(&mut self) {
        self.last_output = 0.0;
    }

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
    }

    fn last_output(&self) -> f32 {
        self.last_output
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "Output"
    }

    fn description(&self) -> &str {
        "Final audio output"
    }

    fn processing_type(&self) -> &str {
        "Audio Output"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Output
    }

    fn can_produce_output(&self) -> bool {
        false
    }

    fn is_lti(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_weighted_sum() {
        let mut mixer = MixerNode::new(3);
        mixer.set_input_gain(1, 0.5);
        mixer.set_input_gain(2, -1.0);
        assert_eq!(mixer.process_inputs(&[1.0, 1.0, 0.25]), 1.25);
        assert_eq!(mixer.last_output(), 1.25);
    }

    #[test]
    fn test_mixer_inputs_past_gains_pass_at_unity() {
        let mut mixer = MixerNode::new(2);
        mixer.set_input_gain(0, 0.5);
        assert_eq!(mixer.process_inputs(&[2.0, 0.0, 0.0, 1.0]), 2.0);
    }

    #[test]
    fn test_mixer_gain_bounds() {
        let mut mixer = MixerNode::new(2);
        mixer.set_input_gain(7, 0.0);
        assert_eq!(mixer.input_gain(7), 1.0);
        assert_eq!(mixer.gains(), &[1.0, 1.0]);
        mixer.set_num_inputs(4);
        assert_eq!(mixer.num_inputs(), 4);
        mixer.set_num_inputs(0);
        assert_eq!(mixer.num_inputs(), 1);
    }

    #[test]
    fn test_mixer_single_input_uses_first_gain() {
        let mut mixer = MixerNode::new(2);
        mixer.set_input_gain(0, 0.5);
        assert_eq!(mixer.process(2.0), 1.0);
        assert_eq!(mixer.kind(), NodeKind::Mixer);
        assert!(mixer.as_mixer().is_some());
    }

    #[test]
    fn test_output_passthrough() {
        let mut out = OutputNode::new();
        assert_eq!(out.process(0.3), 0.3);
        assert_eq!(out.last_output(), 0.3);
        assert!(out.can_accept_input());
        assert!(!out.can_produce_output());
        out.reset();
        assert_eq!(out.last_output(), 0.0);
    }
}
