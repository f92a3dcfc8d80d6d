//! Node and connection configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tonegraph_core::{
    FilterNode, FilterType, MixerNode, NodeKind, OscillatorNode, ParseNameError, SignalNode,
    Waveform, db_to_linear,
};
use tonegraph_registry::NodeRegistry;

use crate::error::ConfigError;

/// Configuration for a single node in a graph.
///
/// `subtype` selects the waveform of an oscillator or the response of a
/// filter. Parameters are strings so values can carry units.
///
/// # Parameters by node type
///
/// | Type         | Parameters                                                  |
/// |--------------|-------------------------------------------------------------|
/// | `oscillator` | `waveform`, `frequency`, `octave`, `detune`, `band_limited`, `phase` |
/// | `filter`     | `type`, `cutoff`, `resonance` (or `q`)                      |
/// | `mixer`      | `gain0`, `gain1`, ... (linear or dB)                        |
/// | `output`     | none                                                        |
///
/// # Example
///
/// ```rust
/// use tonegraph_config::NodeConfig;
///
/// let config = NodeConfig::new("filter", "lp")
///     .with_subtype("lowpass")
///     .with_param("cutoff", "1.2kHz")
///     .with_param("resonance", "0.707");
///
/// assert_eq!(config.node_type, "filter");
/// assert_eq!(config.parse_param("cutoff"), Some(1200.0));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// Registry type name (e.g. "oscillator", "svf").
    #[serde(rename = "type")]
    pub node_type: String,

    /// Unique node id within the graph.
    pub id: String,

    /// Waveform or filter response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Declared input count; the node's own count when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_inputs: Option<usize>,

    /// Node parameters as key-value pairs.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl NodeConfig {
    /// Create a node configuration with no subtype and no parameters.
    pub fn new(node_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            id: id.into(),
            subtype: None,
            num_inputs: None,
            params: BTreeMap::new(),
        }
    }

    /// Set the subtype.
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Set the declared input count.
    pub fn with_num_inputs(mut self, num_inputs: usize) -> Self {
        self.num_inputs = Some(num_inputs);
        self
    }

    /// Add a parameter to the configuration.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Get a parameter value.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parse a parameter value as f32. See [`parse_param_value`].
    pub fn parse_param(&self, key: &str) -> Option<f32> {
        parse_param_value(self.params.get(key)?)
    }

    /// Create the node through the registry and apply subtype and parameters.
    pub fn instantiate(
        &self,
        registry: &NodeRegistry,
        sample_rate: f32,
    ) -> Result<Box<dyn SignalNode>, ConfigError> {
        let mut node = registry
            .create(&self.node_type, sample_rate)
            .ok_or_else(|| ConfigError::UnknownNodeType(self.node_type.clone()))?;

        match node.kind() {
            NodeKind::Oscillator => {
                if let Some(osc) = node.as_oscillator_mut() {
                    self.configure_oscillator(osc)?;
                }
            }
            NodeKind::Filter => {
                if let Some(filter) = node.as_filter_mut() {
                    self.configure_filter(filter)?;
                }
            }
            NodeKind::Mixer => {
                if let Some(mixer) = node.as_mixer_mut() {
                    self.configure_mixer(mixer)?;
                }
            }
            _ => self.reject_params()?,
        }
        Ok(node)
    }

    fn number(&self, key: &str, value: &str) -> Result<f32, ConfigError> {
        parse_param_value(value).ok_or_else(|| {
            ConfigError::invalid_param(&self.id, key, format!("cannot parse '{value}' as a number"))
        })
    }

    fn waveform(&self, key: &str, value: &str) -> Result<Waveform, ConfigError> {
        value
            .parse()
            .map_err(|e: ParseNameError| ConfigError::invalid_param(&self.id, key, e.to_string()))
    }

    fn filter_type(&self, key: &str, value: &str) -> Result<FilterType, ConfigError> {
        value
            .parse()
            .map_err(|e: ParseNameError| ConfigError::invalid_param(&self.id, key, e.to_string()))
    }

    fn configure_oscillator(&self, osc: &mut dyn OscillatorNode) -> Result<(), ConfigError> {
        if let Some(subtype) = self.subtype.as_deref()
            && !subtype.eq_ignore_ascii_case("polyblep")
        {
            osc.set_waveform(self.waveform("subtype", subtype)?);
        }
        for (key, value) in &self.params {
            match key.as_str() {
                "waveform" => osc.set_waveform(self.waveform(key, value)?),
                "frequency" | "freq" => osc.set_frequency(self.number(key, value)?),
                "octave" => osc.set_octave_offset(self.number(key, value)?.round() as i32),
                "detune" | "cents" => osc.set_detune_cents(self.number(key, value)?),
                "band_limited" => {
                    let enabled = parse_bool(value).ok_or_else(|| {
                        ConfigError::invalid_param(&self.id, key, format!("expected a boolean, got '{value}'"))
                    })?;
                    osc.set_band_limited(enabled);
                }
                "phase" => osc.set_phase(f64::from(self.number(key, value)?)),
                _ => return Err(ConfigError::invalid_param(&self.id, key, "unknown oscillator parameter")),
            }
        }
        Ok(())
    }

    fn configure_filter(&self, filter: &mut dyn FilterNode) -> Result<(), ConfigError> {
        if let Some(subtype) = self.subtype.as_deref()
            && !subtype.eq_ignore_ascii_case("svf")
        {
            filter.set_filter_type(self.filter_type("subtype", subtype)?);
        }
        for (key, value) in &self.params {
            match key.as_str() {
                "type" => filter.set_filter_type(self.filter_type(key, value)?),
                "cutoff" => filter.set_cutoff(self.number(key, value)?),
                "resonance" | "q" => filter.set_resonance(self.number(key, value)?),
                _ => return Err(ConfigError::invalid_param(&self.id, key, "unknown filter parameter")),
            }
        }
        Ok(())
    }

    fn configure_mixer(&self, mixer: &mut MixerNode) -> Result<(), ConfigError> {
        if let Some(n) = self.num_inputs {
            mixer.set_num_inputs(n);
        }
        for (key, value) in &self.params {
            let index = key
                .strip_prefix("gain")
                .and_then(|i| i.parse::<usize>().ok())
                .filter(|&i| i < mixer.gains().len())
                .ok_or_else(|| ConfigError::invalid_param(&self.id, key, "unknown mixer parameter"))?;
            mixer.set_input_gain(index, self.number(key, value)?);
        }
        Ok(())
    }

    fn reject_params(&self) -> Result<(), ConfigError> {
        match self.params.keys().next() {
            Some(key) => Err(ConfigError::invalid_param(
                &self.id,
                key,
                format!("'{}' nodes take no parameters", self.node_type),
            )),
            None => Ok(()),
        }
    }

    /// Describe a live node. `num_inputs` is its declared count in the graph.
    pub fn capture(
        id: &str,
        node: &dyn SignalNode,
        num_inputs: usize,
    ) -> Result<Self, ConfigError> {
        let unsupported = || ConfigError::UnsupportedNode {
            node: id.to_string(),
            kind: node.kind(),
        };
        let mut config = match node.kind() {
            NodeKind::Oscillator => {
                let osc = node.as_oscillator().ok_or_else(unsupported)?;
                let mut config = NodeConfig::new("oscillator", id)
                    .with_subtype(osc.waveform().id())
                    .with_param("frequency", osc.frequency().to_string());
                if osc.octave_offset() != 0 {
                    config = config.with_param("octave", osc.octave_offset().to_string());
                }
                if osc.detune_cents() != 0.0 {
                    config = config.with_param("detune", osc.detune_cents().to_string());
                }
                if !osc.is_band_limited() {
                    config = config.with_param("band_limited", "false");
                }
                config
            }
            NodeKind::Filter => {
                let filter = node.as_filter().ok_or_else(unsupported)?;
                NodeConfig::new("filter", id)
                    .with_subtype(filter.filter_type().id())
                    .with_param("cutoff", filter.cutoff().to_string())
                    .with_param("resonance", filter.resonance().to_string())
            }
            NodeKind::Mixer => {
                let mixer = node.as_mixer().ok_or_else(unsupported)?;
                let mut config = NodeConfig::new("mixer", id);
                for (i, gain) in mixer.gains().iter().enumerate() {
                    if *gain != 1.0 {
                        config = config.with_param(format!("gain{i}"), gain.to_string());
                    }
                }
                config
            }
            NodeKind::Output => NodeConfig::new("output", id),
            _ => return Err(unsupported()),
        };
        if num_inputs != 1 {
            config.num_inputs = Some(num_inputs);
        }
        Ok(config)
    }
}

/// Configuration for one edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Producing node id.
    pub source: String,
    /// Receiving node id.
    pub dest: String,
    /// Input index on `dest`.
    #[serde(default)]
    pub input: usize,
}

impl ConnectionConfig {
    /// Edge into input `input` of `dest`.
    pub fn new(source: impl Into<String>, dest: impl Into<String>, input: usize) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            input,
        }
    }
}

/// Parse a parameter value string into an f32.
///
/// Supports various formats:
/// - Plain numbers: "0.5", "1.2", "-0.3"
/// - Percentages: "50%", "120%" (divided by 100)
/// - Decibels: "-6dB", "+3dB" (converted to linear gain)
/// - Time in ms: "100ms" (converted to seconds)
/// - Time in s: "1.5s" (kept as seconds)
/// - Frequency in Hz: "440Hz"
/// - Frequency in kHz: "1.2kHz" (converted to Hz)
/// - Cents: "7ct", "-12cents"
pub fn parse_param_value(value: &str) -> Option<f32> {
    let value = value.trim();

    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse::<f32>().ok().map(|v| v / 100.0);
    }

    if let Some(db) = value
        .strip_suffix("dB")
        .or_else(|| value.strip_suffix("db"))
    {
        return db.trim().parse::<f32>().ok().map(db_to_linear);
    }

    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse::<f32>().ok().map(|v| v / 1000.0);
    }

    if let Some(cents) = value
        .strip_suffix("cents")
        .or_else(|| value.strip_suffix("ct"))
    {
        return cents.trim().parse::<f32>().ok();
    }

    // Seconds ("ms" and "cents" handled above)
    if let Some(s) = value.strip_suffix('s') {
        return s.trim().parse::<f32>().ok();
    }

    if let Some(khz) = value
        .strip_suffix("kHz")
        .or_else(|| value.strip_suffix("khz"))
    {
        return khz.trim().parse::<f32>().ok().map(|v| v * 1000.0);
    }

    if let Some(hz) = value
        .strip_suffix("Hz")
        .or_else(|| value.strip_suffix("hz"))
    {
        return hz.trim().parse::<f32>().ok();
    }

    value.parse::<f32>().ok()
}

/// Parse "true"/"false"/"on"/"off"/"yes"/"no"/"1"/"0".
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonegraph_core::{MixerNode, OutputNode, SignalGraph};

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_param_value("0.5"), Some(0.5));
        assert_eq!(parse_param_value("  -0.3 "), Some(-0.3));
        assert_eq!(parse_param_value("50%"), Some(0.5));
        assert_eq!(parse_param_value("100ms"), Some(0.1));
        assert_eq!(parse_param_value("1.5s"), Some(1.5));
        assert_eq!(parse_param_value("440Hz"), Some(440.0));
        assert_eq!(parse_param_value("1.5kHz"), Some(1500.0));
        assert_eq!(parse_param_value("7ct"), Some(7.0));
        assert_eq!(parse_param_value("-12cents"), Some(-12.0));
        let half = parse_param_value("-6dB").unwrap();
        assert!((half - 0.5).abs() < 0.05);
        assert_eq!(parse_param_value("loud"), None);
        assert_eq!(parse_param_value("abc%"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_instantiate_oscillator() {
        let registry = NodeRegistry::new();
        let node = NodeConfig::new("osc", "o")
            .with_subtype("Square")
            .with_param("frequency", "220Hz")
            .with_param("octave", "1")
            .with_param("detune", "-5ct")
            .with_param("band_limited", "false")
            .instantiate(&registry, 48000.0)
            .unwrap();
        let osc = node.as_oscillator().unwrap();
        assert_eq!(osc.waveform(), Waveform::Square);
        assert_eq!(osc.frequency(), 220.0);
        assert_eq!(osc.octave_offset(), 1);
        assert_eq!(osc.detune_cents(), -5.0);
        assert!(!osc.is_band_limited());
    }

    #[test]
    fn test_instantiate_filter() {
        let registry = NodeRegistry::new();
        let node = NodeConfig::new("svf", "f")
            .with_subtype("bp")
            .with_param("cutoff", "2kHz")
            .with_param("q", "4")
            .instantiate(&registry, 48000.0)
            .unwrap();
        let filter = node.as_filter().unwrap();
        assert_eq!(filter.filter_type(), FilterType::Bandpass);
        assert_eq!(filter.cutoff(), 2000.0);
        assert_eq!(filter.resonance(), 4.0);
    }

    #[test]
    fn test_implementation_subtypes_are_accepted() {
        let registry = NodeRegistry::new();
        let osc = NodeConfig::new("oscillator", "o")
            .with_subtype("polyblep")
            .instantiate(&registry, 48000.0)
            .unwrap();
        assert_eq!(osc.as_oscillator().unwrap().waveform(), Waveform::Sine);
        assert!(
            NodeConfig::new("filter", "f")
                .with_subtype("svf")
                .instantiate(&registry, 48000.0)
                .is_ok()
        );
    }

    #[test]
    fn test_instantiate_mixer_gains() {
        let registry = NodeRegistry::new();
        let node = NodeConfig::new("mixer", "m")
            .with_num_inputs(3)
            .with_param("gain2", "-6dB")
            .instantiate(&registry, 48000.0)
            .unwrap();
        let mixer = node.as_mixer().unwrap();
        assert_eq!(mixer.gains().len(), 3);
        assert!((mixer.input_gain(2) - 0.5).abs() < 0.01);

        let err = NodeConfig::new("mixer", "m")
            .with_param("gain5", "1")
            .instantiate(&registry, 48000.0)
            .err().expect("expected instantiate to fail");
        assert!(matches!(err, ConfigError::InvalidParameter { ref param, .. } if param == "gain5"));
    }

    #[test]
    fn test_instantiate_errors() {
        let registry = NodeRegistry::new();
        assert!(matches!(
            NodeConfig::new("reverb", "r").instantiate(&registry, 48000.0),
            Err(ConfigError::UnknownNodeType(_))
        ));
        assert!(matches!(
            NodeConfig::new("filter", "f")
                .with_param("cutoff", "bright")
                .instantiate(&registry, 48000.0),
            Err(ConfigError::InvalidParameter { .. })
        ));
        assert!(matches!(
            NodeConfig::new("oscillator", "o")
                .with_subtype("noise")
                .instantiate(&registry, 48000.0),
            Err(ConfigError::InvalidParameter { .. })
        ));
        assert!(matches!(
            NodeConfig::new("output", "out")
                .with_param("gain", "1")
                .instantiate(&registry, 48000.0),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_capture_round_trips() {
        let registry = NodeRegistry::new();
        let original = NodeConfig::new("oscillator", "o")
            .with_subtype("triangle")
            .with_param("frequency", "330")
            .with_param("octave", "-1")
            .with_param("band_limited", "false");
        let node = original.instantiate(&registry, 44100.0).unwrap();
        let captured = NodeConfig::capture("o", node.as_ref(), 1).unwrap();
        assert_eq!(captured, original);
    }

    #[test]
    fn test_capture_mixer_and_output() {
        let mut mixer = MixerNode::new(3);
        mixer.set_input_gain(1, 0.25);
        let captured = NodeConfig::capture("m", &mixer, 3).unwrap();
        assert_eq!(captured.num_inputs, Some(3));
        assert_eq!(captured.get_param("gain1"), Some("0.25"));
        assert_eq!(captured.params.len(), 1);

        let out = NodeConfig::capture("out", &OutputNode::new(), 1).unwrap();
        assert_eq!(out, NodeConfig::new("output", "out"));

        let graph = SignalGraph::default();
        assert!(matches!(
            NodeConfig::capture("sub", &graph, 1),
            Err(ConfigError::UnsupportedNode { kind: NodeKind::Graph, .. })
        ));
    }
}
