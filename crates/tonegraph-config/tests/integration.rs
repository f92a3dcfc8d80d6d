//! Integration tests for tonegraph-config.
//!
//! These tests verify end-to-end functionality across modules: files on
//! disk, the registry, built graphs and live parameter edits.

use tempfile::TempDir;
use tonegraph_config::{
    ConfigError, GraphConfig, NodeConfig, factory_presets, get_factory_preset,
};
use tonegraph_core::{FilterType, ModificationManager, SignalNode};
use tonegraph_registry::NodeRegistry;

fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    (sum_sq / signal.len() as f32).sqrt()
}

// ---------------------------------------------------------------------------
// 1. Files on disk
// ---------------------------------------------------------------------------

#[test]
fn save_and_load_toml_and_json() {
    let dir = TempDir::new().unwrap();
    let preset = get_factory_preset("dual_osc").unwrap();

    for file in ["dual.toml", "nested/dir/dual.json"] {
        let path = dir.path().join(file);
        preset.save(&path).unwrap();
        assert!(path.exists());
        let loaded = GraphConfig::load(&path).unwrap();
        assert_eq!(loaded, preset, "{file}");
    }
}

#[test]
fn load_reports_path_and_format_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.toml");
    let err = GraphConfig::load(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("missing.toml"));

    let yaml = dir.path().join("graph.yaml");
    std::fs::write(&yaml, "name: x").unwrap();
    assert!(matches!(
        GraphConfig::load(&yaml),
        Err(ConfigError::UnsupportedFormat(_))
    ));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"name\": ").unwrap();
    assert!(matches!(
        GraphConfig::load(&broken),
        Err(ConfigError::JsonParse(_))
    ));

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "name = ").unwrap();
    assert!(matches!(
        GraphConfig::load(&broken),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn hand_written_json_builds() {
    let json = r#"{
        "name": "Json Patch",
        "sample_rate": 48000,
        "output": "out",
        "nodes": [
            {"type": "osc", "id": "osc1", "subtype": "polyblep", "params": {"waveform": "square"}},
            {"type": "svf", "id": "filter1", "params": {"type": "highpass", "cutoff": "500"}},
            {"type": "output", "id": "out"}
        ],
        "connections": [
            {"source": "osc1", "dest": "filter1"},
            {"source": "filter1", "dest": "out"}
        ]
    }"#;
    let config = GraphConfig::from_json(json).unwrap();
    let graph = config.build(&NodeRegistry::new()).unwrap();
    assert_eq!(graph.sample_rate(), 48000.0);
    let filter = graph.node("filter1").and_then(|n| n.as_filter()).unwrap();
    assert_eq!(filter.filter_type(), FilterType::Highpass);
}

// ---------------------------------------------------------------------------
// 2. Factory presets
// ---------------------------------------------------------------------------

#[test]
fn factory_presets_render_audio() {
    let registry = NodeRegistry::new();
    for preset in factory_presets() {
        let mut graph = preset.build(&registry).unwrap();
        let has_input = graph.input_node().is_some();
        let output: Vec<f32> = (0..4410)
            .map(|n| {
                let x = if has_input && n == 0 { 1.0 } else { 0.0 };
                graph.process(x)
            })
            .collect();
        assert!(output.iter().all(|s| s.is_finite()), "{}", preset.name);
        assert!(rms(&output) > 1e-4, "preset '{}' is silent", preset.name);
    }
}

#[test]
fn dual_osc_capture_survives_parameter_edits() {
    let registry = NodeRegistry::new();
    let mut graph = get_factory_preset("dual_osc")
        .unwrap()
        .build(&registry)
        .unwrap();

    let mut manager = ModificationManager::new();
    manager.handle().queue_parametric_modification(
        |g| {
            if let Some(f) = g.filter_mut("lp") {
                f.set_cutoff(500.0);
            }
        },
        "darker",
    );
    manager.process_pending_modifications(&mut graph);

    let captured = GraphConfig::capture("Dual Osc Dark", &graph).unwrap();
    assert_eq!(captured.node("lp").unwrap().get_param("cutoff"), Some("500"));
    assert_eq!(captured.node("mix").unwrap().num_inputs, Some(2));
    assert_eq!(captured.connections.len(), 4);

    let rebuilt = captured.build(&registry).unwrap();
    assert_eq!(rebuilt.connections(), graph.connections());
    assert_eq!(
        GraphConfig::capture("Dual Osc Dark", &rebuilt).unwrap(),
        captured
    );
}

#[test]
fn unknown_type_names_the_type() {
    let config = GraphConfig::new("Bad").with_node(NodeConfig::new("wavetable", "w"));
    let err = config.build(&NodeRegistry::new()).unwrap_err();
    assert_eq!(err.to_string(), "unknown node type: wavetable");
}
