use approx::assert_relative_eq;
use gearbox_fx::audio::{EffectChain, OutputEq, Preset, PresetError, PresetStore};
use gearbox_fx::effects::EffectRegistry;
use serde_json::Value;
use std::fs;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const BOOST_PRESET: &str = r#"{
    "preset_id": "test_boost",
    "format_version": "1.0",
    "name": "Test Boost",
    "routing_mode": "serial",
    "output_eq": { "bass_db": 1.5, "mid_db": -2.0, "treble_db": 0.5 },
    "output_volume": 0.9,
    "effect_chain": [
        { "id": "boost_1", "type": "gain.clean_boost", "enabled": true, "params": { "gain_db": 6.0 } },
        { "id": "delay_1", "type": "time.delay", "enabled": false,
          "params": { "time_ms": 250.0, "feedback": 0.3, "mix": 0.4 } }
    ]
}"#;

fn setup() -> (EffectChain, EffectRegistry) {
    let chain = EffectChain::new();
    chain.prepare(48000.0, 256);
    (chain, EffectRegistry::with_builtin_effects())
}

fn ids(chain: &EffectChain) -> Vec<String> {
    chain.nodes().iter().map(|n| n.lock().id().to_string()).collect()
}

#[test]
fn test_load_populates_chain_in_order() {
    let (chain, registry) = setup();
    let preset = PresetStore::load_from_str(BOOST_PRESET, &chain, &registry).expect("valid preset");

    assert_eq!(preset.preset_id, "test_boost");
    assert_eq!(preset.name, "Test Boost");
    assert_eq!(preset.routing_mode, "serial");
    assert_relative_eq!(preset.output_volume, 0.9);
    assert_eq!(
        preset.output_eq,
        OutputEq {
            bass_db: 1.5,
            mid_db: -2.0,
            treble_db: 0.5
        }
    );

    assert_eq!(ids(&chain), vec!["boost_1", "delay_1"]);
    let boost = chain.find_node("boost_1").expect("boost node");
    assert_eq!(boost.lock().get_param("gain_db"), Ok(6.0));
    assert!(boost.lock().is_enabled());

    let delay = chain.find_node("delay_1").expect("delay node");
    assert!(!delay.lock().is_enabled());
    assert_eq!(delay.lock().get_param("time_ms"), Ok(250.0));
    // Unlisted parameters keep their defaults
    assert_eq!(delay.lock().get_param("bpm"), Ok(120.0));
}

#[test]
fn test_loaded_nodes_are_prepared_at_chain_rate() {
    let chain = EffectChain::new();
    chain.prepare(44100.0, 512);
    let registry = EffectRegistry::with_builtin_effects();
    PresetStore::load_from_str(BOOST_PRESET, &chain, &registry).expect("valid preset");

    for node in chain.nodes() {
        assert_eq!(node.lock().sample_rate(), 44100.0);
        assert_eq!(node.lock().max_block_size(), 512);
    }
}

#[test]
fn test_missing_fields_take_defaults() {
    let (chain, registry) = setup();
    let preset = PresetStore::load_from_str(
        r#"{ "effect_chain": [ { "id": "od", "type": "gain.overdrive" } ] }"#,
        &chain,
        &registry,
    )
    .expect("valid preset");

    assert_eq!(preset.name, "Unnamed");
    assert_eq!(preset.format_version, "1.0");
    assert_eq!(preset.routing_mode, "serial");
    assert_relative_eq!(preset.output_volume, 0.85);
    assert_eq!(preset.output_eq, OutputEq::default());

    let node = chain.find_node("od").expect("overdrive node");
    assert!(node.lock().is_enabled());
    assert_eq!(node.lock().get_param("level"), Ok(0.7));
}

#[test]
fn test_unknown_type_is_skipped() {
    let (chain, registry) = setup();
    let json = r#"{
        "name": "Mixed",
        "effect_chain": [
            { "id": "a", "type": "gain.clean_boost", "params": {} },
            { "id": "b", "type": "gain.fuzz_factory", "params": { "gain": 1.0 } }
        ]
    }"#;

    PresetStore::load_from_str(json, &chain, &registry).expect("document is valid");
    assert_eq!(ids(&chain), vec!["a"]);
}

#[test]
fn test_malformed_entries_are_skipped() {
    let (chain, registry) = setup();
    let json = r#"{
        "effect_chain": [
            42,
            { "id": "ok", "type": "time.reverb" },
            { "id": "bad_enabled", "type": "time.delay", "enabled": "yes" }
        ]
    }"#;

    PresetStore::load_from_str(json, &chain, &registry).expect("document is valid");
    assert_eq!(ids(&chain), vec!["ok"]);
}

#[test]
fn test_out_of_range_params_are_clamped() {
    let (chain, registry) = setup();
    let json = r#"{
        "effect_chain": [
            { "id": "boost", "type": "gain.clean_boost", "params": { "gain_db": 999.0 } }
        ]
    }"#;

    PresetStore::load_from_str(json, &chain, &registry).expect("valid preset");
    let boost = chain.find_node("boost").expect("boost node");
    assert_eq!(boost.lock().get_param("gain_db"), Ok(20.0));
}

#[test]
fn test_missing_effect_chain_empties_chain() {
    let (chain, registry) = setup();
    PresetStore::load_from_str(BOOST_PRESET, &chain, &registry).expect("valid preset");
    assert_eq!(chain.len(), 2);

    PresetStore::load_from_str(r#"{ "name": "Empty" }"#, &chain, &registry).expect("valid preset");
    assert!(chain.is_empty());
}

#[test]
fn test_malformed_json_leaves_chain_untouched() {
    let (chain, registry) = setup();
    PresetStore::load_from_str(BOOST_PRESET, &chain, &registry).expect("valid preset");

    let result = PresetStore::load_from_str(r#"{ "name": "Broken", "effect_chain": [ "#, &chain, &registry);
    assert!(matches!(result, Err(PresetError::Parse(_))));

    let result = PresetStore::load_from_str(r#"{ "output_volume": "loud" }"#, &chain, &registry);
    assert!(matches!(result, Err(PresetError::Parse(_))));

    assert_eq!(ids(&chain), vec!["boost_1", "delay_1"]);
}

#[test]
fn test_missing_file_reports_io_error() {
    let (chain, registry) = setup();
    PresetStore::load_from_str(BOOST_PRESET, &chain, &registry).expect("valid preset");

    let dir = tempfile::tempdir().expect("temp dir");
    let result = PresetStore::load_from_file(dir.path().join("nope.json"), &chain, &registry);
    assert!(matches!(result, Err(PresetError::Io { .. })));
    assert_eq!(chain.len(), 2);
}

#[test]
fn test_save_then_load_round_trips() {
    let (chain, registry) = setup();
    let preset = PresetStore::load_from_str(BOOST_PRESET, &chain, &registry).expect("valid preset");
    chain
        .find_node("delay_1")
        .expect("delay node")
        .lock()
        .set_param("feedback", 0.55);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("round_trip.json");
    PresetStore::save_to_file(&path, &preset, &chain).expect("save");

    let (reloaded_chain, registry) = setup();
    let reloaded = PresetStore::load_from_file(&path, &reloaded_chain, &registry).expect("reload");

    assert_eq!(reloaded.name, preset.name);
    assert_eq!(reloaded.output_eq, preset.output_eq);
    assert_relative_eq!(reloaded.output_volume, preset.output_volume);

    let saved_nodes = chain.nodes();
    let restored = reloaded_chain.nodes();
    assert_eq!(saved_nodes.len(), restored.len());
    for (a, b) in saved_nodes.iter().zip(&restored) {
        let (a, b) = (a.lock(), b.lock());
        assert_eq!(a.id(), b.id());
        assert_eq!(a.type_id(), b.type_id());
        assert_eq!(a.is_enabled(), b.is_enabled());
        for ((def, va), (_, vb)) in a.params().iter().zip(b.params().iter()) {
            assert_relative_eq!(va, vb, epsilon = 1e-6);
            assert!(b.get_param(def.name).is_ok());
        }
    }
    assert_eq!(
        restored[1].lock().get_param("feedback").map(|v| (v * 100.0).round()),
        Ok(55.0)
    );
}

#[test]
fn test_saved_document_shape() {
    let (chain, registry) = setup();
    let json = r#"{
        "name": "Shape",
        "author": "someone",
        "effect_chain": [ { "id": "t", "type": "modulation.tremolo", "enabled": false } ]
    }"#;
    let preset = PresetStore::load_from_str(json, &chain, &registry).expect("valid preset");

    let saved: Value =
        serde_json::from_str(&PresetStore::to_json_string(&preset, &chain).expect("serialize"))
            .expect("saved JSON parses");

    assert_eq!(saved["name"], "Shape");
    assert_eq!(saved["routing_mode"], "serial");
    assert_eq!(saved["author"], "someone");
    let entry = &saved["effect_chain"][0];
    assert_eq!(entry["id"], "t");
    assert_eq!(entry["type"], "modulation.tremolo");
    assert_eq!(entry["enabled"], false);
    assert_eq!(entry["params"].as_object().map(|p| p.len()), Some(3));
}

#[test]
fn test_save_does_not_hold_earlier_nodes_while_waiting() {
    let (chain, registry) = setup();
    let preset = PresetStore::load_from_str(BOOST_PRESET, &chain, &registry).expect("valid preset");
    let boost = chain.find_node("boost_1").expect("boost node");
    let delay = chain.find_node("delay_1").expect("delay node");

    // Another thread sits on the second node while the save runs
    let (held_tx, held_rx) = mpsc::channel();
    let holder = thread::spawn(move || {
        let mut node = delay.lock();
        held_tx.send(()).expect("signal");
        thread::sleep(Duration::from_millis(300));
        node.set_param("feedback", 0.55);
    });
    held_rx.recv().expect("holder started");

    let (saved_json, first_node_free) = thread::scope(|scope| {
        let saver = scope.spawn(|| PresetStore::to_json_string(&preset, &chain));
        thread::sleep(Duration::from_millis(50));
        let free = boost.try_lock_for(Duration::from_millis(100)).is_some();
        (saver.join().expect("save thread panicked"), free)
    });
    holder.join().expect("holder thread panicked");

    assert!(first_node_free, "first node stayed locked while the save waited on the second");
    let saved: Value =
        serde_json::from_str(&saved_json.expect("serialize")).expect("saved JSON parses");
    let feedback = saved["effect_chain"][1]["params"]["feedback"].as_f64().unwrap_or_default();
    assert!((feedback - 0.55).abs() < 1e-6);
}

#[test]
fn test_default_preset_serializes_empty_chain() {
    let chain = EffectChain::new();
    let json = PresetStore::to_json_string(&Preset::default(), &chain).expect("serialize");
    let saved: Value = serde_json::from_str(&json).expect("saved JSON parses");
    assert_eq!(saved["effect_chain"].as_array().map(Vec::len), Some(0));
    assert_eq!(saved["output_volume"].as_f64().map(|v| (v * 100.0).round()), Some(85.0));
}

#[test]
fn test_unwritable_path_fails() {
    let chain = EffectChain::new();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing_dir").join("preset.json");
    let result = PresetStore::save_to_file(&path, &Preset::default(), &chain);
    assert!(matches!(result, Err(PresetError::Io { .. })));
}

#[test]
fn test_scan_directory_lists_json_sorted() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("b_lead.json"), "{}").expect("write");
    fs::write(dir.path().join("a_clean.json"), "{}").expect("write");
    fs::write(dir.path().join("notes.txt"), "not a preset").expect("write");
    fs::create_dir(dir.path().join("nested.json")).expect("mkdir");

    let entries = PresetStore::scan_directory(dir.path());
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a_clean", "b_lead"]);
    assert_eq!(entries[0].path, dir.path().join("a_clean.json"));

    assert!(PresetStore::scan_directory(dir.path().join("absent")).is_empty());
}

#[test]
fn test_shipped_presets_load() {
    let presets_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/presets");
    let entries = PresetStore::scan_directory(presets_dir);
    assert_eq!(entries.len(), 5);

    for entry in entries {
        let (chain, registry) = setup();
        let preset = PresetStore::load_from_file(&entry.path, &chain, &registry)
            .unwrap_or_else(|e| panic!("{}: {}", entry.name, e));
        assert!(!chain.is_empty(), "{} has no effects", entry.name);
        assert_ne!(preset.name, "Unnamed");

        let raw_len = preset.raw["effect_chain"].as_array().map_or(0, Vec::len);
        assert_eq!(chain.len(), raw_len, "{} skipped an effect", entry.name);
    }
}
