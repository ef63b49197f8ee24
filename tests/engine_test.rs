use approx::assert_relative_eq;
use gearbox_fx::audio::{AudioBuffer, OutputEq};
use gearbox_fx::EffectEngine;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const BLOCK: usize = 256;

const BOOST_PRESET: &str = r#"{
    "name": "Boost",
    "output_volume": 1.0,
    "effect_chain": [
        { "id": "boost_1", "type": "gain.clean_boost", "enabled": true, "params": { "gain_db": 6.0 } }
    ]
}"#;

fn sine(channels: usize, frames: usize, freq: f32, amplitude: f32) -> AudioBuffer {
    let samples: Vec<f32> = (0..frames)
        .map(|n| amplitude * (2.0 * PI * freq * n as f32 / 48000.0).sin())
        .collect();
    AudioBuffer::from_channels(&vec![samples; channels])
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

fn process(engine: &EffectEngine, input: &AudioBuffer) -> AudioBuffer {
    let mut output = AudioBuffer::new(input.num_channels(), input.num_samples());
    engine.process_block(input.view(), &mut output.view_mut(), input.num_samples());
    output
}

#[test]
fn test_boost_preset_doubles_rms() {
    let engine = EffectEngine::new();
    engine.prepare(48000, BLOCK);
    assert!(engine.load_preset_json(BOOST_PRESET));
    assert_eq!(engine.preset_name(), "Boost");
    assert_eq!(engine.output_volume(), 1.0);

    let input = sine(2, BLOCK, 440.0, 0.5);
    let output = process(&engine, &input);

    for c in 0..2 {
        let ratio = rms(output.channel(c)) / rms(input.channel(c));
        assert_relative_eq!(ratio, 1.995, max_relative = 0.05);
    }
}

#[test]
fn test_bypass_copies_input_exactly() {
    let engine = EffectEngine::new();
    assert!(engine.load_preset_json(BOOST_PRESET));
    engine.set_output_volume(0.3);
    engine.set_bypass(true);
    assert!(engine.is_bypassed());

    let input = sine(2, BLOCK, 440.0, 0.5);
    let output = process(&engine, &input);
    assert_eq!(output.channel(0), input.channel(0));
    assert_eq!(output.channel(1), input.channel(1));

    engine.set_bypass(false);
    let output = process(&engine, &input);
    assert_ne!(output.channel(0), input.channel(0));
}

#[test]
fn test_default_volume_applies_after_chain() {
    let engine = EffectEngine::new();
    assert!(engine.load_preset_json(r#"{ "name": "Quiet", "effect_chain": [] }"#));
    assert_relative_eq!(engine.output_volume(), 0.85);

    let input = AudioBuffer::from_channels(&[vec![0.5; BLOCK]]);
    let output = process(&engine, &input);
    assert!(output.channel(0).iter().all(|&s| (s - 0.425).abs() < 1e-6));
}

#[test]
fn test_failed_load_keeps_chain_and_preset() {
    let engine = EffectEngine::new();
    assert!(engine.load_preset_json(BOOST_PRESET));

    assert!(!engine.load_preset_json("{ not json"));
    assert!(!engine.load_preset("/nonexistent/preset.json"));

    assert_eq!(engine.preset_name(), "Boost");
    assert_eq!(engine.chain().len(), 1);
    assert_eq!(engine.get_param("boost_1.gain_db"), Some(6.0));
}

#[test]
fn test_save_and_reload_through_engine() {
    let engine = EffectEngine::new();
    assert!(engine.load_preset_json(BOOST_PRESET));
    assert!(engine.set_param("boost_1.gain_db", -3.0));
    engine.set_preset_name("Edited");
    engine.set_output_eq(OutputEq {
        bass_db: 2.0,
        mid_db: 0.0,
        treble_db: -1.0,
    });

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("edited.json");
    assert!(engine.save_preset(&path));

    let other = EffectEngine::new();
    assert!(other.load_preset(&path));
    assert_eq!(other.preset_name(), "Edited");
    assert_eq!(other.output_eq().bass_db, 2.0);
    assert_eq!(other.output_eq().treble_db, -1.0);
    assert_eq!(other.get_param("boost_1.gain_db"), Some(-3.0));
    assert_eq!(other.output_volume(), 1.0);
}

#[test]
fn test_preset_json_reflects_chain() {
    let engine = EffectEngine::new();
    let id = engine.add_effect("modulation.phaser").expect("registered type");
    let json = engine.preset_json().expect("serializable");
    let document: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(document["effect_chain"][0]["id"], id.as_str());
    assert_eq!(document["effect_chain"][0]["type"], "modulation.phaser");
}

#[test]
fn test_new_preset_clears_chain() {
    let engine = EffectEngine::new();
    assert!(engine.load_preset_json(BOOST_PRESET));
    engine.new_preset("Blank");

    assert!(engine.chain().is_empty());
    assert_eq!(engine.preset_name(), "Blank");
    assert_relative_eq!(engine.output_volume(), 0.85);
    assert_eq!(engine.get_param("boost_1.gain_db"), None);
}

#[test]
fn test_add_remove_and_set_param() {
    let engine = EffectEngine::new();
    let drive = engine.add_effect("gain.overdrive").expect("registered type");
    let verb = engine.add_effect("time.reverb").expect("registered type");
    assert_eq!(engine.chain().len(), 2);
    assert!(engine.add_effect("gain.fuzz").is_none());
    assert_eq!(engine.chain().len(), 2);

    assert!(engine.set_param(&format!("{}.gain", drive), 1.5));
    assert_eq!(engine.get_param(&format!("{}.gain", drive)), Some(1.0));
    assert!(!engine.set_param(&format!("{}.bogus", drive), 1.0));
    assert!(!engine.set_param("missing.gain", 1.0));
    assert!(!engine.set_param("nodot", 1.0));

    assert!(engine.remove_effect(&drive));
    assert!(!engine.remove_effect(&drive));
    assert_eq!(engine.chain().len(), 1);
    assert_eq!(engine.get_param(&format!("{}.mix", verb)), Some(0.3));
}

#[test]
fn test_delay_output_arrives_after_first_block() {
    let engine = EffectEngine::new();
    engine.prepare(48000, BLOCK);
    engine.set_output_volume(1.0);
    let id = engine.add_effect("time.delay").expect("registered type");
    assert!(engine.set_param(&format!("{}.time_ms", id), 100.0));
    assert!(engine.set_param(&format!("{}.feedback", id), 0.0));
    assert!(engine.set_param(&format!("{}.mix", id), 1.0));

    let mut impulse = AudioBuffer::new(1, BLOCK);
    impulse.channel_mut(0)[0] = 1.0;
    let output = process(&engine, &impulse);
    assert!(output.channel(0).iter().all(|&s| s.abs() < 1e-3));
}

#[test]
fn test_prepare_reconfigures_chain() {
    let engine = EffectEngine::new();
    engine.add_effect("time.delay").expect("registered type");
    engine.prepare(44100, 1024);

    assert_eq!(engine.sample_rate(), 44100);
    assert_eq!(engine.max_block_size(), 1024);
    for node in engine.chain().nodes() {
        assert_eq!(node.lock().sample_rate(), 44100.0);
    }
}

#[test]
fn test_structural_edits_during_processing() {
    // Every block must be either a clean pass through the chain or silence
    // dropped while an edit held the chain
    let engine = Arc::new(EffectEngine::new());
    engine.prepare(48000, BLOCK);
    engine.set_output_volume(1.0);

    let done = Arc::new(AtomicBool::new(false));
    let control = {
        let engine = Arc::clone(&engine);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut edits = 0;
            while !done.load(Ordering::Relaxed) || edits < 200 {
                if let Some(id) = engine.add_effect("gain.clean_boost") {
                    engine.set_param(&format!("{}.gain_db", id), 0.0);
                    engine.remove_effect(&id);
                }
                edits += 1;
            }
        })
    };

    let input = sine(2, BLOCK, 440.0, 0.5);
    let mut output = AudioBuffer::new(2, BLOCK);
    for _ in 0..2000 {
        engine.process_block(input.view(), &mut output.view_mut(), BLOCK);
        for c in 0..2 {
            let silent = output.channel(c).iter().all(|&s| s == 0.0);
            let passed = output
                .channel(c)
                .iter()
                .zip(input.channel(c))
                .all(|(o, i)| (o - i).abs() < 1e-6);
            assert!(silent || passed, "block was neither silence nor a clean pass");
        }
    }

    done.store(true, Ordering::Relaxed);
    control.join().expect("control thread panicked");
}
