use crate::audio::buffer::{AudioBufferView, AudioBufferViewMut};
use crate::audio::chain::EffectChain;
use crate::audio::parameters::ParameterManager;
use crate::audio::preset::{OutputEq, Preset, PresetStore};
use crate::effects::EffectRegistry;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Top-level effect processor
///
/// Owns the chain, the parameter router, the type registry and the current
/// preset. Every method takes `&self` so one engine can be shared between an
/// audio callback and a control thread.
pub struct EffectEngine {
    chain: Arc<EffectChain>,
    parameters: ParameterManager,
    registry: EffectRegistry,
    preset: Mutex<Preset>,

    output_volume: AtomicU32, // f32 bits
    bypassed: AtomicBool,
    sample_rate: AtomicU32,
    next_effect_id: AtomicU32,
}

impl EffectEngine {
    /// Engine with every built-in effect type registered
    pub fn new() -> Self {
        Self::with_registry(EffectRegistry::with_builtin_effects())
    }

    /// Engine building nodes from a caller-supplied registry
    ///
    /// The chain starts prepared at 48 kHz with 256-frame blocks.
    pub fn with_registry(registry: EffectRegistry) -> Self {
        let chain = Arc::new(EffectChain::new());
        chain.prepare(DEFAULT_SAMPLE_RATE as f32, DEFAULT_BLOCK_SIZE);

        let parameters = ParameterManager::new();
        parameters.attach_chain(&chain);

        let preset = Preset::default();
        let output_volume = AtomicU32::new(preset.output_volume.to_bits());

        Self {
            chain,
            parameters,
            registry,
            preset: Mutex::new(preset),
            output_volume,
            bypassed: AtomicBool::new(false),
            sample_rate: AtomicU32::new(DEFAULT_SAMPLE_RATE),
            next_effect_id: AtomicU32::new(0),
        }
    }

    /// Configure sample rate and the largest block size `process_block` will see
    pub fn prepare(&self, sample_rate: u32, max_block_size: usize) {
        self.sample_rate.store(sample_rate, Ordering::Relaxed);
        self.chain.prepare(sample_rate as f32, max_block_size);
        log::info!("EffectEngine prepared: {}Hz, block={}", sample_rate, max_block_size);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    pub fn max_block_size(&self) -> usize {
        self.chain.max_block_size()
    }

    /// Process one block from `input` into `output`
    ///
    /// Bypass copies input to output untouched. Otherwise the chain runs and
    /// the output volume is applied unless it is exactly 1.0.
    pub fn process_block(
        &self,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        if self.bypassed.load(Ordering::Relaxed) {
            output.copy_from(&input, num_samples);
            return;
        }

        self.chain.process(input, output, num_samples);

        let volume = self.output_volume();
        if volume != 1.0 {
            output.apply_gain(volume, num_samples);
        }
    }

    /// Replace the chain and current preset from a file
    ///
    /// # Returns
    /// `false` if the file could not be read or parsed; the chain is then unchanged
    pub fn load_preset(&self, path: impl AsRef<Path>) -> bool {
        match PresetStore::load_from_file(path, &self.chain, &self.registry) {
            Ok(preset) => {
                self.install_preset(preset);
                true
            }
            Err(_) => false,
        }
    }

    /// Same as [`EffectEngine::load_preset`] for an in-memory document
    pub fn load_preset_json(&self, json: &str) -> bool {
        match PresetStore::load_from_str(json, &self.chain, &self.registry) {
            Ok(preset) => {
                self.install_preset(preset);
                true
            }
            Err(_) => false,
        }
    }

    /// Write the current preset and chain to a file
    pub fn save_preset(&self, path: impl AsRef<Path>) -> bool {
        let preset = self.current_preset();
        PresetStore::save_to_file(path, &preset, &self.chain).is_ok()
    }

    /// Current preset and chain as a JSON document
    pub fn preset_json(&self) -> Option<String> {
        let preset = self.current_preset();
        PresetStore::to_json_string(&preset, &self.chain).ok()
    }

    /// Clear the chain and start a preset with default settings
    pub fn new_preset(&self, name: &str) {
        self.chain.clear();
        let preset = Preset {
            name: name.to_string(),
            ..Preset::default()
        };
        self.install_preset(preset);
        log::info!("New preset '{}'", name);
    }

    fn install_preset(&self, preset: Preset) {
        self.output_volume
            .store(preset.output_volume.to_bits(), Ordering::Relaxed);
        *self.preset.lock() = preset;
        self.parameters.sync_from_chain();
    }

    pub fn set_bypass(&self, bypassed: bool) {
        self.bypassed.store(bypassed, Ordering::Relaxed);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed.load(Ordering::Relaxed)
    }

    /// Linear output scalar applied after the chain
    pub fn set_output_volume(&self, volume: f32) {
        self.output_volume.store(volume.to_bits(), Ordering::Relaxed);
        self.preset.lock().output_volume = volume;
    }

    pub fn output_volume(&self) -> f32 {
        f32::from_bits(self.output_volume.load(Ordering::Relaxed))
    }

    /// Output EQ trims; stored with the preset, not applied to audio
    pub fn output_eq(&self) -> OutputEq {
        self.preset.lock().output_eq
    }

    pub fn set_output_eq(&self, output_eq: OutputEq) {
        self.preset.lock().output_eq = output_eq;
    }

    pub fn preset_name(&self) -> String {
        self.preset.lock().name.clone()
    }

    pub fn set_preset_name(&self, name: &str) {
        self.preset.lock().name = name.to_string();
    }

    /// Copy of the current preset metadata
    pub fn current_preset(&self) -> Preset {
        self.preset.lock().clone()
    }

    /// Set `"<effect id>.<param>"` to a value, clamped to the parameter's range
    pub fn set_param(&self, key: &str, value: f32) -> bool {
        match self.parameters.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("set_param '{}' rejected: {}", key, e);
                false
            }
        }
    }

    /// Cached value for a key, see [`ParameterManager::get`]
    pub fn get_param(&self, key: &str) -> Option<f32> {
        self.parameters.get(key)
    }

    /// Append a new effect of the given type with default parameters
    ///
    /// # Returns
    /// The generated node id, or `None` for an unregistered type
    pub fn add_effect(&self, type_id: &str) -> Option<String> {
        let Some(node) = self.registry.create(type_id) else {
            log::warn!("add_effect: unknown effect type '{}'", type_id);
            return None;
        };

        let counter = self.next_effect_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}_{}", type_id.replace('.', "_"), counter);
        self.chain.add_node(node.with_id(id.clone()));
        self.parameters.sync_from_chain();
        Some(id)
    }

    pub fn remove_effect(&self, id: &str) -> bool {
        let removed = self.chain.remove_node(id);
        if removed {
            self.parameters.sync_from_chain();
        }
        removed
    }

    pub fn chain(&self) -> &Arc<EffectChain> {
        &self.chain
    }

    pub fn parameters(&self) -> &ParameterManager {
        &self.parameters
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }
}

impl Default for EffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::AudioBuffer;

    #[test]
    fn fresh_engine_uses_default_configuration() {
        let engine = EffectEngine::new();
        assert_eq!(engine.sample_rate(), 48000);
        assert_eq!(engine.max_block_size(), 256);
        assert_eq!(engine.output_volume(), 0.85);
        assert_eq!(engine.preset_name(), "Unnamed");
    }

    #[test]
    fn empty_chain_applies_output_volume() {
        let engine = EffectEngine::new();
        engine.set_output_volume(0.5);

        let input = AudioBuffer::from_channels(&[vec![0.8; 64], vec![-0.4; 64]]);
        let mut output = AudioBuffer::new(2, 64);
        engine.process_block(input.view(), &mut output.view_mut(), 64);
        assert!(output.channel(0).iter().all(|&s| (s - 0.4).abs() < 1e-6));
        assert!(output.channel(1).iter().all(|&s| (s + 0.2).abs() < 1e-6));
    }

    #[test]
    fn add_effect_ids_count_up_per_engine() {
        let engine = EffectEngine::new();
        assert_eq!(engine.add_effect("gain.overdrive").as_deref(), Some("gain_overdrive_0"));
        assert_eq!(engine.add_effect("time.delay").as_deref(), Some("time_delay_1"));
        assert_eq!(engine.add_effect("nope"), None);
        assert_eq!(engine.get_param("time_delay_1.time_ms"), Some(300.0));
        assert!(engine.remove_effect("gain_overdrive_0"));
        assert_eq!(engine.get_param("gain_overdrive_0.gain"), None);
    }
}
