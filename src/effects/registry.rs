use super::chorus::Chorus;
use super::clean_boost::CleanBoost;
use super::compressor::Compressor;
use super::delay::Delay;
use super::distortion::Distortion;
use super::effect_trait::EffectProcessor;
use super::eq::ParametricEq;
use super::flanger::Flanger;
use super::node::{Effect, EffectNode};
use super::noise_gate::NoiseGate;
use super::overdrive::Overdrive;
use super::phaser::Phaser;
use super::pitch_shifter::PitchShifter;
use super::reverb::Reverb;
use super::tremolo::Tremolo;
use super::volume::Volume;
use std::collections::HashMap;

/// Zero-argument constructor for one effect algorithm
pub type EffectFactory = fn() -> Effect;

/// Effect category, taken from the type id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    Dynamics,
    Eq,
    Gain,
    Modulation,
    Output,
    Time,
    Other,
}

impl EffectCategory {
    /// Category for a type id such as `"gain.overdrive"`
    pub fn of(type_id: &str) -> Self {
        match type_id.split('.').next().unwrap_or_default() {
            "dynamics" => EffectCategory::Dynamics,
            "eq" => EffectCategory::Eq,
            "gain" => EffectCategory::Gain,
            "modulation" => EffectCategory::Modulation,
            "output" => EffectCategory::Output,
            "time" => EffectCategory::Time,
            _ => EffectCategory::Other,
        }
    }
}

/// Human-readable name for a type id
///
/// `"modulation.pitch_shifter"` becomes `"Pitch Shifter"`.
pub fn display_label(type_id: &str) -> String {
    let name = type_id.rsplit('.').next().unwrap_or(type_id);
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lookup from type id to effect constructor
///
/// Constructed explicitly and passed to whoever builds nodes; there is no
/// process-wide instance.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    factories: HashMap<String, EffectFactory>,
}

impl EffectRegistry {
    /// Registry with no types
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding all fourteen built-in effect types
    pub fn with_builtin_effects() -> Self {
        let mut registry = Self::empty();
        registry.register(NoiseGate::TYPE_ID, || Effect::NoiseGate(NoiseGate::new()));
        registry.register(Compressor::TYPE_ID, || Effect::Compressor(Compressor::new()));
        registry.register(ParametricEq::TYPE_ID, || Effect::ParametricEq(ParametricEq::new()));
        registry.register(CleanBoost::TYPE_ID, || Effect::CleanBoost(CleanBoost::new()));
        registry.register(Overdrive::TYPE_ID, || Effect::Overdrive(Overdrive::new()));
        registry.register(Distortion::TYPE_ID, || Effect::Distortion(Distortion::new()));
        registry.register(Chorus::TYPE_ID, || Effect::Chorus(Chorus::new()));
        registry.register(Flanger::TYPE_ID, || Effect::Flanger(Flanger::new()));
        registry.register(Phaser::TYPE_ID, || Effect::Phaser(Phaser::new()));
        registry.register(PitchShifter::TYPE_ID, || Effect::PitchShifter(PitchShifter::new()));
        registry.register(Tremolo::TYPE_ID, || Effect::Tremolo(Tremolo::new()));
        registry.register(Volume::TYPE_ID, || Effect::Volume(Volume::new()));
        registry.register(Delay::TYPE_ID, || Effect::Delay(Delay::new()));
        registry.register(Reverb::TYPE_ID, || Effect::Reverb(Reverb::new()));
        registry
    }

    /// Add or replace the constructor for a type id
    pub fn register(&mut self, type_id: impl Into<String>, factory: EffectFactory) {
        self.factories.insert(type_id.into(), factory);
    }

    /// Build a node with default parameters and an empty id
    ///
    /// # Returns
    /// `None` if the type id is not registered
    pub fn create(&self, type_id: &str) -> Option<EffectNode> {
        self.factories.get(type_id).map(|factory| {
            let mut node = EffectNode::new(factory());
            node.set_type_id(type_id);
            node
        })
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }

    /// All registered type ids, sorted
    pub fn registered_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
