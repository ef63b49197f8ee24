use super::chorus::Chorus;
use super::clean_boost::CleanBoost;
use super::compressor::Compressor;
use super::delay::Delay;
use super::distortion::Distortion;
use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, FALLBACK_SAMPLE_RATE};
use super::eq::ParametricEq;
use super::flanger::Flanger;
use super::noise_gate::NoiseGate;
use super::overdrive::Overdrive;
use super::phaser::Phaser;
use super::pitch_shifter::PitchShifter;
use super::reverb::Reverb;
use super::tremolo::Tremolo;
use super::volume::Volume;
use crate::audio::{AudioBufferView, AudioBufferViewMut};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Failure to address a parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("no effect chain attached")]
    Unattached,

    #[error("malformed parameter key '{0}', expected '<effect id>.<param>'")]
    MalformedKey(String),

    #[error("no effect with id '{0}'")]
    UnknownEffect(String),

    #[error("unknown parameter '{0}'")]
    UnknownParam(String),
}

/// Every effect algorithm, one variant per registered type id
#[derive(Debug, Clone)]
pub enum Effect {
    NoiseGate(NoiseGate),
    Compressor(Compressor),
    ParametricEq(ParametricEq),
    CleanBoost(CleanBoost),
    Overdrive(Overdrive),
    Distortion(Distortion),
    Chorus(Chorus),
    Flanger(Flanger),
    Phaser(Phaser),
    PitchShifter(PitchShifter),
    Tremolo(Tremolo),
    Volume(Volume),
    Delay(Delay),
    Reverb(Reverb),
}

impl Effect {
    pub fn type_id(&self) -> &'static str {
        match self {
            Effect::NoiseGate(_) => NoiseGate::TYPE_ID,
            Effect::Compressor(_) => Compressor::TYPE_ID,
            Effect::ParametricEq(_) => ParametricEq::TYPE_ID,
            Effect::CleanBoost(_) => CleanBoost::TYPE_ID,
            Effect::Overdrive(_) => Overdrive::TYPE_ID,
            Effect::Distortion(_) => Distortion::TYPE_ID,
            Effect::Chorus(_) => Chorus::TYPE_ID,
            Effect::Flanger(_) => Flanger::TYPE_ID,
            Effect::Phaser(_) => Phaser::TYPE_ID,
            Effect::PitchShifter(_) => PitchShifter::TYPE_ID,
            Effect::Tremolo(_) => Tremolo::TYPE_ID,
            Effect::Volume(_) => Volume::TYPE_ID,
            Effect::Delay(_) => Delay::TYPE_ID,
            Effect::Reverb(_) => Reverb::TYPE_ID,
        }
    }

    pub fn param_defs(&self) -> &'static [ParamDef] {
        match self {
            Effect::NoiseGate(_) => NoiseGate::PARAMS,
            Effect::Compressor(_) => Compressor::PARAMS,
            Effect::ParametricEq(_) => ParametricEq::PARAMS,
            Effect::CleanBoost(_) => CleanBoost::PARAMS,
            Effect::Overdrive(_) => Overdrive::PARAMS,
            Effect::Distortion(_) => Distortion::PARAMS,
            Effect::Chorus(_) => Chorus::PARAMS,
            Effect::Flanger(_) => Flanger::PARAMS,
            Effect::Phaser(_) => Phaser::PARAMS,
            Effect::PitchShifter(_) => PitchShifter::PARAMS,
            Effect::Tremolo(_) => Tremolo::PARAMS,
            Effect::Volume(_) => Volume::PARAMS,
            Effect::Delay(_) => Delay::PARAMS,
            Effect::Reverb(_) => Reverb::PARAMS,
        }
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize, params: &ParamSet) {
        match self {
            Effect::NoiseGate(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Compressor(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::ParametricEq(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::CleanBoost(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Overdrive(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Distortion(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Chorus(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Flanger(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Phaser(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::PitchShifter(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Tremolo(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Volume(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Delay(fx) => fx.prepare(sample_rate, max_block_size, params),
            Effect::Reverb(fx) => fx.prepare(sample_rate, max_block_size, params),
        }
    }

    fn param_changed(&mut self, params: &ParamSet) {
        match self {
            Effect::NoiseGate(fx) => fx.param_changed(params),
            Effect::Compressor(fx) => fx.param_changed(params),
            Effect::ParametricEq(fx) => fx.param_changed(params),
            Effect::CleanBoost(fx) => fx.param_changed(params),
            Effect::Overdrive(fx) => fx.param_changed(params),
            Effect::Distortion(fx) => fx.param_changed(params),
            Effect::Chorus(fx) => fx.param_changed(params),
            Effect::Flanger(fx) => fx.param_changed(params),
            Effect::Phaser(fx) => fx.param_changed(params),
            Effect::PitchShifter(fx) => fx.param_changed(params),
            Effect::Tremolo(fx) => fx.param_changed(params),
            Effect::Volume(fx) => fx.param_changed(params),
            Effect::Delay(fx) => fx.param_changed(params),
            Effect::Reverb(fx) => fx.param_changed(params),
        }
    }

    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        match self {
            Effect::NoiseGate(fx) => fx.process(params, input, output, num_samples),
            Effect::Compressor(fx) => fx.process(params, input, output, num_samples),
            Effect::ParametricEq(fx) => fx.process(params, input, output, num_samples),
            Effect::CleanBoost(fx) => fx.process(params, input, output, num_samples),
            Effect::Overdrive(fx) => fx.process(params, input, output, num_samples),
            Effect::Distortion(fx) => fx.process(params, input, output, num_samples),
            Effect::Chorus(fx) => fx.process(params, input, output, num_samples),
            Effect::Flanger(fx) => fx.process(params, input, output, num_samples),
            Effect::Phaser(fx) => fx.process(params, input, output, num_samples),
            Effect::PitchShifter(fx) => fx.process(params, input, output, num_samples),
            Effect::Tremolo(fx) => fx.process(params, input, output, num_samples),
            Effect::Volume(fx) => fx.process(params, input, output, num_samples),
            Effect::Delay(fx) => fx.process(params, input, output, num_samples),
            Effect::Reverb(fx) => fx.process(params, input, output, num_samples),
        }
    }

    fn reset(&mut self) {
        match self {
            Effect::NoiseGate(fx) => fx.reset(),
            Effect::Compressor(fx) => fx.reset(),
            Effect::ParametricEq(fx) => fx.reset(),
            Effect::CleanBoost(fx) => fx.reset(),
            Effect::Overdrive(fx) => fx.reset(),
            Effect::Distortion(fx) => fx.reset(),
            Effect::Chorus(fx) => fx.reset(),
            Effect::Flanger(fx) => fx.reset(),
            Effect::Phaser(fx) => fx.reset(),
            Effect::PitchShifter(fx) => fx.reset(),
            Effect::Tremolo(fx) => fx.reset(),
            Effect::Volume(fx) => fx.reset(),
            Effect::Delay(fx) => fx.reset(),
            Effect::Reverb(fx) => fx.reset(),
        }
    }
}

/// One processing unit in a chain: identity, parameters and algorithm state
///
/// A fresh node is already prepared at 48 kHz so it can process audio before
/// it joins a chain; the chain re-prepares it at the configured rate.
pub struct EffectNode {
    id: String,
    type_id: String,
    enabled: bool,
    params: ParamSet,
    effect: Effect,
    sample_rate: f32,
    max_block_size: usize,
}

impl EffectNode {
    /// Wrap an algorithm with default parameter values and an empty id
    pub fn new(effect: Effect) -> Self {
        let mut node = Self {
            id: String::new(),
            type_id: effect.type_id().to_string(),
            enabled: true,
            params: ParamSet::new(effect.param_defs()),
            effect,
            sample_rate: FALLBACK_SAMPLE_RATE,
            max_block_size: 0,
        };
        node.prepare(FALLBACK_SAMPLE_RATE, 0);
        node
    }

    /// Builder-style id assignment
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Type id the node was created under
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub(crate) fn set_type_id(&mut self, type_id: &str) {
        self.type_id = type_id.to_string();
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn param_defs(&self) -> &'static [ParamDef] {
        self.params.defs()
    }

    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Store sample rate and block size, then reset the algorithm to silence
    ///
    /// A non-positive sample rate falls back to 48 kHz.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = if sample_rate > 0.0 {
            sample_rate
        } else {
            FALLBACK_SAMPLE_RATE
        };
        self.max_block_size = max_block_size;
        self.effect.prepare(self.sample_rate, max_block_size, &self.params);
    }

    /// Clamp and store a parameter value
    ///
    /// # Returns
    /// `false` if the node declares no parameter with this name
    pub fn set_param(&mut self, name: &str, value: f32) -> bool {
        match self.params.index_of(name) {
            Some(index) => {
                self.params.set(index, value);
                self.effect.param_changed(&self.params);
                true
            }
            None => false,
        }
    }

    pub fn get_param(&self, name: &str) -> Result<f32, ParamError> {
        self.params
            .value(name)
            .ok_or_else(|| ParamError::UnknownParam(name.to_string()))
    }

    /// Apply every numeric entry of a JSON object, ignoring unknown names
    pub fn load_params(&mut self, values: &Map<String, Value>) {
        for (name, value) in values {
            match value.as_f64() {
                Some(number) => {
                    if !self.set_param(name, number as f32) {
                        log::debug!("{}: ignoring unknown parameter '{}'", self.id, name);
                    }
                }
                None => log::warn!("{}: parameter '{}' is not a number", self.id, name),
            }
        }
    }

    /// Every parameter's current value as a JSON object
    pub fn save_params(&self) -> Map<String, Value> {
        self.params
            .iter()
            .map(|(def, value)| (def.name.to_string(), Value::from(value as f64)))
            .collect()
    }

    /// Transform one block through the algorithm
    ///
    /// Channel counts above `MAX_CHANNELS` are not supported. Chain-level
    /// bypass of disabled nodes is handled by the chain, not here.
    pub fn process(
        &mut self,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        self.effect.process(&self.params, input, output, num_samples);
    }

    /// Clear algorithm state, keeping parameters and allocations
    pub fn reset(&mut self) {
        self.effect.reset();
    }
}

impl fmt::Debug for EffectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectNode")
            .field("id", &self.id)
            .field("type_id", &self.type_id())
            .field("enabled", &self.enabled)
            .field("params", &self.save_params())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boost() -> EffectNode {
        EffectNode::new(Effect::CleanBoost(CleanBoost::new())).with_id("boost_1")
    }

    #[test]
    fn set_param_clamps_and_rejects_unknown_names() {
        let mut node = boost();
        assert!(node.set_param("gain_db", 999.0));
        assert_eq!(node.get_param("gain_db"), Ok(20.0));
        assert!(!node.set_param("drive", 1.0));
        assert_eq!(
            node.get_param("drive"),
            Err(ParamError::UnknownParam("drive".to_string()))
        );
    }

    #[test]
    fn load_params_skips_unknown_and_non_numeric_entries() {
        let mut node = boost();
        let values = serde_json::json!({"gain_db": 6.0, "bogus": 1.0, "level": "loud"});
        node.load_params(values.as_object().expect("object"));
        assert_eq!(node.get_param("gain_db"), Ok(6.0));
        assert_eq!(node.save_params().len(), 1);
    }

    #[test]
    fn prepare_falls_back_to_48k() {
        let mut node = boost();
        node.prepare(0.0, 128);
        assert_eq!(node.sample_rate(), 48000.0);
        assert_eq!(node.max_block_size(), 128);
    }
}
