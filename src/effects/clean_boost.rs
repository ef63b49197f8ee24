use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit};
use crate::audio::{AudioBufferView, AudioBufferViewMut};
use crate::dsp::db_to_linear;

const PARAM_GAIN_DB: usize = 0;

/// Static, memoryless gain stage
#[derive(Debug, Clone)]
pub struct CleanBoost {
    gain: f32,
}

impl CleanBoost {
    pub fn new() -> Self {
        Self { gain: 1.0 }
    }
}

impl Default for CleanBoost {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for CleanBoost {
    const TYPE_ID: &'static str = "gain.clean_boost";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("gain_db", 0.0, -20.0, 20.0, "Gain", ParamUnit::Decibels),
    ];

    fn prepare(&mut self, _sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        self.gain = db_to_linear(params.get(PARAM_GAIN_DB));
    }

    fn process(
        &mut self,
        _params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        for c in 0..output.num_channels().min(input.num_channels()) {
            let source = input.channel(c);
            for (out, &x) in output.channel_mut(c)[..num_samples].iter_mut().zip(source) {
                *out = x * self.gain;
            }
        }
    }

    fn reset(&mut self) {}
}
