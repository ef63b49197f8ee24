use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut};
use crate::dsp::{Lfo, LfoWaveform};

const PARAM_RATE: usize = 0;
const PARAM_DEPTH: usize = 1;
const PARAM_WAVEFORM: usize = 2;

/// Amplitude modulation between `1 - depth` and unity
#[derive(Debug, Clone)]
pub struct Tremolo {
    sample_rate: f32,
    lfo: Lfo,
}

impl Tremolo {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            lfo: Lfo::default(),
        }
    }
}

impl Default for Tremolo {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Tremolo {
    const TYPE_ID: &'static str = "modulation.tremolo";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("rate", 5.0, 0.1, 20.0, "Rate", ParamUnit::Hertz),
        ParamDef::new("depth", 0.7, 0.0, 1.0, "Depth", ParamUnit::Generic),
        // 0 sine, 1 triangle, 2 square
        ParamDef::new("waveform", 0.0, 0.0, 2.0, "Waveform", ParamUnit::Generic),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        self.lfo.set_phase(0.0);
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        self.lfo.set_rate(params.get(PARAM_RATE), self.sample_rate);
    }

    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let depth = params.get(PARAM_DEPTH);
        let waveform = LfoWaveform::from_value(params.get(PARAM_WAVEFORM));
        let channels = output.num_channels().min(input.num_channels());

        for s in 0..num_samples {
            let lfo = waveform.value_at(self.lfo.phase());
            let gain = 1.0 - depth * (1.0 - lfo) * 0.5;
            for c in 0..channels {
                *output.sample_mut(c, s) = input.sample(c, s) * gain;
            }
            self.lfo.advance();
        }
    }

    fn reset(&mut self) {
        self.lfo.set_phase(0.0);
    }
}
