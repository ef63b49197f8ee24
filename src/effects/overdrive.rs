use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut};
use crate::dsp::OnePoleLowpass;
use std::f32::consts::FRAC_2_PI;

const PARAM_GAIN: usize = 0;
const PARAM_TONE: usize = 1;
const PARAM_LEVEL: usize = 2;

const MAX_DRIVE: f32 = 20.0;
const TONE_MIN_HZ: f32 = 500.0;
const TONE_RANGE_HZ: f32 = 7500.0;

/// Arctangent soft clipper followed by a one-pole tone filter
#[derive(Debug, Clone)]
pub struct Overdrive {
    sample_rate: f32,
    tone: OnePoleLowpass,
}

impl Overdrive {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            tone: OnePoleLowpass::new(),
        }
    }
}

impl Default for Overdrive {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Overdrive {
    const TYPE_ID: &'static str = "gain.overdrive";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("gain", 0.5, 0.0, 1.0, "Gain", ParamUnit::Generic),
        ParamDef::new("tone", 0.5, 0.0, 1.0, "Tone", ParamUnit::Generic),
        ParamDef::new("level", 0.7, 0.0, 1.0, "Level", ParamUnit::Generic),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        self.reset();
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        let cutoff = TONE_MIN_HZ + params.get(PARAM_TONE) * TONE_RANGE_HZ;
        self.tone.set_cutoff(cutoff, self.sample_rate);
    }

    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let drive = 1.0 + params.get(PARAM_GAIN) * MAX_DRIVE;
        let level = params.get(PARAM_LEVEL);

        for c in 0..output.num_channels().min(input.num_channels()) {
            let source = input.channel(c);
            for (out, &x) in output.channel_mut(c)[..num_samples].iter_mut().zip(source) {
                let clipped = FRAC_2_PI * (x * drive).atan();
                *out = self.tone.process(clipped, c) * level;
            }
        }
    }

    fn reset(&mut self) {
        self.tone.reset();
    }
}
