use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::{flush_denormal, OnePoleLowpass};
use std::f32::consts::PI;

const PARAM_GAIN: usize = 0;
const PARAM_TONE: usize = 1;
const PARAM_LEVEL: usize = 2;
const PARAM_ASYMMETRY: usize = 3;

const MAX_DRIVE: f32 = 30.0;
const DC_BLOCK_HZ: f32 = 20.0;
const TONE_MIN_HZ: f32 = 800.0;
const TONE_RANGE_HZ: f32 = 5200.0;

/// DC blocker, driven asymmetric hard clipper, then a one-pole tone filter
#[derive(Debug, Clone)]
pub struct Distortion {
    sample_rate: f32,
    dc_coeff: f32,
    dc_prev: [f32; MAX_CHANNELS],   // Previous input sample
    dc_state: [f32; MAX_CHANNELS],  // Previous high-passed sample
    positive_threshold: f32,
    negative_threshold: f32,
    tone: OnePoleLowpass,
}

impl Distortion {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            dc_coeff: 0.0,
            dc_prev: [0.0; MAX_CHANNELS],
            dc_state: [0.0; MAX_CHANNELS],
            positive_threshold: 1.0,
            negative_threshold: 1.0,
            tone: OnePoleLowpass::new(),
        }
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Distortion {
    const TYPE_ID: &'static str = "gain.distortion";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("gain", 0.7, 0.0, 1.0, "Gain", ParamUnit::Generic),
        ParamDef::new("tone", 0.5, 0.0, 1.0, "Tone", ParamUnit::Generic),
        ParamDef::new("level", 0.8, 0.0, 1.0, "Level", ParamUnit::Generic),
        ParamDef::new("asymmetry", 0.3, 0.0, 1.0, "Asymmetry", ParamUnit::Generic),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        self.reset();
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        let gain = params.get(PARAM_GAIN);
        self.positive_threshold = 0.9 - gain * 0.3;
        self.negative_threshold = 1.0 - gain * 0.2 + params.get(PARAM_ASYMMETRY) * 0.2;
        self.dc_coeff = (-2.0 * PI * DC_BLOCK_HZ / self.sample_rate).exp();

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
        let upper = self.positive_threshold;
        let lower = -self.negative_threshold;

        for c in 0..output.num_channels().min(input.num_channels()) {
            let source = input.channel(c);
            for (out, &x) in output.channel_mut(c)[..num_samples].iter_mut().zip(source) {
                let hp = flush_denormal(x - self.dc_prev[c] + self.dc_coeff * self.dc_state[c]);
                self.dc_prev[c] = x;
                self.dc_state[c] = hp;

                let clipped = (hp * drive).clamp(lower, upper);
                *out = self.tone.process(clipped, c) * level;
            }
        }
    }

    fn reset(&mut self) {
        self.dc_prev = [0.0; MAX_CHANNELS];
        self.dc_state = [0.0; MAX_CHANNELS];
        self.tone.reset();
    }
}
