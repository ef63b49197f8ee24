use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::Lfo;
use std::f32::consts::PI;

const PARAM_RATE: usize = 0;
const PARAM_DEPTH: usize = 1;
const PARAM_FEEDBACK: usize = 2;
const PARAM_MIX: usize = 3;

const NUM_STAGES: usize = 4;
const SWEEP_MIN_HZ: f32 = 100.0;
const SWEEP_MAX_HZ: f32 = 3000.0;

/// Single first-order all-pass section, `y[n] = k*x[n] + x[n-1] - k*y[n-1]`
#[derive(Debug, Clone, Copy, Default)]
struct AllPassStage {
    x_prev: f32,
    y_prev: f32,
}

impl AllPassStage {
    #[inline]
    fn process(&mut self, x: f32, k: f32) -> f32 {
        let y = k * x + self.x_prev - k * self.y_prev;
        self.x_prev = x;
        self.y_prev = y;
        y
    }
}

/// Four cascaded all-pass stages swept by a sine LFO, with global feedback
#[derive(Debug, Clone)]
pub struct Phaser {
    sample_rate: f32,
    stages: [[AllPassStage; NUM_STAGES]; MAX_CHANNELS],
    feedback_state: [f32; MAX_CHANNELS],  // Last cascade output per channel
    lfo: Lfo,
}

impl Phaser {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            stages: [[AllPassStage::default(); NUM_STAGES]; MAX_CHANNELS],
            feedback_state: [0.0; MAX_CHANNELS],
            lfo: Lfo::default(),
        }
    }
}

impl Default for Phaser {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Phaser {
    const TYPE_ID: &'static str = "modulation.phaser";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("rate", 0.5, 0.1, 5.0, "Rate", ParamUnit::Hertz),
        ParamDef::new("depth", 0.8, 0.0, 1.0, "Depth", ParamUnit::Generic),
        ParamDef::new("feedback", 0.5, 0.0, 0.9, "Feedback", ParamUnit::Generic),
        ParamDef::new("mix", 0.5, 0.0, 1.0, "Mix", ParamUnit::Generic),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        self.reset();
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
        let feedback = params.get(PARAM_FEEDBACK);
        let mix = params.get(PARAM_MIX);
        let channels = output.num_channels().min(input.num_channels());

        for s in 0..num_samples {
            let sweep = 0.5 * (1.0 + self.lfo.sine());
            let center = SWEEP_MIN_HZ + (SWEEP_MAX_HZ - SWEEP_MIN_HZ) * sweep * depth;
            let t = (PI * center / self.sample_rate).tan();
            let k = (t - 1.0) / (t + 1.0);
            self.lfo.advance();

            for c in 0..channels {
                let dry = input.sample(c, s);
                let mut x = dry + self.feedback_state[c] * feedback;
                for stage in &mut self.stages[c] {
                    x = stage.process(x, k);
                }
                self.feedback_state[c] = x;
                *output.sample_mut(c, s) = dry * (1.0 - mix) + x * mix;
            }
        }
    }

    fn reset(&mut self) {
        self.stages = [[AllPassStage::default(); NUM_STAGES]; MAX_CHANNELS];
        self.feedback_state = [0.0; MAX_CHANNELS];
    }
}
