use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::{db_to_linear, EnvelopeFollower};

const PARAM_VOLUME_DB: usize = 0;
const PARAM_LIMITER_THRESHOLD_DB: usize = 1;

const LIMITER_ATTACK_MS: f32 = 1.0;
const LIMITER_RELEASE_MS: f32 = 100.0;

/// Output volume followed by a peak limiter
#[derive(Debug, Clone)]
pub struct Volume {
    sample_rate: f32,
    gain: f32,
    threshold: f32,
    envelopes: [EnvelopeFollower; MAX_CHANNELS],
}

impl Volume {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            gain: 1.0,
            threshold: 1.0,
            envelopes: [EnvelopeFollower::new(0.0); MAX_CHANNELS],
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Volume {
    const TYPE_ID: &'static str = "output.volume";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("volume_db", 0.0, -60.0, 12.0, "Volume", ParamUnit::Decibels),
        ParamDef::new("limiter_threshold_db", 0.0, -18.0, 0.0, "Limiter", ParamUnit::Decibels),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        for env in &mut self.envelopes {
            env.set_times(LIMITER_ATTACK_MS, LIMITER_RELEASE_MS, sample_rate);
        }
        self.reset();
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        self.gain = db_to_linear(params.get(PARAM_VOLUME_DB));
        self.threshold = db_to_linear(params.get(PARAM_LIMITER_THRESHOLD_DB));
    }

    fn process(
        &mut self,
        _params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let threshold = self.threshold;

        for c in 0..output.num_channels().min(input.num_channels()) {
            let env = &mut self.envelopes[c];
            let source = input.channel(c);
            for (out, &x) in output.channel_mut(c)[..num_samples].iter_mut().zip(source) {
                let mut y = x * self.gain;
                let level = env.process(y.abs());
                if level > threshold {
                    y *= threshold / level;
                }
                *out = y;
            }
        }
    }

    fn reset(&mut self) {
        for env in &mut self.envelopes {
            env.reset(0.0);
        }
    }
}
