use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut};
use crate::dsp::{db_to_linear, EnvelopeFollower};

const PARAM_THRESHOLD_DB: usize = 0;
const PARAM_ATTACK_MS: usize = 1;
const PARAM_RELEASE_MS: usize = 2;

// Fraction of the distance to the open/closed target covered per sample
const GATE_SMOOTHING: f32 = 0.01;

/// Noise gate keyed by the loudest channel
///
/// A peak envelope is compared against the threshold and the resulting
/// open/closed target is smoothed into the applied gain.
#[derive(Debug, Clone)]
pub struct NoiseGate {
    sample_rate: f32,
    threshold: f32,              // Linear open threshold
    envelope: EnvelopeFollower,  // Peak level across channels
    gate: f32,                   // Applied gain, 0.0 closed to 1.0 open
}

impl NoiseGate {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            threshold: 0.0,
            envelope: EnvelopeFollower::new(0.0),
            gate: 0.0,
        }
    }
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for NoiseGate {
    const TYPE_ID: &'static str = "dynamics.noise_gate";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("threshold_db", -60.0, -96.0, 0.0, "Threshold", ParamUnit::Decibels),
        ParamDef::new("attack_ms", 5.0, 0.1, 100.0, "Attack", ParamUnit::Milliseconds),
        ParamDef::new("release_ms", 100.0, 10.0, 2000.0, "Release", ParamUnit::Milliseconds),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        self.reset();
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        self.threshold = db_to_linear(params.get(PARAM_THRESHOLD_DB));
        self.envelope.set_times(
            params.get(PARAM_ATTACK_MS),
            params.get(PARAM_RELEASE_MS),
            self.sample_rate,
        );
    }

    fn process(
        &mut self,
        _params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let channels = output.num_channels().min(input.num_channels());

        for s in 0..num_samples {
            let mut peak = 0.0f32;
            for c in 0..channels {
                peak = peak.max(input.sample(c, s).abs());
            }

            let level = self.envelope.process(peak);
            let target = if level > self.threshold { 1.0 } else { 0.0 };
            self.gate += GATE_SMOOTHING * (target - self.gate);

            for c in 0..channels {
                *output.sample_mut(c, s) = input.sample(c, s) * self.gate;
            }
        }
    }

    fn reset(&mut self) {
        self.envelope.reset(0.0);
        self.gate = 0.0;
    }
}
