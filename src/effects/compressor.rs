use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut};
use crate::dsp::{db_to_linear, linear_to_db, EnvelopeFollower};

const PARAM_THRESHOLD_DB: usize = 0;
const PARAM_RATIO: usize = 1;
const PARAM_ATTACK_MS: usize = 2;
const PARAM_RELEASE_MS: usize = 3;
const PARAM_MAKEUP_DB: usize = 4;
const PARAM_KNEE_DB: usize = 5;

const ENVELOPE_FLOOR_DB: f32 = -96.0;

/// Soft-knee RMS compressor with a dB-domain envelope
#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f32,
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
    makeup: f32,                 // Linear makeup gain
    envelope: EnvelopeFollower,  // Detected level in dB
}

impl Compressor {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            threshold_db: -18.0,
            ratio: 4.0,
            knee_db: 6.0,
            makeup: 1.0,
            envelope: EnvelopeFollower::new(ENVELOPE_FLOOR_DB),
        }
    }

    /// Gain change in dB for a detected level
    ///
    /// Zero below the knee, quadratic inside it, and `(1/ratio - 1) * overshoot`
    /// above it.
    pub fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let diff = level_db - self.threshold_db;
        let half_knee = self.knee_db * 0.5;
        let slope = 1.0 / self.ratio - 1.0;

        if diff < -half_knee {
            0.0
        } else if diff < half_knee {
            let x = (diff + half_knee) / self.knee_db;
            slope * x * x * self.knee_db * 0.5
        } else {
            slope * diff
        }
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Compressor {
    const TYPE_ID: &'static str = "dynamics.compressor";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("threshold_db", -18.0, -60.0, 0.0, "Threshold", ParamUnit::Decibels),
        ParamDef::new("ratio", 4.0, 1.0, 20.0, "Ratio", ParamUnit::Ratio),
        ParamDef::new("attack_ms", 10.0, 0.1, 200.0, "Attack", ParamUnit::Milliseconds),
        ParamDef::new("release_ms", 100.0, 10.0, 2000.0, "Release", ParamUnit::Milliseconds),
        ParamDef::new("makeup_db", 0.0, 0.0, 24.0, "Makeup", ParamUnit::Decibels),
        ParamDef::new("knee_db", 6.0, 0.0, 24.0, "Knee", ParamUnit::Decibels),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        self.reset();
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        self.threshold_db = params.get(PARAM_THRESHOLD_DB);
        self.ratio = params.get(PARAM_RATIO);
        self.knee_db = params.get(PARAM_KNEE_DB);
        self.makeup = db_to_linear(params.get(PARAM_MAKEUP_DB));
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
        let divisor = channels.max(1) as f32;

        for s in 0..num_samples {
            let mut sum_sq = 0.0f32;
            for c in 0..channels {
                let x = input.sample(c, s);
                sum_sq += x * x;
            }
            let level_db = linear_to_db((sum_sq / divisor).sqrt());

            let envelope_db = self.envelope.process(level_db);
            let gain = db_to_linear(self.gain_reduction_db(envelope_db)) * self.makeup;

            for c in 0..channels {
                *output.sample_mut(c, s) = input.sample(c, s) * gain;
            }
        }
    }

    fn reset(&mut self) {
        self.envelope.reset(ENVELOPE_FLOOR_DB);
    }
}
