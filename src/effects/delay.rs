use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::DelayLine;

const PARAM_TIME_MS: usize = 0;
const PARAM_FEEDBACK: usize = 1;
const PARAM_MIX: usize = 2;
const PARAM_BPM_SYNC: usize = 3;
const PARAM_BPM: usize = 4;

const MAX_TIME_MS: f32 = 2000.0;

/// Feedback delay with Hermite-interpolated reads and optional tempo sync
///
/// With sync enabled the delay is one quarter note at `bpm`.
#[derive(Debug, Clone)]
pub struct Delay {
    sample_rate: f32,
    lines: Vec<DelayLine>,  // One per channel
    delay_samples: f32,
}

impl Delay {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            lines: Vec::new(),
            delay_samples: 1.0,
        }
    }

    /// Effective delay time in milliseconds for the current settings
    pub fn delay_time_ms(params: &ParamSet) -> f32 {
        if params.get(PARAM_BPM_SYNC) > 0.5 {
            60000.0 / params.get(PARAM_BPM)
        } else {
            params.get(PARAM_TIME_MS)
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Delay {
    const TYPE_ID: &'static str = "time.delay";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("time_ms", 300.0, 1.0, 2000.0, "Time", ParamUnit::Milliseconds),
        ParamDef::new("feedback", 0.4, 0.0, 0.99, "Feedback", ParamUnit::Generic),
        ParamDef::new("mix", 0.5, 0.0, 1.0, "Mix", ParamUnit::Generic),
        ParamDef::new("bpm_sync", 0.0, 0.0, 1.0, "BPM Sync", ParamUnit::Generic),
        ParamDef::new("bpm", 120.0, 60.0, 240.0, "BPM", ParamUnit::Bpm),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        let len = (MAX_TIME_MS * 0.001 * sample_rate) as usize + 4;
        self.lines.resize_with(MAX_CHANNELS, DelayLine::new);
        for line in &mut self.lines {
            line.allocate(len);
        }
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        let max_delay = self.lines.first().map_or(1.0, |line| line.len() as f32 - 3.0).max(1.0);
        let samples = Self::delay_time_ms(params) * self.sample_rate / 1000.0;
        self.delay_samples = samples.clamp(1.0, max_delay);
    }

    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let feedback = params.get(PARAM_FEEDBACK);
        let mix = params.get(PARAM_MIX);
        let delay = self.delay_samples;

        for c in 0..output.num_channels().min(input.num_channels()).min(self.lines.len()) {
            let line = &mut self.lines[c];
            let source = input.channel(c);
            for (out, &x) in output.channel_mut(c)[..num_samples].iter_mut().zip(source) {
                let delayed = line.read_hermite(delay);
                line.write(x + delayed * feedback);
                line.advance();
                *out = x * (1.0 - mix) + delayed * mix;
            }
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }
}
