use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::{flush_denormal, DelayLine};

const PARAM_SIZE: usize = 0;
const PARAM_DECAY: usize = 1;
const PARAM_DAMPING: usize = 2;
const PARAM_PRE_DELAY_MS: usize = 3;
const PARAM_MIX: usize = 4;

// Base delays in ms, scaled by 0.5 + size
const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];
const MAX_SIZE_SCALE: f32 = 1.5;

const MIN_COMB_LEN: usize = 64;
const MIN_ALLPASS_LEN: usize = 8;
const ALLPASS_FEEDBACK: f32 = 0.5;
const MAX_PRE_DELAY_SECONDS: f32 = 0.2;

/// Process a single channel sample through the comb bank and all-pass chain
fn process_channel(
    input: f32,
    comb_filters: &mut [CombFilter],
    allpass_filters: &mut [AllPassFilter],
) -> f32 {
    let mut output = 0.0;
    for comb in comb_filters.iter_mut() {
        output += comb.process(input);
    }
    output /= comb_filters.len() as f32;

    for allpass in allpass_filters.iter_mut() {
        output = allpass.process(output);
    }

    output
}

/// Damped feedback comb filter
///
/// Storage is allocated once for the largest room size; `set_len` only moves
/// the wrap point.
#[derive(Debug, Clone, Default)]
struct CombFilter {
    buffer: Vec<f32>,
    len: usize,
    write_pos: usize,
    filter_store: f32,
    damp: f32,
    feedback: f32,
}

impl CombFilter {
    fn allocate(&mut self, capacity: usize) {
        self.buffer = vec![0.0; capacity.max(1)];
        self.len = self.buffer.len();
        self.write_pos = 0;
        self.filter_store = 0.0;
    }

    fn set_len(&mut self, len: usize) {
        self.len = len.clamp(1, self.buffer.len().max(1));
        if self.write_pos >= self.len {
            self.write_pos = 0;
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let Some(&output) = self.buffer.get(self.write_pos) else {
            return 0.0;
        };

        // One-pole lowpass in the feedback path
        self.filter_store =
            flush_denormal(output * (1.0 - self.damp) + self.filter_store * self.damp);
        self.buffer[self.write_pos] = input + self.filter_store * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.len;

        output
    }

    fn mute(&mut self) {
        self.buffer.fill(0.0);
        self.filter_store = 0.0;
        self.write_pos = 0;
    }
}

/// Schroeder all-pass diffuser
#[derive(Debug, Clone, Default)]
struct AllPassFilter {
    buffer: Vec<f32>,
    len: usize,
    write_pos: usize,
}

impl AllPassFilter {
    fn allocate(&mut self, capacity: usize) {
        self.buffer = vec![0.0; capacity.max(1)];
        self.len = self.buffer.len();
        self.write_pos = 0;
    }

    fn set_len(&mut self, len: usize) {
        self.len = len.clamp(1, self.buffer.len().max(1));
        if self.write_pos >= self.len {
            self.write_pos = 0;
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let Some(&delayed) = self.buffer.get(self.write_pos) else {
            return 0.0;
        };
        let output = delayed - input;

        self.buffer[self.write_pos] = input + delayed * ALLPASS_FEEDBACK;
        self.write_pos = (self.write_pos + 1) % self.len;

        output
    }

    fn mute(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Reverb: pre-delay, four parallel damped combs and two series all-passes
#[derive(Debug, Clone)]
pub struct Reverb {
    sample_rate: f32,
    pre_delay: Vec<DelayLine>,                      // One per channel
    pre_delay_samples: usize,
    combs: Vec<[CombFilter; COMB_DELAYS_MS.len()]>,  // One bank per channel
    allpasses: Vec<[AllPassFilter; ALLPASS_DELAYS_MS.len()]>,
}

impl Reverb {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            pre_delay: Vec::new(),
            pre_delay_samples: 0,
            combs: Vec::new(),
            allpasses: Vec::new(),
        }
    }

    fn ms_to_samples(&self, ms: f32, scale: f32) -> usize {
        (ms * scale * self.sample_rate / 1000.0) as usize
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Reverb {
    const TYPE_ID: &'static str = "time.reverb";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("size", 0.5, 0.0, 1.0, "Size", ParamUnit::Generic),
        ParamDef::new("decay", 0.5, 0.0, 1.0, "Decay", ParamUnit::Generic),
        ParamDef::new("damping", 0.5, 0.0, 1.0, "Damping", ParamUnit::Generic),
        ParamDef::new("pre_delay_ms", 10.0, 0.0, 100.0, "Pre-Delay", ParamUnit::Milliseconds),
        ParamDef::new("mix", 0.3, 0.0, 1.0, "Mix", ParamUnit::Generic),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;

        let pre_delay_len = (sample_rate * MAX_PRE_DELAY_SECONDS) as usize;
        self.pre_delay.resize_with(MAX_CHANNELS, DelayLine::new);
        for line in &mut self.pre_delay {
            line.allocate(pre_delay_len.max(1));
        }

        let comb_capacity: Vec<usize> = COMB_DELAYS_MS
            .iter()
            .map(|&ms| self.ms_to_samples(ms, MAX_SIZE_SCALE).max(MIN_COMB_LEN))
            .collect();
        let allpass_capacity: Vec<usize> = ALLPASS_DELAYS_MS
            .iter()
            .map(|&ms| self.ms_to_samples(ms, MAX_SIZE_SCALE).max(MIN_ALLPASS_LEN))
            .collect();

        self.combs.resize_with(MAX_CHANNELS, Default::default);
        self.allpasses.resize_with(MAX_CHANNELS, Default::default);
        for bank in &mut self.combs {
            for (comb, &capacity) in bank.iter_mut().zip(&comb_capacity) {
                comb.allocate(capacity);
            }
        }
        for chain in &mut self.allpasses {
            for (allpass, &capacity) in chain.iter_mut().zip(&allpass_capacity) {
                allpass.allocate(capacity);
            }
        }

        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        let scale = 0.5 + params.get(PARAM_SIZE);
        let feedback = 0.6 + params.get(PARAM_DECAY) * 0.35;
        let damp = params.get(PARAM_DAMPING) * 0.5;

        let pre_delay_len = self.pre_delay.first().map_or(1, DelayLine::len);
        self.pre_delay_samples = self
            .ms_to_samples(params.get(PARAM_PRE_DELAY_MS), 1.0)
            .min(pre_delay_len.saturating_sub(1));

        let comb_lens = COMB_DELAYS_MS.map(|ms| self.ms_to_samples(ms, scale).max(MIN_COMB_LEN));
        let allpass_lens = ALLPASS_DELAYS_MS.map(|ms| self.ms_to_samples(ms, scale).max(MIN_ALLPASS_LEN));

        for bank in &mut self.combs {
            for (comb, &len) in bank.iter_mut().zip(&comb_lens) {
                comb.set_len(len);
                comb.feedback = feedback;
                comb.damp = damp;
            }
        }
        for chain in &mut self.allpasses {
            for (allpass, &len) in chain.iter_mut().zip(&allpass_lens) {
                allpass.set_len(len);
            }
        }
    }

    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let mix = params.get(PARAM_MIX);
        let channels = output
            .num_channels()
            .min(input.num_channels())
            .min(self.combs.len());

        for c in 0..channels {
            let line = &mut self.pre_delay[c];
            let combs = &mut self.combs[c];
            let allpasses = &mut self.allpasses[c];
            let source = input.channel(c);

            for (out, &x) in output.channel_mut(c)[..num_samples].iter_mut().zip(source) {
                line.write(x);
                let delayed = line.read(self.pre_delay_samples);
                line.advance();

                let wet = process_channel(delayed, combs, allpasses);
                *out = x * (1.0 - mix) + wet * mix;
            }
        }
    }

    fn reset(&mut self) {
        for line in &mut self.pre_delay {
            line.clear();
        }
        for comb in self.combs.iter_mut().flatten() {
            comb.mute();
        }
        for allpass in self.allpasses.iter_mut().flatten() {
            allpass.mute();
        }
    }
}
