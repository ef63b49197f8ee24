use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::{DelayLine, Lfo};

const PARAM_RATE: usize = 0;
const PARAM_DEPTH: usize = 1;
const PARAM_FEEDBACK: usize = 2;
const PARAM_MIX: usize = 3;

const CENTER_DELAY_MS: f32 = 4.0;
const MOD_DELAY_MS: f32 = 3.0;

/// Flanger effect using a short modulated delay with feedback
///
/// The wet signal is fed back into the delay write, so the feedback range is
/// kept strictly inside (-1, 1).
#[derive(Debug, Clone)]
pub struct Flanger {
    sample_rate: f32,
    lines: Vec<DelayLine>,  // One per channel
    lfo: Lfo,
}

impl Flanger {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            lines: Vec::new(),
            lfo: Lfo::default(),
        }
    }
}

impl Default for Flanger {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Flanger {
    const TYPE_ID: &'static str = "modulation.flanger";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("rate", 0.3, 0.1, 5.0, "Rate", ParamUnit::Hertz),
        ParamDef::new("depth", 0.8, 0.0, 1.0, "Depth", ParamUnit::Generic),
        ParamDef::new("feedback", 0.5, -0.95, 0.95, "Feedback", ParamUnit::Generic),
        ParamDef::new("mix", 0.5, 0.0, 1.0, "Mix", ParamUnit::Generic),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        let len = ((CENTER_DELAY_MS + MOD_DELAY_MS) * 0.001 * sample_rate) as usize + 4;
        self.lines.resize_with(MAX_CHANNELS, DelayLine::new);
        for line in &mut self.lines {
            line.allocate(len);
        }
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
        let feedback = params.get(PARAM_FEEDBACK);
        let mix = params.get(PARAM_MIX);
        let center = CENTER_DELAY_MS * 0.001 * self.sample_rate;
        let mod_depth = MOD_DELAY_MS * 0.001 * self.sample_rate * params.get(PARAM_DEPTH);
        let max_delay = self.lines.first().map_or(1.0, |line| line.len() as f32 - 2.0).max(1.0);
        let channels = output.num_channels().min(input.num_channels()).min(self.lines.len());

        for s in 0..num_samples {
            let delay = (center + mod_depth * self.lfo.sine()).clamp(1.0, max_delay);

            for c in 0..channels {
                let x = input.sample(c, s);
                let line = &mut self.lines[c];
                let wet = line.read_linear(delay);
                *output.sample_mut(c, s) = x * (1.0 - mix) + wet * mix;
                line.write(x + wet * feedback);
                line.advance();
            }

            self.lfo.advance();
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }
}
