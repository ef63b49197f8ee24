use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::{DelayLine, Lfo};

const PARAM_RATE: usize = 0;
const PARAM_DEPTH: usize = 1;
const PARAM_MIX: usize = 2;
const PARAM_VOICES: usize = 3;

const MAX_VOICES: usize = 4;
const BASE_DELAY_MS: f32 = 20.0;
const MOD_DELAY_MS: f32 = 10.0;

/// Multi-voice chorus over a shared modulated delay line
///
/// Each voice reads the same per-channel delay line with its own sine LFO,
/// phases spread evenly across the active voices.
#[derive(Debug, Clone)]
pub struct Chorus {
    sample_rate: f32,
    lines: Vec<DelayLine>,     // One per channel
    lfos: [Lfo; MAX_VOICES],
}

impl Chorus {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            lines: Vec::new(),
            lfos: [Lfo::default(); MAX_VOICES],
        }
    }

    fn voices(params: &ParamSet) -> usize {
        (params.get(PARAM_VOICES) as usize).clamp(1, MAX_VOICES)
    }

    fn spread_phases(&mut self, voices: usize) {
        for (v, lfo) in self.lfos.iter_mut().enumerate() {
            lfo.set_phase(v as f32 / voices as f32);
        }
    }

    fn max_delay(&self) -> f32 {
        self.lines.first().map_or(0.0, |line| line.len() as f32 - 2.0)
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for Chorus {
    const TYPE_ID: &'static str = "modulation.chorus";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("rate", 0.5, 0.1, 8.0, "Rate", ParamUnit::Hertz),
        ParamDef::new("depth", 0.5, 0.0, 1.0, "Depth", ParamUnit::Generic),
        ParamDef::new("mix", 0.5, 0.0, 1.0, "Mix", ParamUnit::Generic),
        ParamDef::new("voices", 2.0, 1.0, 4.0, "Voices", ParamUnit::Generic),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        let len = ((BASE_DELAY_MS + MOD_DELAY_MS) * 0.001 * sample_rate) as usize + 4;
        self.lines.resize_with(MAX_CHANNELS, DelayLine::new);
        for line in &mut self.lines {
            line.allocate(len);
        }
        self.spread_phases(Self::voices(params));
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        let rate = params.get(PARAM_RATE);
        for lfo in &mut self.lfos {
            lfo.set_rate(rate, self.sample_rate);
        }
    }

    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let voices = Self::voices(params);
        let mix = params.get(PARAM_MIX);
        let base_delay = BASE_DELAY_MS * 0.001 * self.sample_rate;
        let mod_depth = MOD_DELAY_MS * 0.001 * self.sample_rate * params.get(PARAM_DEPTH);
        let max_delay = self.max_delay().max(1.0);

        let dry_gain = 1.0 - mix;
        let wet_gain = mix / voices as f32;
        let channels = output.num_channels().min(input.num_channels()).min(self.lines.len());

        for s in 0..num_samples {
            for c in 0..channels {
                let x = input.sample(c, s);
                self.lines[c].write(x);
                *output.sample_mut(c, s) = x * dry_gain;
            }

            for lfo in &mut self.lfos[..voices] {
                let delay = (base_delay + mod_depth * lfo.sine()).clamp(1.0, max_delay);
                for c in 0..channels {
                    *output.sample_mut(c, s) += self.lines[c].read_linear(delay) * wet_gain;
                }
                lfo.advance();
            }

            for line in &mut self.lines[..channels] {
                line.advance();
            }
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }
}
