use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit};
use crate::audio::{AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::dsp::DelayLine;
use std::f32::consts::PI;

const PARAM_SEMITONES: usize = 0;
const PARAM_MIX: usize = 1;

const GRAIN_SIZE: usize = 2048;
const BUFFER_SIZE: usize = GRAIN_SIZE * 2;
const NUM_HEADS: usize = 2;

/// Two-head granular pitch shifter
///
/// Both heads sweep a grain-length window behind the write position at the
/// pitch ratio, half a grain apart. Their Hann windows overlap-add to unity, so
/// the wet sum needs no extra normalization. The wet signal is mono.
#[derive(Debug, Clone)]
pub struct PitchShifter {
    lines: Vec<DelayLine>,          // One per channel
    read_pos: [f32; NUM_HEADS],     // Head offsets within the grain, in samples
}

impl PitchShifter {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            read_pos: Self::initial_heads(),
        }
    }

    fn initial_heads() -> [f32; NUM_HEADS] {
        [0.0, GRAIN_SIZE as f32 * 0.5]
    }
}

impl Default for PitchShifter {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn hann(position: f32) -> f32 {
    0.5 * (1.0 - (2.0 * PI * position / GRAIN_SIZE as f32).cos())
}

impl EffectProcessor for PitchShifter {
    const TYPE_ID: &'static str = "modulation.pitch_shifter";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("semitones", 0.0, -12.0, 12.0, "Semitones", ParamUnit::Semitones),
        ParamDef::new("mix", 1.0, 0.0, 1.0, "Mix", ParamUnit::Generic),
    ];

    fn prepare(&mut self, _sample_rate: f32, _max_block_size: usize, _params: &ParamSet) {
        self.lines.resize_with(MAX_CHANNELS, DelayLine::new);
        for line in &mut self.lines {
            line.allocate(BUFFER_SIZE);
        }
        self.read_pos = Self::initial_heads();
    }

    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        let ratio = 2.0_f32.powf(params.get(PARAM_SEMITONES) / 12.0);
        // The write head moves one sample per sample, so a head reads at
        // `ratio` when its offset moves at `ratio - 1`
        let step = ratio - 1.0;
        let mix = params.get(PARAM_MIX);
        let channels = output.num_channels().min(input.num_channels()).min(self.lines.len());
        let grain = GRAIN_SIZE as f32;

        for s in 0..num_samples {
            for c in 0..channels {
                self.lines[c].write(input.sample(c, s));
            }

            let mut wet = 0.0;
            for pos in &mut self.read_pos {
                let delay = grain - *pos;
                let mut sample = 0.0;
                for line in &self.lines[..channels] {
                    sample += line.read_hermite(delay);
                }
                wet += sample / channels.max(1) as f32 * hann(*pos);

                *pos += step;
                if *pos >= grain {
                    *pos -= grain;
                } else if *pos < 0.0 {
                    *pos += grain;
                }
            }

            for c in 0..channels {
                *output.sample_mut(c, s) = input.sample(c, s) * (1.0 - mix) + wet * mix;
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
        self.read_pos = Self::initial_heads();
    }
}
