use super::effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit, FALLBACK_SAMPLE_RATE};
use crate::audio::{AudioBufferView, AudioBufferViewMut};
use crate::dsp::BiquadFilter;

const PARAM_BASS_DB: usize = 0;
const PARAM_MID_DB: usize = 1;
const PARAM_TREBLE_DB: usize = 2;
const PARAM_MID_FREQ: usize = 3;

const BASS_SHELF_HZ: f32 = 80.0;
const TREBLE_SHELF_HZ: f32 = 8000.0;
const MID_Q: f32 = 1.0;

/// Three-band EQ: low shelf, peaking mid and high shelf in series
#[derive(Debug, Clone)]
pub struct ParametricEq {
    sample_rate: f32,
    bass: BiquadFilter,
    mid: BiquadFilter,
    treble: BiquadFilter,
}

impl ParametricEq {
    pub fn new() -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            bass: BiquadFilter::new(),
            mid: BiquadFilter::new(),
            treble: BiquadFilter::new(),
        }
    }
}

impl Default for ParametricEq {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectProcessor for ParametricEq {
    const TYPE_ID: &'static str = "eq.parametric";

    const PARAMS: &'static [ParamDef] = &[
        ParamDef::new("bass_db", 0.0, -12.0, 12.0, "Bass", ParamUnit::Decibels),
        ParamDef::new("mid_db", 0.0, -12.0, 12.0, "Mid", ParamUnit::Decibels),
        ParamDef::new("treble_db", 0.0, -12.0, 12.0, "Treble", ParamUnit::Decibels),
        ParamDef::new("mid_freq", 800.0, 200.0, 5000.0, "Mid Freq", ParamUnit::Hertz),
    ];

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize, params: &ParamSet) {
        self.sample_rate = sample_rate;
        self.reset();
        self.param_changed(params);
    }

    fn param_changed(&mut self, params: &ParamSet) {
        let sr = self.sample_rate;
        self.bass.set_low_shelf(BASS_SHELF_HZ, params.get(PARAM_BASS_DB), sr);
        self.mid.set_peaking(params.get(PARAM_MID_FREQ), MID_Q, params.get(PARAM_MID_DB), sr);
        self.treble.set_high_shelf(TREBLE_SHELF_HZ, params.get(PARAM_TREBLE_DB), sr);
    }

    fn process(
        &mut self,
        _params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        for c in 0..output.num_channels().min(input.num_channels()) {
            let source = input.channel(c);
            let dest = output.channel_mut(c);
            for (out, &x) in dest[..num_samples].iter_mut().zip(&source[..num_samples]) {
                let y = self.bass.process_sample(x, c);
                let y = self.mid.process_sample(y, c);
                *out = self.treble.process_sample(y, c);
            }
        }
    }

    fn reset(&mut self) {
        self.bass.reset();
        self.mid.reset();
        self.treble.reset();
    }
}
