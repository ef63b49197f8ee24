use crate::audio::{AudioBufferView, AudioBufferViewMut};

/// Sample rate assumed by effects that have not been prepared yet
pub const FALLBACK_SAMPLE_RATE: f32 = 48000.0;

/// Display unit of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUnit {
    Generic,
    Decibels,
    Milliseconds,
    Hertz,
    Ratio,
    Semitones,
    Bpm,
}

impl ParamUnit {
    /// Short unit suffix shown next to a value
    pub fn symbol(&self) -> &'static str {
        match self {
            ParamUnit::Generic => "",
            ParamUnit::Decibels => "dB",
            ParamUnit::Milliseconds => "ms",
            ParamUnit::Hertz => "Hz",
            ParamUnit::Ratio => ":1",
            ParamUnit::Semitones => "st",
            ParamUnit::Bpm => "bpm",
        }
    }
}

/// Immutable metadata for one effect parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDef {
    pub name: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub label: &'static str,
    pub unit: ParamUnit,
}

impl ParamDef {
    pub const fn new(
        name: &'static str,
        default: f32,
        min: f32,
        max: f32,
        label: &'static str,
        unit: ParamUnit,
    ) -> Self {
        Self {
            name,
            default,
            min,
            max,
            label,
            unit,
        }
    }

    /// Clamp a value into the closed range `[min, max]`
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Current values of an effect's declared parameters
///
/// Values are addressed by their declaration index, so processing code reads
/// them without string lookups. The set of names is fixed at construction.
#[derive(Debug, Clone)]
pub struct ParamSet {
    defs: &'static [ParamDef],
    values: Vec<f32>,
}

impl ParamSet {
    /// Create a set holding every parameter's default value
    pub fn new(defs: &'static [ParamDef]) -> Self {
        Self {
            defs,
            values: defs.iter().map(|def| def.default).collect(),
        }
    }

    pub fn defs(&self) -> &'static [ParamDef] {
        self.defs
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.defs.iter().position(|def| def.name == name)
    }

    /// Value at a declaration index
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.values[index]
    }

    pub fn value(&self, name: &str) -> Option<f32> {
        self.index_of(name).map(|index| self.values[index])
    }

    /// Clamp and store a value at a declaration index, returning the stored value
    pub fn set(&mut self, index: usize, value: f32) -> f32 {
        let clamped = self.defs[index].clamp(value);
        self.values[index] = clamped;
        clamped
    }

    /// Iterate `(definition, current value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static ParamDef, f32)> + '_ {
        self.defs.iter().zip(self.values.iter().copied())
    }
}

/// Per-type DSP behavior behind an effect node
///
/// Implementations own all per-algorithm state. `prepare` allocates and resets
/// it; `process` must be real-time safe: no allocations, no blocking operations.
pub trait EffectProcessor: Send {
    /// Registry type id, e.g. `"gain.overdrive"`
    const TYPE_ID: &'static str;

    /// Parameter declarations in index order
    const PARAMS: &'static [ParamDef];

    /// Size buffers for the sample rate and reset all state to silence
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `max_block_size` - Largest `num_samples` that `process` will receive
    /// * `params` - Current parameter values
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize, params: &ParamSet);

    /// Recompute derived coefficients after a parameter value changed
    fn param_changed(&mut self, _params: &ParamSet) {}

    /// Transform one block
    ///
    /// `input` and `output` share their channel count; `num_samples` never
    /// exceeds the block size given to `prepare`.
    fn process(
        &mut self,
        params: &ParamSet,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    );

    /// Clear filter histories, delay lines and envelopes without reallocating
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &[ParamDef] = &[
        ParamDef::new("gain_db", 0.0, -20.0, 20.0, "Gain", ParamUnit::Decibels),
        ParamDef::new("mix", 0.5, 0.0, 1.0, "Mix", ParamUnit::Generic),
    ];

    #[test]
    fn set_clamps_to_range() {
        let mut params = ParamSet::new(DEFS);
        assert_eq!(params.set(0, 999.0), 20.0);
        assert_eq!(params.set(1, -3.0), 0.0);
        assert_eq!(params.value("gain_db"), Some(20.0));
        assert_eq!(params.value("missing"), None);
    }

    #[test]
    fn starts_at_defaults() {
        let params = ParamSet::new(DEFS);
        let values: Vec<f32> = params.iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![0.0, 0.5]);
        assert_eq!(ParamUnit::Decibels.symbol(), "dB");
    }
}
