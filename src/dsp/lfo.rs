use std::f32::consts::PI;

/// Low-frequency oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoWaveform {
    Sine,
    Triangle,
    Square,
}

impl LfoWaveform {
    /// Map a continuous selector value to a shape, rounding to the nearest index
    pub fn from_value(value: f32) -> Self {
        match (value + 0.5) as i32 {
            1 => LfoWaveform::Triangle,
            2 => LfoWaveform::Square,
            _ => LfoWaveform::Sine,
        }
    }

    /// Bipolar output in [-1, 1] for a phase in [0, 1)
    #[inline]
    pub fn value_at(&self, phase: f32) -> f32 {
        match self {
            LfoWaveform::Sine => (2.0 * PI * phase).sin(),
            LfoWaveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            LfoWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Phase accumulator in cycles, wrapping at 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct Lfo {
    phase: f32,
    increment: f32,
}

impl Lfo {
    pub fn new(phase: f32) -> Self {
        Self {
            phase,
            increment: 0.0,
        }
    }

    pub fn set_rate(&mut self, rate_hz: f32, sample_rate: f32) {
        self.increment = rate_hz / sample_rate;
    }

    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    #[inline]
    pub fn sine(&self) -> f32 {
        LfoWaveform::Sine.value_at(self.phase)
    }

    #[inline]
    pub fn advance(&mut self) {
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }
}
