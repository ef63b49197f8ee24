use super::flush_denormal;
use crate::audio::MAX_CHANNELS;
use std::f32::consts::PI;

/// One-pole low-pass: `y[n] = (1 - a) * x[n] + a * y[n-1]`
#[derive(Debug, Clone)]
pub struct OnePoleLowpass {
    coeff: f32,
    state: [f32; MAX_CHANNELS],
}

impl OnePoleLowpass {
    pub fn new() -> Self {
        Self {
            coeff: 0.0,
            state: [0.0; MAX_CHANNELS],
        }
    }

    /// Set `a = e^(-2π fc / sr)`
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        self.coeff = (-2.0 * PI * cutoff_hz / sample_rate).exp();
    }

    #[inline]
    pub fn process(&mut self, input: f32, channel: usize) -> f32 {
        let state = &mut self.state[channel];
        *state = flush_denormal((1.0 - self.coeff) * input + self.coeff * *state);
        *state
    }

    pub fn reset(&mut self) {
        self.state = [0.0; MAX_CHANNELS];
    }
}

impl Default for OnePoleLowpass {
    fn default() -> Self {
        Self::new()
    }
}
