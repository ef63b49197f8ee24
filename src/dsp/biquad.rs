use crate::audio::MAX_CHANNELS;
use std::f32::consts::PI;

/// Biquad filter implementation (2-pole IIR filter)
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
///
/// Coefficients follow the RBJ audio EQ cookbook, normalized so `a0 = 1`.
/// Each channel keeps its own history.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    // Filter coefficients
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Transposed direct form II state, one slot per channel
    s1: [f32; MAX_CHANNELS],
    s2: [f32; MAX_CHANNELS],
}

impl BiquadFilter {
    /// Create a new biquad filter with unity gain (pass-through)
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            s1: [0.0; MAX_CHANNELS],
            s2: [0.0; MAX_CHANNELS],
        }
    }

    /// Set coefficients for a peaking EQ filter
    ///
    /// # Arguments
    /// * `frequency` - Center frequency in Hz
    /// * `q` - Quality factor (bandwidth)
    /// * `gain_db` - Gain in decibels
    /// * `sample_rate` - Sample rate in Hz
    pub fn set_peaking(&mut self, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) {
        let omega = 2.0 * PI * frequency / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let a_gain = 10.0_f32.powf(gain_db / 40.0);
        let alpha = sin_omega / (2.0 * q);

        let a0 = 1.0 + alpha / a_gain;
        self.b0 = (1.0 + alpha * a_gain) / a0;
        self.b1 = (-2.0 * cos_omega) / a0;
        self.b2 = (1.0 - alpha * a_gain) / a0;
        self.a1 = (-2.0 * cos_omega) / a0;
        self.a2 = (1.0 - alpha / a_gain) / a0;
    }

    /// Set coefficients for a low-shelf filter with shelf slope S = 1
    ///
    /// # Arguments
    /// * `frequency` - Shelf midpoint frequency in Hz
    /// * `gain_db` - Shelf gain in decibels
    /// * `sample_rate` - Sample rate in Hz
    pub fn set_low_shelf(&mut self, frequency: f32, gain_db: f32, sample_rate: f32) {
        let (a_gain, cos_omega, beta) = shelf_terms(frequency, gain_db, sample_rate);
        let ap1 = a_gain + 1.0;
        let am1 = a_gain - 1.0;

        let a0 = ap1 + am1 * cos_omega + beta;
        self.b0 = a_gain * (ap1 - am1 * cos_omega + beta) / a0;
        self.b1 = 2.0 * a_gain * (am1 - ap1 * cos_omega) / a0;
        self.b2 = a_gain * (ap1 - am1 * cos_omega - beta) / a0;
        self.a1 = -2.0 * (am1 + ap1 * cos_omega) / a0;
        self.a2 = (ap1 + am1 * cos_omega - beta) / a0;
    }

    /// Set coefficients for a high-shelf filter with shelf slope S = 1
    ///
    /// # Arguments
    /// * `frequency` - Shelf midpoint frequency in Hz
    /// * `gain_db` - Shelf gain in decibels
    /// * `sample_rate` - Sample rate in Hz
    pub fn set_high_shelf(&mut self, frequency: f32, gain_db: f32, sample_rate: f32) {
        let (a_gain, cos_omega, beta) = shelf_terms(frequency, gain_db, sample_rate);
        let ap1 = a_gain + 1.0;
        let am1 = a_gain - 1.0;

        let a0 = ap1 - am1 * cos_omega + beta;
        self.b0 = a_gain * (ap1 + am1 * cos_omega + beta) / a0;
        self.b1 = -2.0 * a_gain * (am1 + ap1 * cos_omega) / a0;
        self.b2 = a_gain * (ap1 + am1 * cos_omega - beta) / a0;
        self.a1 = 2.0 * (am1 - ap1 * cos_omega) / a0;
        self.a2 = (ap1 - am1 * cos_omega - beta) / a0;
    }

    /// Process a single sample
    ///
    /// # Arguments
    /// * `input` - Input sample
    /// * `channel` - Channel index, below `MAX_CHANNELS`
    ///
    /// # Returns
    /// Filtered output sample
    #[inline]
    pub fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        let output = self.b0 * input + self.s1[channel];

        self.s1[channel] = self.b1 * input - self.a1 * output + self.s2[channel];
        self.s2[channel] = self.b2 * input - self.a2 * output;

        output
    }

    /// Reset filter state (clear delay lines)
    pub fn reset(&mut self) {
        self.s1 = [0.0; MAX_CHANNELS];
        self.s2 = [0.0; MAX_CHANNELS];
    }
}

impl Default for BiquadFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared shelf terms: `(A, cos w0, 2*sqrt(A)*alpha)`
fn shelf_terms(frequency: f32, gain_db: f32, sample_rate: f32) -> (f32, f32, f32) {
    let a_gain = 10.0_f32.powf(gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    // S = 1 reduces the cookbook alpha to sin(w0) / sqrt(2)
    let alpha = omega.sin() / std::f32::consts::SQRT_2;
    (a_gain, omega.cos(), 2.0 * a_gain.sqrt() * alpha)
}
