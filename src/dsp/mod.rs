pub mod biquad;
pub mod delay_line;
pub mod envelope;
pub mod lfo;
pub mod one_pole;

pub use biquad::BiquadFilter;
pub use delay_line::{hermite, DelayLine};
pub use envelope::{time_coefficient, EnvelopeFollower};
pub use lfo::{Lfo, LfoWaveform};
pub use one_pole::OnePoleLowpass;

/// Recursive state below this magnitude is flushed to zero
pub const DENORMAL_FLOOR: f32 = 1e-30;

/// Zero out values small enough to decay into subnormals
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_FLOOR {
        0.0
    } else {
        x
    }
}

/// Convert decibels to a linear amplitude factor
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude to decibels
///
/// A tiny offset keeps silence finite.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * (linear + 1e-10).log10()
}
