/// One-pole smoothing coefficient for a time constant
///
/// # Arguments
/// * `time_ms` - Time constant in milliseconds
/// * `sample_rate` - Sample rate in Hz
pub fn time_coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    (-1.0 / (sample_rate * time_ms * 0.001)).exp()
}

/// Level follower with separate attack and release smoothing
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeFollower {
    attack_coeff: f32,
    release_coeff: f32,
    value: f32,
}

impl EnvelopeFollower {
    pub fn new(initial: f32) -> Self {
        Self {
            attack_coeff: 0.0,
            release_coeff: 0.0,
            value: initial,
        }
    }

    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: f32) {
        self.attack_coeff = time_coefficient(attack_ms, sample_rate);
        self.release_coeff = time_coefficient(release_ms, sample_rate);
    }

    /// Track `level`, using the attack coefficient while rising
    #[inline]
    pub fn process(&mut self, level: f32) -> f32 {
        let coeff = if level > self.value {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.value = level + coeff * (self.value - level);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self, value: f32) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_fast_and_falls_slow() {
        let mut env = EnvelopeFollower::new(0.0);
        env.set_times(1.0, 100.0, 48000.0);
        for _ in 0..480 {
            env.process(1.0);
        }
        assert!(env.value() > 0.99);
        for _ in 0..480 {
            env.process(0.0);
        }
        assert!(env.value() > 0.85, "release too fast: {}", env.value());
    }
}
