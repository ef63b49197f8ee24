/// Circular delay line addressed relative to the write head
///
/// A delay of `d` reads the sample written `d` writes ago. Whether the
/// current input is written before or after reading is up to the caller.
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reallocate to `len` samples of silence
    pub fn allocate(&mut self, len: usize) {
        self.buffer.clear();
        self.buffer.resize(len, 0.0);
        self.write_pos = 0;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Zero the contents without reallocating
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Store a sample at the write head
    #[inline]
    pub fn write(&mut self, sample: f32) {
        if let Some(slot) = self.buffer.get_mut(self.write_pos) {
            *slot = sample;
        }
    }

    /// Move the write head forward by one sample
    #[inline]
    pub fn advance(&mut self) {
        if !self.buffer.is_empty() {
            self.write_pos = (self.write_pos + 1) % self.buffer.len();
        }
    }

    /// Integer-delay read
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }
        self.buffer[(self.write_pos + len - delay % len) % len]
    }

    /// Fractional-delay read with linear interpolation
    #[inline]
    pub fn read_linear(&self, delay: f32) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        let whole = delay as usize;
        let frac = delay - whole as f32;
        self.read(whole) * (1.0 - frac) + self.read(whole + 1) * frac
    }

    /// Fractional-delay read with 4-point Hermite interpolation
    #[inline]
    pub fn read_hermite(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }
        let mut position = self.write_pos as f32 - delay;
        if position < 0.0 {
            position += len as f32;
        }
        let index = position as isize;
        let frac = position - index as f32;
        let at = |offset: isize| self.buffer[(index + offset).rem_euclid(len as isize) as usize];
        hermite(frac, at(-1), at(0), at(1), at(2))
    }
}

/// 4-point, 3rd-order Hermite interpolation between `y1` and `y2`
#[inline]
pub fn hermite(frac: f32, y0: f32, y1: f32, y2: f32, y3: f32) -> f32 {
    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
    ((c3 * frac + c2) * frac + c1) * frac + c0
}
