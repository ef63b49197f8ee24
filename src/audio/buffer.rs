/// Maximum number of planar channels the chain scratch storage and the
/// per-channel DSP state are sized for.
pub const MAX_CHANNELS: usize = 8;

/// Owning planar multi-channel audio buffer
///
/// Samples are stored contiguously, one channel after another, so every
/// channel is a slice of identical length.
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    data: Vec<f32>,
    num_channels: usize,
    num_samples: usize,
}

impl AudioBuffer {
    /// Create a zero-filled buffer
    ///
    /// # Arguments
    /// * `num_channels` - Number of planar channels
    /// * `num_samples` - Frames per channel
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            data: vec![0.0; num_channels * num_samples],
            num_channels,
            num_samples,
        }
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// Channels shorter than the longest one are zero-padded.
    pub fn from_channels(channels: &[Vec<f32>]) -> Self {
        let num_samples = channels.iter().map(Vec::len).max().unwrap_or(0);
        let mut buffer = Self::new(channels.len(), num_samples);
        for (c, samples) in channels.iter().enumerate() {
            buffer.channel_mut(c)[..samples.len()].copy_from_slice(samples);
        }
        buffer
    }

    /// Reallocate to the given shape and zero-fill
    pub fn resize(&mut self, num_channels: usize, num_samples: usize) {
        self.data.clear();
        self.data.resize(num_channels * num_samples, 0.0);
        self.num_channels = num_channels;
        self.num_samples = num_samples;
    }

    /// Zero-fill in place without reallocating
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * self.num_samples;
        &self.data[start..start + self.num_samples]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.num_samples;
        &mut self.data[start..start + self.num_samples]
    }

    /// Non-owning view over every channel and frame
    pub fn view(&self) -> AudioBufferView<'_> {
        AudioBufferView::new(&self.data, self.num_samples, self.num_channels, self.num_samples)
    }

    /// Mutable non-owning view over every channel and frame
    pub fn view_mut(&mut self) -> AudioBufferViewMut<'_> {
        let stride = self.num_samples;
        AudioBufferViewMut::new(&mut self.data, stride, self.num_channels, self.num_samples)
    }

    /// View restricted to the first `num_channels` channels and `num_samples` frames
    ///
    /// Both counts are clamped to the buffer's shape.
    pub fn view_prefix(&self, num_channels: usize, num_samples: usize) -> AudioBufferView<'_> {
        AudioBufferView::new(
            &self.data,
            self.num_samples,
            num_channels.min(self.num_channels),
            num_samples.min(self.num_samples),
        )
    }

    /// Mutable counterpart of [`AudioBuffer::view_prefix`]
    pub fn view_prefix_mut(&mut self, num_channels: usize, num_samples: usize) -> AudioBufferViewMut<'_> {
        let stride = self.num_samples;
        let num_channels = num_channels.min(self.num_channels);
        let num_samples = num_samples.min(self.num_samples);
        AudioBufferViewMut::new(&mut self.data, stride, num_channels, num_samples)
    }

    /// View of `num_samples` frames starting at `start_frame` in every channel
    ///
    /// The range is clamped to the end of the buffer.
    pub fn view_range(&self, start_frame: usize, num_samples: usize) -> AudioBufferView<'_> {
        let start = start_frame.min(self.num_samples);
        let num_samples = num_samples.min(self.num_samples - start);
        AudioBufferView::new(&self.data[start..], self.num_samples, self.num_channels, num_samples)
    }

    /// Mutable counterpart of [`AudioBuffer::view_range`]
    pub fn view_range_mut(&mut self, start_frame: usize, num_samples: usize) -> AudioBufferViewMut<'_> {
        let stride = self.num_samples;
        let start = start_frame.min(stride);
        let num_samples = num_samples.min(stride - start);
        AudioBufferViewMut::new(&mut self.data[start..], stride, self.num_channels, num_samples)
    }
}

/// Read-only planar view stamped with a channel and frame count
///
/// Channel `c` starts at `c * stride` in the backing slice.
#[derive(Debug, Clone, Copy)]
pub struct AudioBufferView<'a> {
    data: &'a [f32],
    stride: usize,
    num_channels: usize,
    num_samples: usize,
}

impl<'a> AudioBufferView<'a> {
    /// Wrap planar storage
    ///
    /// # Arguments
    /// * `data` - Backing storage, at least `stride * (num_channels - 1) + num_samples` long
    /// * `stride` - Distance between the starts of consecutive channels
    /// * `num_channels` - Channels visible through the view
    /// * `num_samples` - Frames visible per channel
    pub fn new(data: &'a [f32], stride: usize, num_channels: usize, num_samples: usize) -> Self {
        debug_assert!(num_samples <= stride || num_channels <= 1);
        debug_assert!(num_channels == 0 || data.len() >= stride * (num_channels - 1) + num_samples);
        Self {
            data,
            stride,
            num_channels,
            num_samples,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn channel(&self, channel: usize) -> &'a [f32] {
        let start = channel * self.stride;
        &self.data[start..start + self.num_samples]
    }

    #[inline]
    pub fn sample(&self, channel: usize, frame: usize) -> f32 {
        self.data[channel * self.stride + frame]
    }
}

/// Mutable planar view, the write side of a processing call
#[derive(Debug)]
pub struct AudioBufferViewMut<'a> {
    data: &'a mut [f32],
    stride: usize,
    num_channels: usize,
    num_samples: usize,
}

impl<'a> AudioBufferViewMut<'a> {
    pub fn new(data: &'a mut [f32], stride: usize, num_channels: usize, num_samples: usize) -> Self {
        debug_assert!(num_samples <= stride || num_channels <= 1);
        debug_assert!(num_channels == 0 || data.len() >= stride * (num_channels - 1) + num_samples);
        Self {
            data,
            stride,
            num_channels,
            num_samples,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * self.stride;
        &self.data[start..start + self.num_samples]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.stride;
        &mut self.data[start..start + self.num_samples]
    }

    #[inline]
    pub fn sample_mut(&mut self, channel: usize, frame: usize) -> &mut f32 {
        &mut self.data[channel * self.stride + frame]
    }

    /// Reborrow as a shorter-lived mutable view
    pub fn reborrow(&mut self) -> AudioBufferViewMut<'_> {
        AudioBufferViewMut::new(&mut *self.data, self.stride, self.num_channels, self.num_samples)
    }

    /// Reborrow as a read-only view
    pub fn as_view(&self) -> AudioBufferView<'_> {
        AudioBufferView::new(&*self.data, self.stride, self.num_channels, self.num_samples)
    }

    /// Copy the first `num_samples` frames of every shared channel from `source`
    pub fn copy_from(&mut self, source: &AudioBufferView<'_>, num_samples: usize) {
        let channels = self.num_channels.min(source.num_channels());
        for c in 0..channels {
            self.channel_mut(c)[..num_samples].copy_from_slice(&source.channel(c)[..num_samples]);
        }
    }

    /// Zero every visible sample
    pub fn clear(&mut self) {
        for c in 0..self.num_channels {
            self.channel_mut(c).fill(0.0);
        }
    }

    /// Multiply the first `num_samples` frames of every channel by `gain`
    pub fn apply_gain(&mut self, gain: f32, num_samples: usize) {
        for c in 0..self.num_channels {
            for sample in &mut self.channel_mut(c)[..num_samples] {
                *sample *= gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_zero_fills() {
        let mut buffer = AudioBuffer::new(2, 4);
        buffer.channel_mut(1).fill(0.5);
        buffer.resize(3, 8);
        assert_eq!(buffer.num_channels(), 3);
        assert_eq!(buffer.num_samples(), 8);
        for c in 0..3 {
            assert!(buffer.channel(c).iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn views_address_planar_channels() {
        let buffer = AudioBuffer::from_channels(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let view = buffer.view_prefix(2, 2);
        assert_eq!(view.channel(0), &[1.0, 2.0]);
        assert_eq!(view.channel(1), &[4.0, 5.0]);
        assert_eq!(view.sample(1, 1), 5.0);
    }

    #[test]
    fn copy_and_gain_respect_frame_count() {
        let source = AudioBuffer::from_channels(&[vec![1.0; 4], vec![2.0; 4]]);
        let mut dest = AudioBuffer::new(2, 4);
        {
            let mut view = dest.view_mut();
            view.copy_from(&source.view(), 3);
            view.apply_gain(0.5, 2);
        }
        assert_eq!(dest.channel(0), &[0.5, 0.5, 1.0, 0.0]);
        assert_eq!(dest.channel(1), &[1.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn range_views_offset_every_channel() {
        let mut buffer = AudioBuffer::from_channels(&[vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]);
        let view = buffer.view_range(2, 10);
        assert_eq!(view.num_samples(), 2);
        assert_eq!(view.channel(0), &[3.0, 4.0]);
        assert_eq!(view.channel(1), &[7.0, 8.0]);

        buffer.view_range_mut(1, 2).clear();
        assert_eq!(buffer.channel(0), &[1.0, 0.0, 0.0, 4.0]);
        assert_eq!(buffer.channel(1), &[5.0, 0.0, 0.0, 8.0]);
    }
}
