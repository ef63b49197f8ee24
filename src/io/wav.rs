//! WAV file reading and writing for offline rendering
use crate::audio::AudioBuffer;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    #[error("Unsupported WAV format: {0}")]
    Unsupported(String),
}

/// Decoded audio in planar form
#[derive(Debug, Clone)]
pub struct WavData {
    pub buffer: AudioBuffer,
    pub sample_rate: u32,
}

impl WavData {
    pub fn num_channels(&self) -> usize {
        self.buffer.num_channels()
    }

    pub fn num_frames(&self) -> usize {
        self.buffer.num_samples()
    }

    pub fn duration(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }
}

/// Read a WAV file into a planar buffer, converting integer PCM to [-1, 1]
pub fn read_wav(path: impl AsRef<Path>) -> Result<WavData, WavError> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if num_channels == 0 {
        return Err(WavError::Unsupported("zero channels".to_string()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(WavError::Unsupported(format!(
                    "{}-bit integer samples",
                    spec.bits_per_sample
                )));
            }
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    // Deinterleave
    let num_frames = samples.len() / num_channels;
    let mut buffer = AudioBuffer::new(num_channels, num_frames);
    for c in 0..num_channels {
        let channel = buffer.channel_mut(c);
        for (frame, sample) in channel.iter_mut().enumerate() {
            *sample = samples[frame * num_channels + c];
        }
    }

    Ok(WavData {
        buffer,
        sample_rate: spec.sample_rate,
    })
}

/// Write a planar buffer as 32-bit float WAV
pub fn write_wav(path: impl AsRef<Path>, buffer: &AudioBuffer, sample_rate: u32) -> Result<(), WavError> {
    let spec = hound::WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for frame in 0..buffer.num_samples() {
        for c in 0..buffer.num_channels() {
            writer.write_sample(buffer.channel(c)[frame])?;
        }
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_wav_survives_write_and_read() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tone.wav");
        let buffer = AudioBuffer::from_channels(&[vec![0.25, -0.5, 0.75], vec![0.0, 0.1, -0.1]]);

        write_wav(&path, &buffer, 44100).expect("write");
        let data = read_wav(&path).expect("read");

        assert_eq!(data.sample_rate, 44100);
        assert_eq!(data.num_channels(), 2);
        assert_eq!(data.num_frames(), 3);
        assert_eq!(data.buffer.channel(0), buffer.channel(0));
        assert_eq!(data.buffer.channel(1), buffer.channel(1));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(read_wav("/nonexistent/input.wav"), Err(WavError::Hound(_))));
    }
}
