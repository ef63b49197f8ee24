//! Play a rendered file through the default output device
use crate::audio::{AudioBuffer, EffectEngine};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Stream `source` through `engine` to the default output device, blocking
/// until the whole file has been played
///
/// The engine must already be prepared at the source's sample rate with a
/// block size of at least `block_size`.
pub fn play_through(
    engine: Arc<EffectEngine>,
    source: AudioBuffer,
    sample_rate: u32,
    block_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if source.num_channels() == 0 {
        return Err("Cannot play a file with no channels".into());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("No output device available")?;
    log::info!("Using audio device: {}", device.name()?);

    let default_config = device.default_output_config()?;
    let sample_format = default_config.sample_format();

    let config = cpal::StreamConfig {
        channels: source.num_channels() as u16,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    log::info!("Output config: {:?} with format {:?}", config, sample_format);

    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));
    let output = AudioBuffer::new(source.num_channels(), block_size);
    let player = Player {
        engine,
        source,
        output,
        block_size,
        position: Arc::clone(&position),
        finished: Arc::clone(&finished),
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, player)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, player)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, player)?,
        _ => return Err("Unsupported sample format".into()),
    };

    stream.play()?;
    while !finished.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(50));
    }
    // Let the device drain its last buffer
    thread::sleep(Duration::from_millis(200));
    log::info!("Playback finished after {} frames", position.load(Ordering::Relaxed));
    Ok(())
}

/// State owned by the audio callback
struct Player {
    engine: Arc<EffectEngine>,
    source: AudioBuffer,
    output: AudioBuffer,
    block_size: usize,
    position: Arc<AtomicUsize>,
    finished: Arc<AtomicBool>,
}

impl Player {
    /// Fill an interleaved device buffer, one engine block at a time
    fn render<T>(&mut self, data: &mut [T])
    where
        T: cpal::Sample + cpal::FromSample<f32>,
    {
        let channels = self.source.num_channels();
        let total = self.source.num_samples();
        let mut frames_done = 0;
        let frames_wanted = data.len() / channels;

        while frames_done < frames_wanted {
            let start = self.position.load(Ordering::Relaxed);
            let n = self.block_size.min(frames_wanted - frames_done);
            let available = total.saturating_sub(start).min(n);

            if available == 0 {
                self.finished.store(true, Ordering::Relaxed);
                for sample in &mut data[frames_done * channels..] {
                    *sample = cpal::Sample::from_sample(0.0f32);
                }
                return;
            }

            self.render_block(start, available);
            for frame in 0..available {
                for c in 0..channels {
                    data[(frames_done + frame) * channels + c] =
                        cpal::Sample::from_sample(self.output.channel(c)[frame]);
                }
            }

            self.position.store(start + available, Ordering::Relaxed);
            frames_done += available;
        }
    }

    fn render_block(&mut self, start: usize, n: usize) {
        let channels = self.source.num_channels();
        let input = self.source.view_range(start, n);
        let mut output = self.output.view_prefix_mut(channels, n);
        self.engine.process_block(input, &mut output, n);
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut player: Player,
) -> Result<cpal::Stream, Box<dyn std::error::Error>>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let err_fn = |err| log::error!("Audio stream error: {}", err);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            player.render(data);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
