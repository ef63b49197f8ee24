use clap::Parser;
use gearbox_fx::audio::AudioBuffer;
use gearbox_fx::effects::display_label;
use gearbox_fx::io::{play_through, read_wav, write_wav};
use gearbox_fx::EffectEngine;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "gearbox-fx")]
#[command(author, version, about = "Run a WAV file through a guitar effect preset", long_about = None)]
struct Args {
    /// Input WAV file
    #[arg(short, long, required_unless_present = "list_effects")]
    input: Option<PathBuf>,

    /// Preset JSON file; without one the chain is empty
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Output WAV file (32-bit float)
    #[arg(short, long, required_unless_present_any = ["play", "list_effects"])]
    output: Option<PathBuf>,

    /// Play through the default output device instead of writing a file
    #[arg(long, conflicts_with = "output")]
    play: bool,

    /// Block size in frames
    #[arg(short, long, default_value_t = 256)]
    buffer: usize,

    /// Copy input to output without processing
    #[arg(long)]
    bypass: bool,

    /// Print every registered effect type and exit
    #[arg(long)]
    list_effects: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let engine = Arc::new(EffectEngine::new());

    if args.list_effects {
        for type_id in engine.registry().registered_types() {
            println!("{:<28} {}", type_id, display_label(type_id));
        }
        return Ok(());
    }

    let input_path = args.input.ok_or("No input file given")?;
    let block_size = args.buffer.max(1);

    println!("Loading {}", input_path.display());
    let source = read_wav(&input_path)?;
    println!(
        "  {} Hz, {} channels, {} frames ({:.2}s)",
        source.sample_rate,
        source.num_channels(),
        source.num_frames(),
        source.duration()
    );

    engine.prepare(source.sample_rate, block_size);

    if let Some(preset_path) = &args.preset {
        if !engine.load_preset(preset_path) {
            return Err(format!("Failed to load preset {}", preset_path.display()).into());
        }
        println!("Preset: {} ({} effects)", engine.preset_name(), engine.chain().len());
    }
    engine.set_bypass(args.bypass);

    if args.play {
        return play_through(engine, source.buffer, source.sample_rate, block_size);
    }

    let output_path = args.output.ok_or("No output file given")?;
    let rendered = render(&engine, &source.buffer, block_size);
    write_wav(&output_path, &rendered, source.sample_rate)?;
    println!("Wrote {}", output_path.display());

    Ok(())
}

/// Process the whole source in blocks, printing progress as it goes
fn render(engine: &EffectEngine, source: &AudioBuffer, block_size: usize) -> AudioBuffer {
    let total = source.num_samples();
    let mut output = AudioBuffer::new(source.num_channels(), total);
    let mut position = 0;
    let mut last_percent = None;

    while position < total {
        let n = block_size.min(total - position);
        let input = source.view_range(position, n);
        let mut out = output.view_range_mut(position, n);
        engine.process_block(input, &mut out, n);
        position += n;

        let percent = position * 100 / total;
        if last_percent != Some(percent) {
            print!("\rRendering: {:3}%", percent);
            let _ = io::stdout().flush();
            last_percent = Some(percent);
        }
    }
    println!();

    output
}
