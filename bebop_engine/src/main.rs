// Bebop line generator, CLI entry point.
//
// Schedules a targeting line over a progression and prints it, optionally
// writing a MIDI file. Flags override values from `--config`.
//
// Usage:
//   cargo run -p bebop_engine --bin generate -- "| Dm9 G13 | C∆ |"
//     [--seed N] [--slider X] [--config FILE] [--midi OUT.mid]
//     [--tempo BPM] [--format text|json] [-v]

use bebop_engine::midi::write_midi;
use bebop_engine::phrase::{render_text, to_json};
use bebop_engine::{GenerationConfig, NoteSource, generate_line};
use bebop_theory::default_store;
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate a bebop targeting line over a chord progression")]
struct Args {
    /// Progression, e.g. "| Dm9 G13 | C∆ |"
    progression: String,

    /// RNG seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Register slider 0..1 (overrides config)
    #[arg(long)]
    slider: Option<f64>,

    /// Path to a JSON generation config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the line as a MIDI file
    #[arg(long)]
    midi: Option<PathBuf>,

    /// MIDI tempo in BPM, at least 4 (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u16).range(4..))]
    tempo: Option<u16>,

    /// Output format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log scheduling decisions
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(slider) = args.slider {
        config.slider = slider;
    }
    if let Some(tempo) = args.tempo {
        config.tempo_bpm = tempo;
    }
    info!(
        "seed {} slider {} tempo {} policy {}",
        config.seed,
        config.slider,
        config.tempo_bpm,
        if config.policy.is_some() { "on" } else { "off" }
    );

    let store = default_store();
    let notes = generate_line(&args.progression, &store, &config)?;
    let targets = notes.iter().filter(|n| n.src == NoteSource::Target).count();
    info!("{} notes, {} targets", notes.len(), targets);

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&notes)),
        OutputFormat::Json => println!("{}", to_json(&notes)?),
    }

    if let Some(path) = &args.midi {
        write_midi(&notes, config.tempo_bpm, path)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}
