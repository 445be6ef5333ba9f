use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};

use beatparser::config::{ParseConfig, ParseOptions};
use beatparser::orchestrator::BeatParser;
use beatparser::selector::SelectionStrategy;

#[derive(Parser)]
#[command(
    name = "beatparser",
    version,
    about = "Detect beats, tempo, and time signature in a WAV file",
    long_about = "beatparser analyzes a PCM audio track and prints a ranked, \
        time-ordered list of beats alongside an estimated tempo and time signature."
)]
struct Cli {
    /// Audio file path (WAV)
    audio: PathBuf,

    /// Number of beats to select
    #[arg(short, long, default_value_t = 10)]
    target_count: usize,

    /// Beat selection strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Adaptive)]
    strategy: Strategy,

    /// Minimum confidence for a selected beat, in [0, 1]
    #[arg(long, default_value_t = 0.5)]
    min_confidence: f32,

    /// Configuration file (optional, TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the full result as JSON instead of a human-readable summary
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    Energy,
    Regular,
    Musical,
    Adaptive,
}

impl From<Strategy> for SelectionStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Energy => SelectionStrategy::Energy,
            Strategy::Regular => SelectionStrategy::Regular,
            Strategy::Musical => SelectionStrategy::Musical,
            Strategy::Adaptive => SelectionStrategy::Adaptive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("beatparser v{}", env!("CARGO_PKG_VERSION"));
    info!("Audio: {:?}", cli.audio);
    info!("Strategy: {:?}", cli.strategy);

    let config = match cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            ParseConfig::from_file(&path)
                .with_context(|| format!("failed to load configuration from {:?}", path))?
        }
        None => {
            info!("Using default configuration");
            ParseConfig::default()
        }
    };

    let parser = BeatParser::new(config).context("failed to construct beat parser")?;

    let options = ParseOptions {
        target_count: cli.target_count,
        selection_strategy: cli.strategy.into(),
        min_confidence: cli.min_confidence,
        ..ParseOptions::default()
    };

    info!("Parsing {:?}...", cli.audio);
    let result = parser
        .parse_file(&cli.audio, &options)
        .await
        .with_context(|| format!("failed to parse {:?}", cli.audio))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if let Some(tempo) = &result.tempo {
        println!(
            "tempo: {:.1} bpm (confidence {:.2}){}",
            tempo.bpm,
            tempo.confidence,
            tempo
                .time_signature
                .map(|ts| format!(", {}/{}", ts.numerator, ts.denominator))
                .unwrap_or_default()
        );
    }
    println!("{} beats selected:", result.beats.len());
    for beat in &result.beats {
        println!(
            "  {:>8.3}s  strength={:.2}  confidence={:.2}",
            beat.time_seconds(),
            beat.strength,
            beat.confidence
        );
    }

    info!(
        elapsed_ms = result.metadata.processing_ms,
        "parse complete"
    );
    Ok(())
}
