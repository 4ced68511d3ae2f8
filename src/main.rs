// src/main.rs
use anyhow::Result;
use clap::Parser;
use holo_hud::config::AppSettings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "holo_hud")]
#[command(about = "Replay recorded hand landmarks through the HUD mode controller")]
#[command(version)]
struct Cli {
    /// JSON-lines recording of frames and key presses
    recording: PathBuf,

    /// Controller thresholds as JSON (defaults apply to missing keys)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export frames.csv and summary.json; without a directory, uses Documents/HoloHud
    #[arg(short, long, num_args = 0..=1)]
    export: Option<Option<PathBuf>>,

    /// Pace events to their recorded timestamps
    #[arg(long)]
    realtime: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut settings = AppSettings::new(cli.recording);
    settings.config_path = cli.config;
    settings.export_directory = cli
        .export
        .map(|dir| dir.unwrap_or_else(AppSettings::default_export_directory));
    settings.realtime = cli.realtime;

    let stats = holo_hud::replay::run(&settings).await?;
    println!(
        "{} frames ({} skipped), {} keys, {} effects",
        stats.frames, stats.skipped_frames, stats.keys, stats.effects
    );
    Ok(())
}
