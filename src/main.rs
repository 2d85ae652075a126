use clap::Parser;
use color_eyre::Result;
use freeform_gesture::config::DetectorConfig;
use freeform_gesture::replay::{run_replay, ReplayError, ReplayScript};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Replays a recorded touch stream through the freeform gesture detector
#[derive(Parser, Debug)]
#[command(name = "freeform-replay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Replay script (TOML)
    script: PathBuf,

    /// Detector config file layered over ~/.config/freeform-gesture/detector.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.verbose)?;

    let base = DetectorConfig::load_layered(cli.config.as_deref()).map_err(ReplayError::from)?;
    let script = ReplayScript::load(&cli.script)?;

    info!("Replaying {}", cli.script.display());
    let report = run_replay(&script, base)?;
    info!(
        "{} frames, {} transforms emitted",
        report.frames.len(),
        report.emissions.len()
    );

    println!("{}", report.to_toml()?);
    Ok(())
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(if verbose { Level::DEBUG } else { Level::INFO });
    Ok(())
}

fn setup_logging_env(level: Level) {
    // report goes to stdout, logs to stderr
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}
