use std::path::PathBuf;
use std::process::ExitCode;

use arbor::{Scene, Settings};
use clap::Parser;
use tracing::{error, info};

/// Scattered particles that assemble into a cone. Space toggles.
#[derive(Debug, Parser)]
#[command(name = "arbor", version)]
struct Cli {
    /// JSON settings file; every field is optional.
    settings: Option<PathBuf>,

    /// Seed for reproducible layouts. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let scene = Scene::new(settings, cli.seed)?;
    info!("Starting viewer");
    arbor::viewer::run(scene)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
