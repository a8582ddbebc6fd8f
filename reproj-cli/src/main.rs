use std::process::ExitCode;

use clap::Parser;
use reproj_cli::Cli;
use tracing::{error, info};

fn main() -> ExitCode {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=reproj_cli=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match reproj_cli::run(&cli) {
        Ok(summary) => {
            info!(
                frames = summary.frames_processed,
                points = summary.total_points,
                match_secs = summary.total_match_time.as_secs_f64(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
