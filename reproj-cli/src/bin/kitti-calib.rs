//! Generate per-frame calibration XML files from KITTI calibration files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use reproj_io::kitti::{convert_directory, KittiRig};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "kitti-calib", version, about = "Convert KITTI calibration files into calibration XML")]
struct Args {
    /// Folder containing the KITTI calibration files
    source_folder: PathBuf,

    /// Folder for the resulting calibration files
    result_folder: PathBuf,

    /// Stereo baseline in meters
    #[arg(long, default_value_t = 0.54)]
    baseline: f32,

    /// Camera mounting height in meters
    #[arg(long, default_value_t = 1.65)]
    height: f32,

    /// Camera tilt in radians
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    tilt: f32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let rig = KittiRig {
        baseline: args.baseline,
        height: args.height,
        tilt: args.tilt,
    };

    match convert_directory(&args.source_folder, &args.result_folder, &rig) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
