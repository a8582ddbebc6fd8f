use std::fs;
use std::path::PathBuf;

use clap::Parser;
use reproj_io::IoError;
use reproj_matching::MatcherParams;

use crate::CliError;

/// Reproject stereo disparity into per-frame point clouds.
///
/// Filename patterns take one printf-style frame number placeholder, e.g.
/// `left/%06d.png`. Frames are processed from `--first-frame` until either
/// image of a pair is missing.
#[derive(Debug, Parser)]
#[command(name = "reproj", version)]
pub struct Cli {
    /// Left image filename pattern
    pub left: String,

    /// Right image filename pattern
    pub right: String,

    /// Calibration XML filename pattern
    pub calibration: String,

    /// Disparity search range
    #[arg(default_value_t = 128)]
    pub disp_size: usize,

    /// Sub-pixel refinement (0: off, otherwise on)
    #[arg(default_value_t = 1, allow_negative_numbers = true)]
    pub subpixel: i32,

    /// Directory for `<frame>.csv` point clouds
    #[arg(long, default_value = "./csv")]
    pub output_dir: PathBuf,

    /// Number of the first frame
    #[arg(long, default_value_t = 1)]
    pub first_frame: u32,

    /// Also write KITTI `<frame>.bin` point clouds into this directory
    #[arg(long, value_name = "DIR")]
    pub kitti_bin: Option<PathBuf>,

    /// Write disparity and top-down renderings into this directory
    #[arg(long, value_name = "DIR")]
    pub visualize: Option<PathBuf>,

    /// Depth in meters at which the top-down rendering saturates
    #[arg(long, default_value_t = 80.0)]
    pub max_depth: f32,

    /// JSON file with matcher settings; DISP_SIZE and SUBPIXEL still apply
    #[arg(long, value_name = "FILE")]
    pub matcher_config: Option<PathBuf>,
}

impl Cli {
    /// Matcher settings from `--matcher-config` (or defaults), with the
    /// positional search range and sub-pixel switch applied on top
    pub fn matcher_params(&self) -> Result<MatcherParams, CliError> {
        let base = match &self.matcher_config {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
                serde_json::from_str(&text).map_err(|source| CliError::MatcherConfig {
                    path: path.clone(),
                    source,
                })?
            }
            None => MatcherParams::default(),
        };
        Ok(MatcherParams {
            disp_size: self.disp_size,
            subpixel: self.subpixel != 0,
            ..base
        })
    }
}
