use std::path::PathBuf;

use reproj_core::CalibrationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Image read error: {0}")]
    ImageRead(#[from] image::ImageError),

    #[error("Invalid image dimensions")]
    InvalidDimensions,

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("Invalid filename pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("KITTI calibration parse error: {0}")]
    KittiParse(String),

    #[error("I/O error on {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl IoError {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::File {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IoError>;
