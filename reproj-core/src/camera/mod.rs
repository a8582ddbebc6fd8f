//! Stereo camera calibration model

mod model;

pub use model::{CameraModel, CameraParameters};
