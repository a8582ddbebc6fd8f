//! I/O for stereo frames, calibration records and point clouds

pub mod calibration;
pub mod cloud;
pub mod error;
pub mod kitti;
pub mod pattern;
pub mod raster;
pub mod visualize;

pub use calibration::{parse_calibration, read_calibration, write_calibration};
pub use cloud::{
    frame_file_name, read_csv, stage_csv, stage_kitti_bin, write_csv, write_kitti_bin, StagedFile,
};
pub use error::{IoError, Result};
pub use pattern::FramePattern;
pub use raster::{load_gray, open_gray};
