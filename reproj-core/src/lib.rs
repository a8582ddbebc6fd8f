pub mod camera;
pub mod cloud;
pub mod color;
pub mod coordinate;
pub mod disparity;
pub mod error;

pub use camera::{CameraModel, CameraParameters};
pub use cloud::{Point3D, PointCloud, PointCloudBuilder};
pub use color::{DepthColorMapper, Rgb};
pub use coordinate::CoordinateTransform;
pub use disparity::DisparityMap;
pub use error::{CalibrationError, ReprojError, Result};
