//! Pixel to camera-frame coordinate transformations

mod transform;

pub use transform::CoordinateTransform;
