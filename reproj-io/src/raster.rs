//! Grayscale image loading

use std::path::Path;

use image::{DynamicImage, GrayImage};
use ndarray::Array2;
use tracing::debug;

use crate::error::{IoError, Result};

/// Open an image and convert it to 8-bit grayscale, shape `[height, width]`
pub fn open_gray<P: AsRef<Path>>(path: P) -> Result<Array2<u8>> {
    let img = image::open(path.as_ref())?;
    gray_array(&img)
}

/// Load a frame image, returning `None` if it is missing or cannot be decoded.
///
/// A missing image marks the end of a frame sequence, so this is not an error.
pub fn load_gray<P: AsRef<Path>>(path: P) -> Option<Array2<u8>> {
    let path = path.as_ref();
    match open_gray(path) {
        Ok(gray) => Some(gray),
        Err(err) => {
            debug!(path = %path.display(), %err, "image not loaded");
            None
        }
    }
}

/// Luma conversion of a decoded image
pub fn gray_array(img: &DynamicImage) -> Result<Array2<u8>> {
    let gray: GrayImage = img.to_luma8();
    let (width, height) = gray.dimensions();
    Array2::from_shape_vec((height as usize, width as usize), gray.into_raw())
        .map_err(|_| IoError::InvalidDimensions)
}
