//! Stereo matching engines producing fixed-point disparity maps

mod block;

pub use block::BlockMatcher;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed-point factor used when sub-pixel refinement is enabled
pub const SUBPIXEL_SCALE: i16 = 16;

/// Marker for pixels without a disparity, in either output encoding
pub const INVALID_DISPARITY: i16 = -1;

/// Largest disparity search range whose scaled values still fit in `i16`
pub const MAX_DISP_SIZE: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Image size mismatch: left {left:?}, right {right:?}")]
    SizeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Empty input image")]
    EmptyImage,

    #[error("Invalid matcher parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;

/// Matching engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatcherParams {
    /// Disparity search range, candidates are `0..disp_size`
    pub disp_size: usize,
    /// Emit disparities scaled by [`SUBPIXEL_SCALE`]
    pub subpixel: bool,
    /// Best cost must be below `uniqueness * second best`
    pub uniqueness: f32,
    /// Half-size of the square matching window
    pub window_radius: usize,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            disp_size: 128,
            subpixel: true,
            uniqueness: 0.95,
            window_radius: 2,
        }
    }
}

impl MatcherParams {
    pub fn validate(&self) -> Result<()> {
        if self.disp_size == 0 || self.disp_size > MAX_DISP_SIZE {
            return Err(MatchError::InvalidParameter(format!(
                "disp_size must be in 1..={MAX_DISP_SIZE}, got {}",
                self.disp_size
            )));
        }
        if !(self.uniqueness > 0.0 && self.uniqueness <= 1.0) {
            return Err(MatchError::InvalidParameter(format!(
                "uniqueness must be in (0, 1], got {}",
                self.uniqueness
            )));
        }
        Ok(())
    }

    /// Divisor to apply to the raw output, if any
    pub fn subpixel_scale(&self) -> Option<i16> {
        self.subpixel.then_some(SUBPIXEL_SCALE)
    }
}

/// Raw matcher result, indexed `[row, col]`
#[derive(Debug, Clone)]
pub struct MatcherOutput {
    pub disparity: Array2<i16>,
    /// `Some(scale)` when values are fixed-point and must be divided by `scale`
    pub subpixel_scale: Option<i16>,
}

/// Stereo matching engine
///
/// Inputs are rectified 8-bit grayscale images of identical size. The call
/// blocks until the full disparity map is available.
pub trait StereoMatcher {
    fn params(&self) -> &MatcherParams;

    fn compute(&mut self, left: ArrayView2<u8>, right: ArrayView2<u8>) -> Result<MatcherOutput>;
}

pub(crate) fn check_inputs(left: &ArrayView2<u8>, right: &ArrayView2<u8>) -> Result<()> {
    if left.dim() != right.dim() {
        return Err(MatchError::SizeMismatch {
            left: (left.ncols(), left.nrows()),
            right: (right.ncols(), right.nrows()),
        });
    }
    if left.is_empty() {
        return Err(MatchError::EmptyImage);
    }
    Ok(())
}
