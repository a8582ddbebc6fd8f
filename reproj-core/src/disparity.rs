//! Dense disparity maps

use ndarray::{Array2, ArrayView2};

use crate::error::{ReprojError, Result};

/// Per-pixel disparity in pixels, indexed `[row, col]`.
///
/// Values `<= 0` (and NaN) mark pixels without a usable match.
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityMap {
    data: Array2<f32>,
}

impl DisparityMap {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Build from row-major values
    pub fn from_vec(width: usize, height: usize, values: Vec<f32>) -> Result<Self> {
        let len = values.len();
        let data = Array2::from_shape_vec((height, width), values).map_err(|_| {
            ReprojError::InvalidInput(format!(
                "{len} disparity values for a {width}x{height} map"
            ))
        })?;
        Ok(Self { data })
    }

    /// Convert a matcher's integer output into disparity units.
    ///
    /// With `subpixel_scale` set the raw values are fixed-point and get divided
    /// by the scale, otherwise they are whole-pixel disparities.
    pub fn from_fixed_point(raw: ArrayView2<i16>, subpixel_scale: Option<i16>) -> Self {
        let data = match subpixel_scale {
            Some(scale) => {
                let inv = 1.0 / f32::from(scale);
                raw.mapv(|d| f32::from(d) * inv)
            }
            None => raw.mapv(f32::from),
        };
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Disparity at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.data.get((y, x)).copied()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Number of pixels carrying a usable disparity
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&d| is_valid(d)).count()
    }
}

/// NaN compares false, so it is rejected along with non-positive values.
#[inline]
pub(crate) fn is_valid(d: f32) -> bool {
    d > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_vec_row_major() {
        let map = DisparityMap::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.get(2, 0), Some(3.0));
        assert_eq!(map.get(0, 1), Some(4.0));
        assert_eq!(map.get(3, 0), None);
    }

    #[test]
    fn test_from_vec_wrong_length() {
        let result = DisparityMap::from_vec(2, 2, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ReprojError::InvalidInput(_))));
    }

    #[test]
    fn test_from_fixed_point_subpixel() {
        let raw = array![[160_i16, -1], [8, 0]];
        let map = DisparityMap::from_fixed_point(raw.view(), Some(16));
        assert_eq!(map.get(0, 0), Some(10.0));
        assert_eq!(map.get(1, 0), Some(-0.0625));
        assert_eq!(map.get(0, 1), Some(0.5));
        assert_eq!(map.get(1, 1), Some(0.0));
        assert_eq!(map.valid_count(), 2);
    }

    #[test]
    fn test_from_fixed_point_whole_pixel() {
        let raw = array![[12_i16, -1]];
        let map = DisparityMap::from_fixed_point(raw.view(), None);
        assert_eq!(map.get(0, 0), Some(12.0));
        assert_eq!(map.get(1, 0), Some(-1.0));
    }

    #[test]
    fn test_valid_count_rejects_nan() {
        let map = DisparityMap::new(array![[f32::NAN, 1.0], [-3.0, 0.0]]);
        assert_eq!(map.valid_count(), 1);
    }
}
