use ndarray::{aview1, Array2, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    check_inputs, MatcherOutput, MatcherParams, Result, StereoMatcher, INVALID_DISPARITY,
    SUBPIXEL_SCALE,
};

/// Winner-take-all SAD block matcher on the CPU
///
/// Rows are matched in parallel on the rayon global pool. Pixels whose
/// window leaves the image, or whose best match fails the uniqueness test,
/// are marked [`INVALID_DISPARITY`].
#[derive(Debug, Clone)]
pub struct BlockMatcher {
    params: MatcherParams,
}

impl BlockMatcher {
    pub fn new(params: MatcherParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    fn match_row(&self, left: &ArrayView2<u8>, right: &ArrayView2<u8>, y: usize) -> Vec<i16> {
        let (height, width) = left.dim();
        let r = self.params.window_radius;
        let mut row = vec![INVALID_DISPARITY; width];

        if y < r || y + r >= height {
            return row;
        }

        let mut costs = Vec::with_capacity(self.params.disp_size);
        for (x, out) in row.iter_mut().enumerate() {
            if x < r || x + r >= width {
                continue;
            }

            // right window must stay inside the image: x - d >= r
            let candidates = self.params.disp_size.min(x - r + 1);
            costs.clear();
            costs.extend((0..candidates).map(|d| sad(left, right, x, y, d, r)));

            if let Some(d) = self.select(&costs) {
                *out = d;
            }
        }

        row
    }

    /// Pick the disparity for one pixel's cost curve
    fn select(&self, costs: &[u32]) -> Option<i16> {
        let (best, &best_cost) = costs.iter().enumerate().min_by_key(|&(_, c)| *c)?;

        // neighbours of the minimum are part of the same basin
        let second = costs
            .iter()
            .enumerate()
            .filter(|&(d, _)| d.abs_diff(best) > 1)
            .map(|(_, &c)| c)
            .min();
        if let Some(second) = second {
            if best_cost as f32 >= self.params.uniqueness * second as f32 {
                return None;
            }
        }

        if !self.params.subpixel {
            return Some(best as i16);
        }

        let mut disparity = best as f32;
        if best > 0 && best + 1 < costs.len() {
            let c0 = costs[best - 1] as f32;
            let c1 = best_cost as f32;
            let c2 = costs[best + 1] as f32;
            let denom = c0 - 2.0 * c1 + c2;
            if denom > 0.0 {
                disparity += (c0 - c2) / (2.0 * denom);
            }
        }

        Some((disparity * f32::from(SUBPIXEL_SCALE)).round() as i16)
    }
}

impl StereoMatcher for BlockMatcher {
    fn params(&self) -> &MatcherParams {
        &self.params
    }

    fn compute(&mut self, left: ArrayView2<u8>, right: ArrayView2<u8>) -> Result<MatcherOutput> {
        check_inputs(&left, &right)?;
        let (height, width) = left.dim();
        debug!(width, height, disp_size = self.params.disp_size, "block matching");

        let this = &*self;
        let rows: Vec<Vec<i16>> = (0..height)
            .into_par_iter()
            .map(|y| this.match_row(&left, &right, y))
            .collect();

        let mut disparity = Array2::from_elem((height, width), INVALID_DISPARITY);
        for (mut dst, src) in disparity.outer_iter_mut().zip(rows.iter()) {
            dst.assign(&aview1(src.as_slice()));
        }

        Ok(MatcherOutput {
            disparity,
            subpixel_scale: self.params.subpixel_scale(),
        })
    }
}

/// Sum of absolute differences between the left window at `x` and the right
/// window at `x - d`
#[inline]
fn sad(left: &ArrayView2<u8>, right: &ArrayView2<u8>, x: usize, y: usize, d: usize, r: usize) -> u32 {
    let mut cost = 0u32;
    for wy in y - r..=y + r {
        for wx in x - r..=x + r {
            cost += u32::from(left[[wy, wx]].abs_diff(right[[wy, wx - d]]));
        }
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchError;

    fn texture(x: usize, y: usize) -> u8 {
        let mut h = (x as u32).wrapping_mul(0x9E37_79B9) ^ (y as u32).wrapping_mul(0x85EB_CA6B);
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        (h & 0xFF) as u8
    }

    /// Left/right pair where every left pixel matches the right pixel `shift` columns to the left
    fn shifted_pair(width: usize, height: usize, shift: usize) -> (Array2<u8>, Array2<u8>) {
        let left = Array2::from_shape_fn((height, width), |(y, x)| texture(x, y));
        let right = Array2::from_shape_fn((height, width), |(y, x)| texture(x + shift, y));
        (left, right)
    }

    #[test]
    fn test_recovers_constant_shift() {
        let (left, right) = shifted_pair(48, 20, 4);
        let mut matcher = BlockMatcher::new(MatcherParams {
            disp_size: 16,
            subpixel: false,
            ..Default::default()
        })
        .unwrap();

        let out = matcher.compute(left.view(), right.view()).unwrap();
        assert_eq!(out.subpixel_scale, None);
        assert_eq!(out.disparity.dim(), (20, 48));

        // interior pixels with the full search range available
        for y in 2..18 {
            for x in 18..46 {
                assert_eq!(out.disparity[[y, x]], 4, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_subpixel_output_is_scaled() {
        let (left, right) = shifted_pair(48, 20, 6);
        let mut matcher = BlockMatcher::new(MatcherParams {
            disp_size: 16,
            ..Default::default()
        })
        .unwrap();

        let out = matcher.compute(left.view(), right.view()).unwrap();
        assert_eq!(out.subpixel_scale, Some(SUBPIXEL_SCALE));

        let d = out.disparity[[10, 30]];
        assert!((d - 6 * SUBPIXEL_SCALE).abs() <= SUBPIXEL_SCALE / 2, "got {d}");
    }

    #[test]
    fn test_borders_are_invalid() {
        let (left, right) = shifted_pair(32, 12, 2);
        let mut matcher = BlockMatcher::new(MatcherParams {
            disp_size: 8,
            window_radius: 2,
            ..Default::default()
        })
        .unwrap();

        let out = matcher.compute(left.view(), right.view()).unwrap();
        for x in 0..32 {
            assert_eq!(out.disparity[[0, x]], INVALID_DISPARITY);
            assert_eq!(out.disparity[[11, x]], INVALID_DISPARITY);
        }
        for y in 0..12 {
            assert_eq!(out.disparity[[y, 0]], INVALID_DISPARITY);
            assert_eq!(out.disparity[[y, 31]], INVALID_DISPARITY);
        }
    }

    #[test]
    fn test_textureless_input_has_no_disparity() {
        let flat = Array2::from_elem((16, 32), 128u8);
        let mut matcher = BlockMatcher::new(MatcherParams {
            disp_size: 8,
            subpixel: false,
            ..Default::default()
        })
        .unwrap();

        let out = matcher.compute(flat.view(), flat.view()).unwrap();
        // only pixels with too few candidates to be ambiguous may report zero
        assert!(out.disparity.iter().all(|&d| d <= 0));
        assert_eq!(out.disparity[[8, 16]], INVALID_DISPARITY);
    }

    #[test]
    fn test_size_mismatch() {
        let left = Array2::<u8>::zeros((10, 20));
        let right = Array2::<u8>::zeros((10, 21));
        let mut matcher = BlockMatcher::new(MatcherParams::default()).unwrap();
        let err = matcher.compute(left.view(), right.view()).unwrap_err();
        assert!(matches!(err, MatchError::SizeMismatch { .. }));
    }

    #[test]
    fn test_empty_input() {
        let empty = Array2::<u8>::zeros((0, 0));
        let mut matcher = BlockMatcher::new(MatcherParams::default()).unwrap();
        assert_eq!(
            matcher.compute(empty.view(), empty.view()).unwrap_err(),
            MatchError::EmptyImage
        );
    }

    #[test]
    fn test_rejects_invalid_params() {
        let result = BlockMatcher::new(MatcherParams {
            disp_size: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
