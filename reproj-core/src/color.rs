//! Depth and disparity color maps for visualization

use crate::error::{ReprojError, Result};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }
}

/// Hue sectors per full turn (60 degrees each)
const HUE_SECTORS: f32 = 6.0;

/// Hue span used for depth, as a fraction of a full turn. Near points land
/// at 0.6 (blue), far points at 0 (red).
const HUE_RANGE: f32 = 0.6;

/// Indices into `[v, v(1-s), v(1-s*f), v(1-s(1-f))]` for (b, g, r), per sector
const SECTOR_DATA: [[usize; 3]; 6] = [
    [1, 3, 0],
    [1, 0, 2],
    [3, 0, 1],
    [0, 2, 1],
    [0, 1, 3],
    [2, 1, 0],
];

/// Maps depth to an HSV hue ramp at full saturation and value
#[derive(Debug, Clone, Copy)]
pub struct DepthColorMapper {
    max_depth: f32,
}

impl Default for DepthColorMapper {
    fn default() -> Self {
        Self { max_depth: 80.0 }
    }
}

impl DepthColorMapper {
    /// Mapper that saturates at `max_depth` meters, which must be positive
    /// and finite
    pub fn with_max_depth(max_depth: f32) -> Result<Self> {
        if !(max_depth > 0.0 && max_depth.is_finite()) {
            return Err(ReprojError::InvalidInput(format!(
                "max depth must be positive and finite, got {max_depth}"
            )));
        }
        Ok(Self { max_depth })
    }

    pub fn max_depth(&self) -> f32 {
        self.max_depth
    }

    /// Color for a camera-frame depth, clamped to `[0, max_depth]`
    pub fn color_for_depth(&self, depth: f32) -> Rgb {
        Self::color_for(depth.clamp(0.0, self.max_depth) / self.max_depth)
    }

    /// Color for a normalized depth in `[0, 1]`.
    ///
    /// Out-of-range input is clamped and NaN is treated as far.
    pub fn color_for(normalized: f32) -> Rgb {
        let val = if normalized.is_nan() {
            1.0
        } else {
            normalized.clamp(0.0, 1.0)
        };
        Self::hue_to_rgb(HUE_RANGE * (1.0 - val) * HUE_SECTORS)
    }

    /// HSV to RGB with `s = v = 1`, hue given in sectors (`[0, 6)` is one turn)
    pub fn hue_to_rgb(hue: f32) -> Rgb {
        let (s, v) = (1.0_f32, 1.0_f32);

        let h = if hue.is_finite() {
            hue.rem_euclid(HUE_SECTORS)
        } else {
            0.0
        };
        let mut sector = h.floor() as i32;
        let mut f = h - sector as f32;
        // rem_euclid may round up to exactly 6.0 for tiny negative inputs
        if !(0..6).contains(&sector) {
            sector = 0;
            f = 0.0;
        }

        let tab = [v, v * (1.0 - s), v * (1.0 - s * f), v * (1.0 - s * (1.0 - f))];
        let [bi, gi, ri] = SECTOR_DATA[sector as usize];

        Rgb([to_u8(tab[ri]), to_u8(tab[gi]), to_u8(tab[bi])])
    }
}

/// OpenCV-style JET colormap lookup for an 8-bit intensity
pub fn jet(value: u8) -> Rgb {
    const R: [(f32, f32); 5] = [(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
    const G: [(f32, f32); 6] = [
        (0.0, 0.0),
        (0.125, 0.0),
        (0.375, 1.0),
        (0.64, 1.0),
        (0.91, 0.0),
        (1.0, 0.0),
    ];
    const B: [(f32, f32); 5] = [(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

    let t = f32::from(value) / 255.0;
    Rgb([
        to_u8(piecewise(&R, t)),
        to_u8(piecewise(&G, t)),
        to_u8(piecewise(&B, t)),
    ])
}

fn piecewise(knots: &[(f32, f32)], t: f32) -> f32 {
    for pair in knots.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if t <= x1 {
            return y0 + (y1 - y0) * (t - x0) / (x1 - x0);
        }
    }
    knots.last().map_or(0.0, |&(_, y)| y)
}

#[inline]
fn to_u8(channel: f32) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}
