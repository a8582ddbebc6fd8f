//! Debug renderings of disparity maps and point clouds

use std::path::Path;

use image::{Rgb as Pixel, RgbImage};
use reproj_core::color::jet;
use reproj_core::{DepthColorMapper, DisparityMap, PointCloud, Rgb};

use crate::error::Result;

/// Side length of the top-down view, in pixels
pub const TOP_DOWN_SIZE: u32 = 1024;

/// Colorize a disparity map with JET, scaled so `disp_size` saturates.
///
/// Negative (invalid) disparities are drawn black.
pub fn render_disparity(disparity: &DisparityMap, disp_size: usize) -> RgbImage {
    let scale = 255.0 / disp_size.max(1) as f32;
    let view = disparity.view();

    RgbImage::from_fn(disparity.width() as u32, disparity.height() as u32, |x, y| {
        let d = view[[y as usize, x as usize]];
        if d < 0.0 || d.is_nan() {
            return pixel(Rgb::BLACK);
        }
        let level = (d * scale).round().clamp(0.0, 255.0) as u8;
        pixel(jet(level))
    })
}

/// Bird's-eye view of the cloud: X to the right, Z up, camera at the bottom
/// center. Each point is a small ring colored by depth.
pub fn render_top_down(cloud: &PointCloud, mapper: &DepthColorMapper) -> RgbImage {
    let size = TOP_DOWN_SIZE as i64;
    let extent = TOP_DOWN_SIZE as f32;
    let pixels_per_meter = extent / mapper.max_depth();
    let mut draw = RgbImage::new(TOP_DOWN_SIZE, TOP_DOWN_SIZE);
    // ring pixels reach one past the center in each direction
    let reach = -1.0..=extent;

    for p in cloud {
        let u = (pixels_per_meter * p.x).round() + extent / 2.0;
        let v = extent - (pixels_per_meter * p.z).round();
        if !reach.contains(&u) || !reach.contains(&v) {
            continue;
        }
        let (u, v) = (u as i64, v as i64);
        let color = pixel(mapper.color_for_depth(p.z));

        for (du, dv) in RING {
            let (x, y) = (u + du, v + dv);
            if (0..size).contains(&x) && (0..size).contains(&y) {
                draw.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    draw
}

pub fn save_png<P: AsRef<Path>>(path: P, img: &RgbImage) -> Result<()> {
    img.save(path.as_ref())?;
    Ok(())
}

/// Radius-1 circle outline
const RING: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

fn pixel(color: Rgb) -> Pixel<u8> {
    Pixel(color.0)
}
