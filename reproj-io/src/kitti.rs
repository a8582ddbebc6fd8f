//! Conversion of KITTI object/tracking calibration files
//!
//! KITTI stores one 3x4 projection matrix per camera (`P0:` .. `P3:`). The
//! left color camera `P2` carries the intrinsics and, in its last column, the
//! `fx * tx` offset used as the pixel bias terms.

use std::fs;
use std::path::Path;

use nalgebra::Matrix3x4;
use reproj_core::CameraParameters;
use tracing::{info, warn};

use crate::calibration::write_calibration;
use crate::error::{IoError, Result};

/// Camera whose projection matrix is converted
pub const PROJECTION_KEY: &str = "P2:";

/// Rig constants that KITTI calibration files do not carry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KittiRig {
    pub baseline: f32,
    pub height: f32,
    pub tilt: f32,
}

impl Default for KittiRig {
    fn default() -> Self {
        Self {
            baseline: 0.54,
            height: 1.65,
            tilt: 0.0,
        }
    }
}

/// Find the `P2:` projection matrix in a KITTI calibration file body
pub fn parse_projection(text: &str) -> Result<Matrix3x4<f64>> {
    let line = text
        .lines()
        .find(|l| l.split_whitespace().next() == Some(PROJECTION_KEY))
        .ok_or_else(|| IoError::KittiParse(format!("no {PROJECTION_KEY} line")))?;

    let values = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| IoError::KittiParse(format!("{PROJECTION_KEY} {e}")))?;
    if values.len() != 12 {
        return Err(IoError::KittiParse(format!(
            "{PROJECTION_KEY} expected 12 values, found {}",
            values.len()
        )));
    }

    Ok(Matrix3x4::from_row_slice(&values))
}

pub fn read_projection<P: AsRef<Path>>(path: P) -> Result<Matrix3x4<f64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
    parse_projection(&text)
}

/// Map a projection matrix onto calibration values
pub fn to_parameters(projection: &Matrix3x4<f64>, rig: &KittiRig) -> CameraParameters {
    CameraParameters {
        fu: projection[(0, 0)] as f32,
        fv: projection[(1, 1)] as f32,
        u0: projection[(0, 2)] as f32,
        v0: projection[(1, 2)] as f32,
        baseline: rig.baseline,
        height: rig.height,
        tilt: rig.tilt,
        p0: projection[(0, 3)] as f32,
        p1: projection[(1, 3)] as f32,
    }
}

/// Convert every KITTI calibration file in `source` into `<stem>.xml` in `result`.
///
/// Files without a usable `P2:` line are skipped with a warning. Returns the
/// number of files written.
pub fn convert_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    result: Q,
    rig: &KittiRig,
) -> Result<usize> {
    let (source, result) = (source.as_ref(), result.as_ref());
    for dir in [source, result] {
        if !dir.is_dir() {
            return Err(IoError::file(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
    }

    let mut entries = fs::read_dir(source)
        .map_err(|e| IoError::file(source, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| IoError::file(source, e))?;
    entries.sort();

    let mut converted = 0;
    for path in entries.iter().filter(|p| p.is_file()) {
        let projection = match read_projection(path) {
            Ok(p) => p,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping calibration file");
                continue;
            }
        };
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let out = result.join(format!("{}.xml", stem.to_string_lossy()));
        write_calibration(&out, &to_parameters(&projection, rig))?;
        converted += 1;
    }

    info!(converted, source = %source.display(), "converted KITTI calibration files");
    Ok(converted)
}
