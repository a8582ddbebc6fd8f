use crate::error::CalibrationError;

/// Raw calibration values as read from a per-frame calibration record.
///
/// Nothing is validated here; use [`CameraModel::new`] to obtain a model
/// that the coordinate transform can rely on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraParameters {
    /// focal length x (pixel)
    pub fu: f32,
    /// focal length y (pixel)
    pub fv: f32,
    /// principal point x (pixel)
    pub u0: f32,
    /// principal point y (pixel)
    pub v0: f32,
    /// baseline (meter)
    pub baseline: f32,
    /// mounting height (meter)
    pub height: f32,
    /// mounting tilt angle (radian)
    pub tilt: f32,
    pub p0: f32,
    pub p1: f32,
}

/// Validated rectified stereo camera model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    params: CameraParameters,
}

impl CameraModel {
    /// Validate calibration values.
    ///
    /// Focal lengths and baseline must be strictly positive and finite, since
    /// the transform divides by both focal lengths and scales depth by the
    /// baseline.
    pub fn new(params: CameraParameters) -> Result<Self, CalibrationError> {
        check_positive("FocalLengthX", params.fu)?;
        check_positive("FocalLengthY", params.fv)?;
        check_positive("BaseLine", params.baseline)?;

        Ok(Self { params })
    }

    /// Get focal lengths
    pub fn focal_length(&self) -> (f32, f32) {
        (self.params.fu, self.params.fv)
    }

    /// Get principal point
    pub fn principal_point(&self) -> (f32, f32) {
        (self.params.u0, self.params.v0)
    }

    pub fn baseline(&self) -> f32 {
        self.params.baseline
    }

    pub fn height(&self) -> f32 {
        self.params.height
    }

    pub fn tilt(&self) -> f32 {
        self.params.tilt
    }

    /// Pixel bias terms (p0, p1) subtracted before back-projection
    pub fn bias(&self) -> (f32, f32) {
        (self.params.p0, self.params.p1)
    }

    pub fn parameters(&self) -> &CameraParameters {
        &self.params
    }
}

impl TryFrom<CameraParameters> for CameraModel {
    type Error = CalibrationError;

    fn try_from(params: CameraParameters) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), CalibrationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalibrationError::InvalidCalibration { field, value })
    }
}
