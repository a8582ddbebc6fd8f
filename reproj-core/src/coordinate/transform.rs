use crate::camera::CameraModel;
use crate::cloud::Point3D;

/// Transformation between pixel coordinate and camera coordinate
///
/// Caches `baseline * fu` and the focal length reciprocals so the per-pixel
/// evaluation is one division and a few multiply-adds.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateTransform {
    camera: CameraModel,
    bf: f32,
    inv_fu: f32,
    inv_fv: f32,
}

impl CoordinateTransform {
    pub fn new(camera: &CameraModel) -> Self {
        let (fu, fv) = camera.focal_length();
        Self {
            camera: *camera,
            bf: camera.baseline() * fu,
            inv_fu: 1.0 / fu,
            inv_fv: 1.0 / fv,
        }
    }

    /// Back-project pixel `(u, v)` with disparity `d` into the camera frame.
    ///
    /// `d` must be strictly positive; callers filter invalid disparities.
    #[inline]
    pub fn image_to_world(&self, u: f32, v: f32, d: f32) -> Point3D {
        debug_assert!(d > 0.0, "disparity must be positive, got {d}");

        let (u0, v0) = self.camera.principal_point();
        let (p0, p1) = self.camera.bias();

        let zc = self.bf / d;
        let xc = self.inv_fu * ((u - u0) * zc - p0);
        let yc = self.inv_fv * ((v - v0) * zc - p1);

        Point3D::new(xc, yc, zc)
    }

    /// Depth for a disparity, `baseline * fu / d`
    #[inline]
    pub fn depth(&self, d: f32) -> f32 {
        self.bf / d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraParameters;
    use approx::assert_relative_eq;

    fn camera(fu: f32, fv: f32, u0: f32, v0: f32, baseline: f32, p0: f32, p1: f32) -> CameraModel {
        CameraModel::new(CameraParameters {
            fu,
            fv,
            u0,
            v0,
            baseline,
            p0,
            p1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_principal_point_maps_to_optical_axis() {
        let tf = CoordinateTransform::new(&camera(500.0, 500.0, 320.0, 240.0, 0.1, 0.0, 0.0));
        let p = tf.image_to_world(320.0, 240.0, 25.0);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, 2.0, max_relative = 1e-6);
    }

    #[test]
    fn test_depth_is_baseline_times_focal_over_disparity() {
        let tf = CoordinateTransform::new(&camera(721.5377, 721.5377, 609.5593, 172.854, 0.54, 0.0, 0.0));
        for d in [0.0625_f32, 0.5, 1.0, 7.25, 64.0, 127.9375] {
            let p = tf.image_to_world(100.0, 50.0, d);
            assert_relative_eq!(p.z, 0.54 * 721.5377 / d, max_relative = 1e-6);
            assert!(p.z > 0.0);
            assert_eq!(p.z, tf.depth(d));
        }
    }

    #[test]
    fn test_reference_pixel() {
        let tf = CoordinateTransform::new(&camera(500.0, 500.0, 1.0, 1.0, 0.1, 0.0, 0.0));
        let p = tf.image_to_world(0.0, 0.0, 10.0);
        assert_relative_eq!(p.z, 5.0, max_relative = 1e-6);
        assert_relative_eq!(p.x, -0.01, max_relative = 1e-6);
        assert_relative_eq!(p.y, -0.01, max_relative = 1e-6);
    }

    #[test]
    fn test_bias_terms_shift_before_scaling() {
        let tf = CoordinateTransform::new(&camera(400.0, 200.0, 0.0, 0.0, 0.5, 40.0, -10.0));
        // Zc = 0.5 * 400 / 20 = 10
        let p = tf.image_to_world(8.0, 4.0, 20.0);
        assert_relative_eq!(p.z, 10.0, max_relative = 1e-6);
        assert_relative_eq!(p.x, (8.0 * 10.0 - 40.0) / 400.0, max_relative = 1e-6);
        assert_relative_eq!(p.y, (4.0 * 10.0 + 10.0) / 200.0, max_relative = 1e-6);
    }

    #[test]
    fn test_matches_closed_form_in_f32() {
        let cam = camera(721.5377, 718.856, 609.5593, 172.854, 0.54, 44.85728, 0.2163791);
        let tf = CoordinateTransform::new(&cam);
        let (u, v, d) = (731.0_f32, 201.0_f32, 33.1875_f32);

        let bf = 0.54_f32 * 721.5377_f32;
        let zc = bf / d;
        let xc = (1.0_f32 / 721.5377_f32) * ((u - 609.5593) * zc - 44.85728);
        let yc = (1.0_f32 / 718.856_f32) * ((v - 172.854) * zc - 0.2163791);

        let p = tf.image_to_world(u, v, d);
        assert_eq!(p.x, xc);
        assert_eq!(p.y, yc);
        assert_eq!(p.z, zc);
    }

    #[test]
    fn test_tilt_does_not_affect_transform() {
        let flat = camera(500.0, 500.0, 320.0, 240.0, 0.1, 0.0, 0.0);
        let tilted = CameraModel::new(CameraParameters {
            tilt: 0.1,
            height: 1.65,
            ..*flat.parameters()
        })
        .unwrap();

        let a = CoordinateTransform::new(&flat).image_to_world(10.0, 20.0, 3.0);
        let b = CoordinateTransform::new(&tilted).image_to_world(10.0, 20.0, 3.0);
        assert_eq!(a, b);
    }
}
