//! Point cloud reprojection from disparity maps

use nalgebra::Point3;

use crate::camera::CameraModel;
use crate::coordinate::CoordinateTransform;
use crate::disparity::{is_valid, DisparityMap};

/// Camera-frame point in meters
pub type Point3D = Point3<f32>;

/// Points in raster order of the disparity pixels they came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point3D>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3D> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn push(&mut self, point: Point3D) {
        self.points.push(point);
    }

    pub fn into_vec(self) -> Vec<Point3D> {
        self.points
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3D;
    type IntoIter = std::slice::Iter<'a, Point3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl From<Vec<Point3D>> for PointCloud {
    fn from(points: Vec<Point3D>) -> Self {
        Self { points }
    }
}

/// Reprojects every valid disparity pixel into the camera frame
pub struct PointCloudBuilder;

impl PointCloudBuilder {
    /// Build a fresh point cloud, pre-sized to `width * height`
    pub fn build(disparity: &DisparityMap, camera: &CameraModel) -> PointCloud {
        let mut cloud = PointCloud::with_capacity(disparity.width() * disparity.height());
        Self::build_into(&mut cloud, disparity, camera);
        cloud
    }

    /// Rebuild `cloud` in place, keeping its allocation
    pub fn build_into(cloud: &mut PointCloud, disparity: &DisparityMap, camera: &CameraModel) {
        let tf = CoordinateTransform::new(camera);

        cloud.clear();
        cloud
            .points
            .reserve(disparity.width() * disparity.height());

        for (y, row) in disparity.view().outer_iter().enumerate() {
            for (x, &d) in row.iter().enumerate() {
                if is_valid(d) {
                    cloud.push(tf.image_to_world(x as f32, y as f32, d));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraParameters;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn symmetric_camera() -> CameraModel {
        CameraModel::new(CameraParameters {
            fu: 500.0,
            fv: 500.0,
            u0: 1.0,
            v0: 1.0,
            baseline: 0.1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_two_by_two_scenario() {
        let disparity = DisparityMap::new(array![[10.0, -1.0], [5.0, 0.0]]);
        let cloud = PointCloudBuilder::build(&disparity, &symmetric_camera());

        // (0,1) has d=5 and survives as well
        assert_eq!(cloud.len(), 2);

        let p = cloud.points()[0];
        assert_relative_eq!(p.z, 5.0, max_relative = 1e-6);
        assert_relative_eq!(p.x, -0.01, max_relative = 1e-6);
        assert_relative_eq!(p.y, -0.01, max_relative = 1e-6);

        let q = cloud.points()[1];
        assert_relative_eq!(q.z, 10.0, max_relative = 1e-6);
        assert_relative_eq!(q.x, -0.02, max_relative = 1e-6);
        assert_eq!(q.y, 0.0);
    }

    #[test]
    fn test_single_valid_pixel() {
        let disparity = DisparityMap::new(array![[10.0, -1.0], [0.0, 0.0]]);
        let cloud = PointCloudBuilder::build(&disparity, &symmetric_camera());
        assert_eq!(cloud.len(), 1);
        assert_relative_eq!(cloud.points()[0].z, 5.0, max_relative = 1e-6);
    }

    #[test]
    fn test_non_positive_disparities_are_skipped() {
        let disparity = DisparityMap::new(array![
            [0.0, -0.0, -1.0, -0.0625],
            [f32::NAN, -128.0, f32::NEG_INFINITY, 0.0]
        ]);
        let cloud = PointCloudBuilder::build(&disparity, &symmetric_camera());
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_constant_disparity_fills_cloud() {
        let (width, height) = (7, 5);
        let d = 4.0_f32;
        let disparity = DisparityMap::new(Array2::from_elem((height, width), d));
        let cloud = PointCloudBuilder::build(&disparity, &symmetric_camera());

        assert_eq!(cloud.len(), width * height);
        let expected = 0.1_f32 * 500.0 / d;
        for p in &cloud {
            assert_relative_eq!(p.z, expected, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_output_follows_raster_order() {
        let disparity = DisparityMap::new(array![
            [1.0, 0.0, 2.0],
            [0.0, 3.0, -1.0],
            [4.0, 0.0, 5.0]
        ]);
        let camera = symmetric_camera();
        let tf = CoordinateTransform::new(&camera);
        let cloud = PointCloudBuilder::build(&disparity, &camera);

        let expected: Vec<Point3D> = [(0, 0, 1.0), (2, 0, 2.0), (1, 1, 3.0), (0, 2, 4.0), (2, 2, 5.0)]
            .iter()
            .map(|&(x, y, d)| tf.image_to_world(x as f32, y as f32, d))
            .collect();

        assert_eq!(cloud.points(), expected.as_slice());
    }

    #[test]
    fn test_build_into_reuses_buffer() {
        let camera = symmetric_camera();
        let mut cloud = PointCloudBuilder::build(
            &DisparityMap::new(Array2::from_elem((4, 4), 2.0)),
            &camera,
        );
        assert_eq!(cloud.len(), 16);

        PointCloudBuilder::build_into(&mut cloud, &DisparityMap::new(array![[0.0, 8.0]]), &camera);
        assert_eq!(cloud.len(), 1);
        assert_relative_eq!(cloud.points()[0].z, 6.25, max_relative = 1e-6);
    }

    #[test]
    fn test_length_matches_valid_count() {
        let values: Vec<f32> = (0..64).map(|i| (i % 5) as f32 - 2.0).collect();
        let disparity = DisparityMap::from_vec(8, 8, values).unwrap();
        let cloud = PointCloudBuilder::build(&disparity, &symmetric_camera());
        assert_eq!(cloud.len(), disparity.valid_count());
    }
}
