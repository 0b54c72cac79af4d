//! Inverse-depth scene point anchored in a reference image.

use nalgebra::Vector3;
use photoba_camera_models::CameraModel;

/// Scene point stored as its anchor pixel and the reciprocal of its depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseDepthPoint {
    /// Anchor-image column at full resolution
    pub u0: f64,
    /// Anchor-image row at full resolution
    pub v0: f64,
    /// Reciprocal of the depth along the anchor ray, nominally positive
    pub inverse_depth: f64,
}

impl InverseDepthPoint {
    pub fn new(u0: f64, v0: f64, inverse_depth: f64) -> Self {
        Self {
            u0,
            v0,
            inverse_depth,
        }
    }

    /// Builds the point observed at `(u0, v0)` with the given depth.
    pub fn from_depth(u0: f64, v0: f64, depth: f64) -> Self {
        Self::new(u0, v0, 1.0 / depth)
    }

    pub fn depth(&self) -> f64 {
        1.0 / self.inverse_depth
    }

    /// Anchor-frame position of the pixel `(u0, v0) + offset`, where `offset`
    /// is given in full-resolution pixels.
    pub fn anchor_point<CAM: CameraModel>(
        &self,
        camera: &CAM,
        offset_u: f64,
        offset_v: f64,
    ) -> Vector3<f64> {
        let pixel = nalgebra::Vector2::new(self.u0 + offset_u, self.v0 + offset_v);
        camera.back_project(&pixel, self.depth())
    }

    /// Optimizer update: only the inverse depth is estimated.
    pub fn apply_update(&mut self, delta: f64) {
        self.inverse_depth += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoba_camera_models::{PinholeCamera, PinholeParams};

    #[test]
    fn test_anchor_point_unprojects_center() -> Result<(), Box<dyn std::error::Error>> {
        let camera = PinholeCamera::new(PinholeParams::new(200.0, 100.0, 50.0, 40.0)?)?;
        let point = InverseDepthPoint::from_depth(70.0, 30.0, 4.0);

        let p = point.anchor_point(&camera, 0.0, 0.0);
        assert!((p - Vector3::new(20.0 * 4.0 / 200.0, -10.0 * 4.0 / 100.0, 4.0)).norm() < 1e-12);

        let shifted = point.anchor_point(&camera, 2.0, 0.0);
        assert!((shifted.x - p.x - 2.0 * 4.0 / 200.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_apply_update() {
        let mut point = InverseDepthPoint::new(1.0, 2.0, 0.5);
        point.apply_update(-0.25);
        assert_eq!(point.inverse_depth, 0.25);
        assert_eq!(point.depth(), 4.0);
        assert_eq!((point.u0, point.v0), (1.0, 2.0));
    }
}
