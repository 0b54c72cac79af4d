//! Pinhole Camera Model with a stereo baseline
//!
//! # Mathematical Model
//!
//! ## Projection (3D → 2D)
//!
//! ```text
//! u = fx · (x - b)/z + cx
//! v = fy · y/z + cy
//! ```
//!
//! ## Back-projection at a known depth d
//!
//! ```text
//! x = (u - cx) · d / fx
//! y = (v - cy) · d / fy
//! z = d
//! ```

use crate::{CameraModel, CameraModelError, MIN_DEPTH, PinholeParams};
use nalgebra::{Matrix2x3, Vector2, Vector3};

/// Pinhole camera with 4 intrinsics and the stereo rig baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    pub pinhole: PinholeParams,
    /// Horizontal distance between left and right optical centers, in the
    /// units of the scene. Zero for a monocular camera.
    pub baseline: f64,
}

impl PinholeCamera {
    /// Creates a monocular pinhole camera.
    ///
    /// # Example
    ///
    /// ```
    /// use photoba_camera_models::{PinholeCamera, PinholeParams};
    ///
    /// let camera = PinholeCamera::new(PinholeParams::new(500.0, 500.0, 320.0, 240.0)?)?;
    /// # Ok::<(), photoba_camera_models::CameraModelError>(())
    /// ```
    pub fn new(pinhole: PinholeParams) -> Result<Self, CameraModelError> {
        Self::new_stereo(pinhole, 0.0)
    }

    /// Creates a stereo pinhole camera with the given rig baseline.
    pub fn new_stereo(pinhole: PinholeParams, baseline: f64) -> Result<Self, CameraModelError> {
        let camera = Self { pinhole, baseline };
        camera.validate_params()?;
        Ok(camera)
    }
}

impl CameraModel for PinholeCamera {
    fn project(
        &self,
        p_cam: &Vector3<f64>,
        baseline: f64,
    ) -> Result<Vector2<f64>, CameraModelError> {
        if p_cam.z.abs() < MIN_DEPTH {
            return Err(CameraModelError::PointAtCameraCenter);
        }
        let inv_z = 1.0 / p_cam.z;
        Ok(Vector2::new(
            self.pinhole.fx * (p_cam.x - baseline) * inv_z + self.pinhole.cx,
            self.pinhole.fy * p_cam.y * inv_z + self.pinhole.cy,
        ))
    }

    /// ```text
    /// ∂u/∂x = fx / z     ∂u/∂y = 0         ∂u/∂z = -fx (x - b) / z²
    /// ∂v/∂x = 0          ∂v/∂y = fy / z    ∂v/∂z = -fy y / z²
    /// ```
    fn jacobian_point(&self, p_cam: &Vector3<f64>, baseline: f64) -> Matrix2x3<f64> {
        let fx = self.pinhole.fx;
        let fy = self.pinhole.fy;
        let z_inv = 1.0 / p_cam.z;
        let z_inv_sq = z_inv * z_inv;

        Matrix2x3::new(
            fx * z_inv,
            0.0,
            -fx * (p_cam.x - baseline) * z_inv_sq,
            0.0,
            fy * z_inv,
            -fy * p_cam.y * z_inv_sq,
        )
    }

    fn back_project(&self, pixel: &Vector2<f64>, depth: f64) -> Vector3<f64> {
        Vector3::new(
            (pixel.x - self.pinhole.cx) * depth / self.pinhole.fx,
            (pixel.y - self.pinhole.cy) * depth / self.pinhole.fy,
            depth,
        )
    }

    fn stereo_baseline(&self) -> f64 {
        self.baseline
    }

    fn validate_params(&self) -> Result<(), CameraModelError> {
        self.pinhole.validate()?;
        if !self.baseline.is_finite() {
            return Err(CameraModelError::InvalidParams(
                "Stereo baseline must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
