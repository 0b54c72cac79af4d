//! Camera projection models for photometric residuals.
//!
//! # Key Components
//!
//! - **`CameraModel` trait**: projection with an optional stereo offset, its point
//!   Jacobian, and depth-based back-projection
//! - **`PinholeParams`**: the linear intrinsics `fx, fy, cx, cy`
//! - **`PinholeCamera`**: pinhole model carrying the stereo rig baseline
//!
//! # Stereo offset
//!
//! Stereo rigs are modelled as a single calibrated camera whose right image is
//! shifted along the x axis by `baseline`. Projecting into the right image is
//! projecting the point translated by `-baseline` along x:
//!
//! ```text
//! u = fx · (x - b)/z + cx
//! v = fy · y/z + cy
//! ```
//!
//! A zero `b` yields the plain monocular projection.

use nalgebra::{Matrix2x3, Vector2, Vector3};

pub mod pinhole;

pub use pinhole::PinholeCamera;

/// Minimum absolute depth for a projection to be defined (meters).
pub const MIN_DEPTH: f64 = 1e-6;

/// Epsilon for numerical differentiation in Jacobian tests.
pub const NUMERICAL_DERIVATIVE_EPS: f64 = 1e-7;

/// Tolerance for numerical Jacobian validation in tests.
pub const JACOBIAN_TEST_TOLERANCE: f64 = 1e-5;

/// Camera model errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraModelError {
    #[error("z is close to zero, point is at camera center")]
    PointAtCameraCenter,
    #[error("Focal length must be positive")]
    FocalLengthMustBePositive,
    #[error("Principal point must be finite")]
    PrincipalPointMustBeFinite,
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
}

/// Linear intrinsic parameters of the pinhole model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeParams {
    /// Focal length in x direction (pixels)
    pub fx: f64,
    /// Focal length in y direction (pixels)
    pub fy: f64,
    /// Principal point x-coordinate (pixels)
    pub cx: f64,
    /// Principal point y-coordinate (pixels)
    pub cy: f64,
}

impl PinholeParams {
    /// Create new pinhole parameters with validation.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self, CameraModelError> {
        let params = Self { fx, fy, cx, cy };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), CameraModelError> {
        if !(self.fx > 0.0 && self.fy > 0.0) || !self.fx.is_finite() || !self.fy.is_finite() {
            return Err(CameraModelError::FocalLengthMustBePositive);
        }
        if !self.cx.is_finite() || !self.cy.is_finite() {
            return Err(CameraModelError::PrincipalPointMustBeFinite);
        }
        Ok(())
    }
}

/// Trait for camera models usable by the patch residual.
pub trait CameraModel: Send + Sync + Clone + std::fmt::Debug + 'static {
    /// Projects a camera-frame point to full-resolution pixel coordinates,
    /// shifting the optical center by `baseline` along x.
    ///
    /// Points behind the camera still project; only a depth within
    /// [`MIN_DEPTH`] of zero is rejected.
    fn project(
        &self,
        p_cam: &Vector3<f64>,
        baseline: f64,
    ) -> Result<Vector2<f64>, CameraModelError>;

    /// Jacobian of [`CameraModel::project`] w.r.t. the camera-frame point (2×3).
    fn jacobian_point(&self, p_cam: &Vector3<f64>, baseline: f64) -> Matrix2x3<f64>;

    /// Back-projects a full-resolution pixel to the camera-frame point at `depth`.
    fn back_project(&self, pixel: &Vector2<f64>, depth: f64) -> Vector3<f64>;

    /// Rig baseline used for cross-side stereo comparisons.
    fn stereo_baseline(&self) -> f64;

    /// Validates camera parameters.
    fn validate_params(&self) -> Result<(), CameraModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinhole_params_validation() {
        assert!(PinholeParams::new(500.0, 500.0, 320.0, 240.0).is_ok());
        assert_eq!(
            PinholeParams::new(0.0, 500.0, 320.0, 240.0),
            Err(CameraModelError::FocalLengthMustBePositive)
        );
        assert_eq!(
            PinholeParams::new(500.0, -1.0, 320.0, 240.0),
            Err(CameraModelError::FocalLengthMustBePositive)
        );
        assert_eq!(
            PinholeParams::new(500.0, 500.0, f64::NAN, 240.0),
            Err(CameraModelError::PrincipalPointMustBeFinite)
        );
    }
}
