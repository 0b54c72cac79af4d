//! Shared utilities for patch edge integration tests
//!
//! Two synthetic pyramids are provided:
//!
//! - Linear ramps `I = 40 + u/2 + v/4`. Values and gradients are exact in f32
//!   and bilinear sampling reproduces them, so analytic Jacobians match central
//!   differences at tight tolerances. The gradient is the same everywhere.
//! - A smooth texture whose gradient varies across the image, stored with its
//!   analytic gradients. Bilinear sampling of the intensity only approximates
//!   those gradients, so comparisons use [`TEXTURED_FD_TOLERANCE`].

#![allow(dead_code)]

use nalgebra::DMatrix;
use photoba::camera_models::{CameraModelError, PinholeCamera, PinholeParams};
use photoba::manifolds::SE3;
use photoba::{
    EdgeState, ImagePyramid, InverseDepthPoint, PatchEdge, PatchJacobians, PhotobaResult,
    PhotometricBias, PhotometricPose, PoseUpdate, PyramidLevel,
};
use rand::Rng;
use rand::rngs::StdRng;
use std::sync::Arc;

pub const STEREO_BASELINE: f64 = 0.1;

/// Step of the central differences.
pub const FD_EPS: f64 = 1e-6;

/// Relative tolerance between analytic and numerical derivatives.
pub const FD_TOLERANCE: f64 = 1e-4;

/// Relative tolerance on the textured pyramid.
pub const TEXTURED_FD_TOLERANCE: f64 = 5e-2;

/// Level extents (rows, cols) and scales shared by the synthetic pyramids.
const LEVELS: [(usize, usize, f64); 3] = [(480, 640, 1.0), (240, 320, 2.0), (120, 160, 4.0)];

/// Three-level pyramid of a 640×480 linear ramp.
pub fn linear_pyramid() -> PhotobaResult<Arc<ImagePyramid>> {
    let levels = LEVELS
        .into_iter()
        .map(|(rows, cols, scale)| {
            let image =
                DMatrix::from_fn(rows, cols, |r, c| 40.0 + 0.5 * c as f32 + 0.25 * r as f32);
            PyramidLevel::from_intensity(image, scale)
        })
        .collect::<PhotobaResult<Vec<_>>>()?;
    Ok(Arc::new(ImagePyramid::new(levels)?))
}

/// Three-level pyramid of `I = 128 + 20 sin(0.003u) + 15 cos(0.0025v) + 1e-4 uv`
/// in level pixels, with the exact derivatives as gradient grids.
pub fn textured_pyramid() -> PhotobaResult<Arc<ImagePyramid>> {
    let levels = LEVELS
        .into_iter()
        .map(|(rows, cols, scale)| {
            let intensity = DMatrix::from_fn(rows, cols, |r, c| {
                let (u, v) = (c as f64, r as f64);
                (128.0 + 20.0 * (0.003 * u).sin() + 15.0 * (0.0025 * v).cos() + 1e-4 * u * v)
                    as f32
            });
            let gradient_x = DMatrix::from_fn(rows, cols, |r, c| {
                let (u, v) = (c as f64, r as f64);
                (0.06 * (0.003 * u).cos() + 1e-4 * v) as f32
            });
            let gradient_y = DMatrix::from_fn(rows, cols, |r, c| {
                let (u, v) = (c as f64, r as f64);
                (-0.0375 * (0.0025 * v).sin() + 1e-4 * u) as f32
            });
            PyramidLevel::new(intensity, gradient_x, gradient_y, scale)
        })
        .collect::<PhotobaResult<Vec<_>>>()?;
    Ok(Arc::new(ImagePyramid::new(levels)?))
}

pub fn pinhole() -> Result<PinholeParams, CameraModelError> {
    PinholeParams::new(300.0, 310.0, 320.0, 240.0)
}

pub fn stereo_camera() -> Result<PinholeCamera, CameraModelError> {
    PinholeCamera::new_stereo(pinhole()?, STEREO_BASELINE)
}

pub fn mono_camera() -> Result<PinholeCamera, CameraModelError> {
    PinholeCamera::new(pinhole()?)
}

/// Small random motion with random brightness parameters.
pub fn random_photometric_pose(rng: &mut StdRng) -> PhotometricPose {
    let pose = SE3::from_translation_euler(
        rng.random_range(-0.15..0.15),
        rng.random_range(-0.15..0.15),
        rng.random_range(-0.15..0.15),
        rng.random_range(-0.04..0.04),
        rng.random_range(-0.04..0.04),
        rng.random_range(-0.04..0.04),
    );
    let bias = PhotometricBias::new(
        rng.random_range(-0.3..0.3),
        rng.random_range(-5.0..5.0),
        rng.random_range(-0.3..0.3),
        rng.random_range(-5.0..5.0),
    );
    PhotometricPose::new(pose, bias)
}

/// Point near the image center, 2 to 5 units deep.
pub fn random_point(rng: &mut StdRng) -> InverseDepthPoint {
    InverseDepthPoint::from_depth(
        rng.random_range(260.0..380.0),
        rng.random_range(190.0..290.0),
        rng.random_range(2.0..5.0),
    )
}

/// Central-difference Jacobians of the patch residual.
///
/// For a self-edge the observation and anchor are the same pose; only the
/// anchor block is filled and the observation block is left at zero.
pub fn numerical_jacobians(
    edge: &PatchEdge<PinholeCamera>,
    point: &InverseDepthPoint,
    observation: &PhotometricPose,
    anchor: &PhotometricPose,
) -> PatchJacobians {
    let self_edge = edge.kind().is_self_edge();
    let mut numerical = PatchJacobians::zeros();

    let mut point_plus = *point;
    let mut point_minus = *point;
    point_plus.apply_update(FD_EPS);
    point_minus.apply_update(-FD_EPS);
    let r_plus = edge.residual(&EdgeState {
        point: &point_plus,
        observation,
        anchor,
    });
    let r_minus = edge.residual(&EdgeState {
        point: &point_minus,
        observation,
        anchor,
    });
    numerical
        .point
        .set_column(0, &((r_plus - r_minus) / (2.0 * FD_EPS)));

    for k in 0..10 {
        let mut delta = PoseUpdate::zeros();
        delta[k] = FD_EPS;

        let perturbed = |pose: &PhotometricPose, sign: f64| {
            let mut pose = pose.clone();
            pose.apply_update(&(delta * sign));
            pose
        };

        let anchor_plus = perturbed(anchor, 1.0);
        let anchor_minus = perturbed(anchor, -1.0);
        let (obs_for_plus, obs_for_minus) = if self_edge {
            (&anchor_plus, &anchor_minus)
        } else {
            (observation, observation)
        };
        let r_plus = edge.residual(&EdgeState {
            point,
            observation: obs_for_plus,
            anchor: &anchor_plus,
        });
        let r_minus = edge.residual(&EdgeState {
            point,
            observation: obs_for_minus,
            anchor: &anchor_minus,
        });
        numerical
            .anchor
            .set_column(k, &((r_plus - r_minus) / (2.0 * FD_EPS)));

        if !self_edge {
            let obs_plus = perturbed(observation, 1.0);
            let obs_minus = perturbed(observation, -1.0);
            let r_plus = edge.residual(&EdgeState {
                point,
                observation: &obs_plus,
                anchor,
            });
            let r_minus = edge.residual(&EdgeState {
                point,
                observation: &obs_minus,
                anchor,
            });
            numerical
                .observation
                .set_column(k, &((r_plus - r_minus) / (2.0 * FD_EPS)));
        }
    }

    numerical
}

/// Asserts `|a - n| <= tolerance * max(|n|, 1)` for every entry.
pub fn assert_jacobian_within<R, C, S1, S2>(
    analytic: &nalgebra::Matrix<f64, R, C, S1>,
    numerical: &nalgebra::Matrix<f64, R, C, S2>,
    tolerance: f64,
    label: &str,
) where
    R: nalgebra::Dim,
    C: nalgebra::Dim,
    S1: nalgebra::RawStorage<f64, R, C>,
    S2: nalgebra::RawStorage<f64, R, C>,
{
    for r in 0..analytic.nrows() {
        for c in 0..analytic.ncols() {
            let a = analytic[(r, c)];
            let n = numerical[(r, c)];
            assert!(
                (a - n).abs() <= tolerance * n.abs().max(1.0),
                "{label} mismatch at ({r}, {c}): analytic {a}, numerical {n}"
            );
        }
    }
}
