//! Camera pose with per-side affine brightness parameters.

use nalgebra::{SVector, Vector3, Vector6};
use photoba_manifolds::{LieGroup, SE3, SE3Tangent};

/// Tangent dimension of a photometric pose: 6 rigid + 4 brightness.
pub const POSE_DOF: usize = 10;

/// Column of `a_left` in a pose Jacobian block.
pub const A_LEFT: usize = 6;
/// Column of `b_left` in a pose Jacobian block.
pub const B_LEFT: usize = 7;
/// Column of `a_right` in a pose Jacobian block.
pub const A_RIGHT: usize = 8;
/// Column of `b_right` in a pose Jacobian block.
pub const B_RIGHT: usize = 9;

/// Update vector of a photometric pose, laid out as
/// `[ρ (3), θ (3), a_left, b_left, a_right, b_right]`.
pub type PoseUpdate = SVector<f64, POSE_DOF>;

/// Affine exposure model `I' = exp(a) · I + b` of each rig side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhotometricBias {
    pub a_left: f64,
    pub b_left: f64,
    pub a_right: f64,
    pub b_right: f64,
}

impl PhotometricBias {
    pub fn new(a_left: f64, b_left: f64, a_right: f64, b_right: f64) -> Self {
        Self {
            a_left,
            b_left,
            a_right,
            b_right,
        }
    }

    /// Gain exponent and offset of one side.
    pub fn side(&self, right: bool) -> (f64, f64) {
        if right {
            (self.a_right, self.b_right)
        } else {
            (self.a_left, self.b_left)
        }
    }
}

/// World-to-camera transform plus brightness parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotometricPose {
    /// Maps world points into this camera's frame
    pub pose: SE3,
    pub bias: PhotometricBias,
}

impl PhotometricPose {
    pub fn new(pose: SE3, bias: PhotometricBias) -> Self {
        Self { pose, bias }
    }

    /// Pose with no brightness correction.
    pub fn from_pose(pose: SE3) -> Self {
        Self::new(pose, PhotometricBias::default())
    }

    pub fn identity() -> Self {
        Self::from_pose(SE3::identity())
    }

    /// Applies `exp(δ) ∘ T` to the rigid part and adds the brightness deltas.
    pub fn apply_update(&mut self, update: &PoseUpdate) {
        let tangent = SE3Tangent::from_vector(Vector6::from_fn(|i, _| update[i]));
        self.pose = self.pose.left_plus(&tangent);
        self.bias.a_left += update[A_LEFT];
        self.bias.b_left += update[B_LEFT];
        self.bias.a_right += update[A_RIGHT];
        self.bias.b_right += update[B_RIGHT];
    }

    /// Maps a world point into this camera's frame.
    pub fn transform(&self, p_world: &Vector3<f64>) -> Vector3<f64> {
        self.pose.act(p_world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoba_manifolds::{SO3, Tangent};

    #[test]
    fn test_bias_side_selection() {
        let bias = PhotometricBias::new(0.1, 2.0, -0.2, 3.0);
        assert_eq!(bias.side(false), (0.1, 2.0));
        assert_eq!(bias.side(true), (-0.2, 3.0));
    }

    #[test]
    fn test_apply_update_translation_and_bias() {
        let mut pose = PhotometricPose::identity();
        let mut update = PoseUpdate::zeros();
        update[0] = 0.5;
        update[2] = -1.0;
        update[A_LEFT] = 0.1;
        update[B_RIGHT] = 4.0;

        pose.apply_update(&update);
        assert!((pose.pose.translation() - Vector3::new(0.5, 0.0, -1.0)).norm() < 1e-12);
        assert_eq!(pose.bias, PhotometricBias::new(0.1, 0.0, 0.0, 4.0));
    }

    #[test]
    fn test_apply_update_is_left_multiplicative() {
        let rotation = SO3::from_euler_angles(0.2, -0.1, 0.4);
        let base = SE3::from_translation_so3(Vector3::new(1.0, 2.0, 3.0), rotation);
        let mut pose = PhotometricPose::from_pose(base.clone());

        let mut update = PoseUpdate::zeros();
        update[4] = 0.3;
        pose.apply_update(&update);

        let expected = SE3Tangent::new(Vector3::zeros(), Vector3::new(0.0, 0.3, 0.0))
            .exp()
            .compose(&base);
        assert!((pose.pose.matrix() - expected.matrix()).norm() < 1e-12);
    }
}
