//! SO(3) - Special Orthogonal Group in 3D
//!
//! Rotations are stored as unit quaternions; tangents are axis-angle vectors.

use crate::{LieGroup, Tangent, skew_symmetric};
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

/// SO(3) group element backed by a unit quaternion.
#[derive(Clone, Debug, PartialEq)]
pub struct SO3 {
    quaternion: UnitQuaternion<f64>,
}

/// SO(3) tangent element `θ = angle * axis`.
#[derive(Clone, Debug, PartialEq)]
pub struct SO3Tangent {
    data: Vector3<f64>,
}

impl SO3 {
    pub fn new(quaternion: UnitQuaternion<f64>) -> Self {
        SO3 { quaternion }
    }

    pub fn from_euler_angles(roll: f64, pitch: f64, yaw: f64) -> Self {
        SO3::new(UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        SO3::new(UnitQuaternion::from_scaled_axis(axis.normalize() * angle))
    }

    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.quaternion
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.quaternion.to_rotation_matrix().into_inner()
    }
}

impl LieGroup for SO3 {
    type TangentVector = SO3Tangent;

    fn identity() -> Self {
        SO3::new(UnitQuaternion::identity())
    }

    fn inverse(&self) -> Self {
        SO3::new(self.quaternion.inverse())
    }

    fn compose(&self, other: &Self) -> Self {
        SO3::new(self.quaternion * other.quaternion)
    }

    fn act(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion * vector
    }
}

impl SO3Tangent {
    pub fn new(axis_angle: Vector3<f64>) -> Self {
        SO3Tangent { data: axis_angle }
    }

    /// Hat map `[θ]×`.
    pub fn hat(&self) -> Matrix3<f64> {
        skew_symmetric(&self.data)
    }

    /// Left Jacobian of the exponential map.
    ///
    /// ```text
    /// J_l(θ) = I + (1 - cos θ)/θ² [θ]ₓ + (θ - sin θ)/θ³ [θ]ₓ²
    /// ```
    pub fn left_jacobian(&self) -> Matrix3<f64> {
        let theta_squared = self.data.norm_squared();
        let tangent_skew = self.hat();

        if theta_squared <= f64::EPSILON {
            Matrix3::identity() + 0.5 * tangent_skew
        } else {
            let theta = theta_squared.sqrt();
            Matrix3::identity()
                + (1.0 - theta.cos()) / theta_squared * tangent_skew
                + (theta - theta.sin()) / (theta_squared * theta) * tangent_skew * tangent_skew
        }
    }
}

impl Tangent<SO3> for SO3Tangent {
    /// # Notes
    /// q = Exp(θu) = cos(θ/2) + u sin(θ/2)
    fn exp(&self) -> SO3 {
        let theta_squared = self.data.norm_squared();

        let quaternion = if theta_squared > f64::EPSILON {
            UnitQuaternion::from_scaled_axis(self.data)
        } else {
            // First-order expansion near the identity
            UnitQuaternion::from_quaternion(Quaternion::new(
                1.0,
                self.data.x / 2.0,
                self.data.y / 2.0,
                self.data.z / 2.0,
            ))
        };

        SO3 { quaternion }
    }

    fn zero() -> Self {
        SO3Tangent::new(Vector3::zeros())
    }
}
