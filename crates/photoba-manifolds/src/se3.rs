//! SE(3) - Special Euclidean Group in 3D
//!
//! Rigid body transformations stored as an [`SO3`] rotation and a translation.
//! Tangents are `[ρ(3), θ(3)]`: translational part first, rotational second.

use crate::so3::{SO3, SO3Tangent};
use crate::{LieGroup, Tangent};
use nalgebra::{Isometry3, Matrix3, Matrix4, Translation3, UnitQuaternion, Vector3, Vector6};

/// SE(3) group element representing a rigid body transformation.
#[derive(Clone, Debug, PartialEq)]
pub struct SE3 {
    rotation: SO3,
    translation: Vector3<f64>,
}

/// SE(3) tangent element `[ρ, θ]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SE3Tangent {
    data: Vector6<f64>,
}

impl SE3 {
    pub fn new(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        SE3 {
            rotation: SO3::new(rotation),
            translation,
        }
    }

    pub fn from_translation_so3(translation: Vector3<f64>, rotation: SO3) -> Self {
        SE3 {
            rotation,
            translation,
        }
    }

    pub fn from_translation_euler(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(
            Vector3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    pub fn rotation_quaternion(&self) -> UnitQuaternion<f64> {
        self.rotation.quaternion()
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.rotation_matrix()
    }

    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.translation),
            self.rotation_quaternion(),
        )
    }

    /// 4x4 homogeneous matrix.
    pub fn matrix(&self) -> Matrix4<f64> {
        self.isometry().to_homogeneous()
    }
}

impl LieGroup for SE3 {
    type TangentVector = SE3Tangent;

    fn identity() -> Self {
        SE3 {
            rotation: SO3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// M⁻¹ = [ Rᵀ  -Rᵀt ]
    ///       [ 0    1   ]
    fn inverse(&self) -> Self {
        let rot_inv = self.rotation.inverse();
        let trans_inv = -rot_inv.act(&self.translation);
        SE3::from_translation_so3(trans_inv, rot_inv)
    }

    /// M_a M_b = [ R_a R_b   R_a t_b + t_a ]
    ///           [ 0         1             ]
    fn compose(&self, other: &Self) -> Self {
        let rotation = self.rotation.compose(&other.rotation);
        let translation = self.rotation.act(&other.translation) + self.translation;
        SE3::from_translation_so3(translation, rotation)
    }

    fn act(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.act(vector) + self.translation
    }
}

impl SE3Tangent {
    pub fn new(rho: Vector3<f64>, theta: Vector3<f64>) -> Self {
        let mut data = Vector6::zeros();
        data.fixed_rows_mut::<3>(0).copy_from(&rho);
        data.fixed_rows_mut::<3>(3).copy_from(&theta);
        SE3Tangent { data }
    }

    pub fn from_vector(data: Vector6<f64>) -> Self {
        SE3Tangent { data }
    }

    pub fn rho(&self) -> Vector3<f64> {
        self.data.fixed_rows::<3>(0).into_owned()
    }

    pub fn theta(&self) -> Vector3<f64> {
        self.data.fixed_rows::<3>(3).into_owned()
    }
}

impl Tangent<SE3> for SE3Tangent {
    /// M = exp(τ) = [ exp(θ)   J_l(θ) ρ ]
    ///              [ 0        1        ]
    fn exp(&self) -> SE3 {
        let theta_tangent = SO3Tangent::new(self.theta());
        let rotation = theta_tangent.exp();
        let translation = theta_tangent.left_jacobian() * self.rho();
        SE3::from_translation_so3(translation, rotation)
    }

    fn zero() -> Self {
        SE3Tangent {
            data: Vector6::zeros(),
        }
    }
}
