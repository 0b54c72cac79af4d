//! Lie groups for rigid camera motion.
//!
//! Lie group M,° | size | dim | X ∈ M          | Constraint | T_X M       | Exp(T)        | Comp. | Action
//! ------------- | ---- | --- | -------------- | ---------- | ----------- | ------------- | ----- | ------
//! Rotation      | 9    | 3   | R              | RᵀR = I    | [θ] ∈ R³    | R = exp([θ]x) | R₁R₂  | Rx
//! Rigid motion  | 16   | 6   | M = [R t; 0 1] | RᵀR = I    | [ρ, θ] ∈ R⁶ | Exp([ρ, θ])   | M₁M₂  | Rx+t
//!
//! The conventions follow the [manif](https://github.com/artivis/manif) library:
//! SE(3) tangents are stored translation first (`[ρ, θ]`), and the optimizer
//! update used by the photometric poses is the *left* plus `exp(τ) ∘ X`.

use nalgebra::{Matrix3, Vector3};
use std::fmt::Debug;

pub mod se3;
pub mod so3;

pub use se3::{SE3, SE3Tangent};
pub use so3::{SO3, SO3Tangent};

/// Core group operations shared by [`SO3`] and [`SE3`].
///
/// Only the operations needed to evaluate and update photometric poses are
/// provided; Jacobians of the group operations are derived in closed form by
/// the factors that use them.
pub trait LieGroup: Clone + Debug + PartialEq {
    /// The tangent space vector type
    type TangentVector: Tangent<Self>;

    /// Identity element.
    fn identity() -> Self;

    /// Group inverse.
    fn inverse(&self) -> Self;

    /// Composition `self ∘ other`.
    fn compose(&self, other: &Self) -> Self;

    /// Action on a 3D point.
    fn act(&self, vector: &Vector3<f64>) -> Vector3<f64>;

    /// Left plus: `exp(τ) ∘ self`.
    fn left_plus(&self, tangent: &Self::TangentVector) -> Self {
        tangent.exp().compose(self)
    }
}

/// Tangent space (Lie algebra in vector form) of a [`LieGroup`].
pub trait Tangent<Group: LieGroup>: Clone + Debug + PartialEq {
    /// Exponential map to the group.
    fn exp(&self) -> Group;

    /// Zero tangent vector.
    fn zero() -> Self;
}

/// Skew-symmetric matrix `[v]×` such that `[v]× w = v × w`.
///
/// ```text
/// [  0  -vz   vy ]
/// [ vz    0  -vx ]
/// [-vy   vx    0 ]
/// ```
#[inline]
pub fn skew_symmetric(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}
