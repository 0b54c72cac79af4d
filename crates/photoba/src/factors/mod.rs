//! Photometric patch edges.
//!
//! # Module Structure
//!
//! - `config`: neighbourhood pattern and edge settings
//! - `patch_edge`: the inverse-depth patch residual and its Jacobians
//! - `validity`: depth check used by the host to gate degenerate geometry
//!
//! Edges only read shared, immutable inputs and write into their own output,
//! so batches are evaluated in parallel with rayon.

pub mod config;
pub mod patch_edge;
pub mod validity;

pub use config::{
    DEFAULT_BASELINE_EPSILON, DEFAULT_PENALTY, NeighbourhoodPattern, PatchEdgeConfig,
};
pub use patch_edge::{
    EdgeKind, EdgeState, PatchEdge, PatchImages, PatchJacobians, PatchVector, PointJacobian,
    PoseJacobian,
};
pub use validity::{MIN_INVERSE_DEPTH, is_geometry_valid};

use crate::error::PhotobaResult;
use crate::variables::Variables;
use photoba_camera_models::CameraModel;
use rayon::prelude::*;
use tracing::debug;

/// Residuals and Jacobians of many edges, in input order.
pub fn linearize_edges<CAM: CameraModel>(
    edges: &[PatchEdge<CAM>],
    variables: &Variables,
) -> PhotobaResult<Vec<(PatchVector, PatchJacobians)>> {
    let linearizations = edges
        .par_iter()
        .map(|edge| edge.compute_linearization(variables))
        .collect::<PhotobaResult<Vec<_>>>()?;
    debug!("Linearized {} patch edges", linearizations.len());
    Ok(linearizations)
}

/// Sum of `rᵀ Ω r` over all edges.
pub fn total_chi2<CAM: CameraModel>(
    edges: &[PatchEdge<CAM>],
    variables: &Variables,
) -> PhotobaResult<f64> {
    let costs = edges
        .par_iter()
        .map(|edge| -> PhotobaResult<f64> {
            let residual = edge.compute_residual(variables)?;
            Ok(edge.chi2(&residual))
        })
        .collect::<PhotobaResult<Vec<f64>>>()?;
    Ok(costs.iter().sum())
}
