//! Geometric validity of a point seen from two poses.

use crate::variables::{InverseDepthPoint, PhotometricPose};
use photoba_camera_models::CameraModel;
use photoba_manifolds::LieGroup;

/// Inverse depths below this are treated as points at infinity.
pub const MIN_INVERSE_DEPTH: f64 = 1e-12;

/// Whether the point lies in front of both the anchor and observation cameras.
///
/// Only the center pixel of the point is tested. This is a query for the host
/// optimizer; residual evaluation never calls it.
pub fn is_geometry_valid<CAM: CameraModel>(
    point: &InverseDepthPoint,
    observation: &PhotometricPose,
    anchor: &PhotometricPose,
    camera: &CAM,
) -> bool {
    if point.inverse_depth < MIN_INVERSE_DEPTH {
        return false;
    }

    let p_anchor = point.anchor_point(camera, 0.0, 0.0);
    let p_world = anchor.pose.inverse().act(&p_anchor);
    let p_obs = observation.transform(&p_world);

    // NaN depths compare false
    p_anchor.z > 0.0 && p_obs.z > 0.0
}
