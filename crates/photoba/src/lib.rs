//! # photoba
//!
//! Inverse-depth photometric patch residuals for direct bundle adjustment.
//!
//! A [`PatchEdge`] compares the intensities around a point in its anchor image
//! with the same patch re-projected into an observation image, compensating
//! for the affine exposure of both images. It returns the 9-dimensional
//! residual together with analytic Jacobians w.r.t. the point's inverse depth
//! and both photometric poses (6 rigid + 4 brightness parameters each).
//!
//! ## Crates
//!
//! - `photoba-manifolds`: SO(3) / SE(3) with the left-plus pose update
//! - `photoba-camera-models`: pinhole projection with a stereo offset
//! - `photoba-io`: edge records and patch edge files
//!
//! ## Evaluation never fails
//!
//! Construction validates the bindings and returns [`PhotobaResult`]. Once
//! built, an edge always produces a residual: a patch with any sample outside
//! its image yields the penalty value in every component and zero Jacobians.
//! Degenerate depths are reported separately by [`is_geometry_valid`].

pub mod error;
pub mod factors;
pub mod image;
pub mod logger;
pub mod variables;

pub use error::{PhotobaError, PhotobaResult};
pub use factors::{
    EdgeKind, EdgeState, NeighbourhoodPattern, PatchEdge, PatchEdgeConfig, PatchImages,
    PatchJacobians, PatchVector, is_geometry_valid, linearize_edges, total_chi2,
};
pub use image::{ImagePyramid, PyramidLevel, sample_gradient, sample_intensity};
pub use logger::{init_logger, init_logger_with_level};
pub use variables::{
    InverseDepthPoint, PhotometricBias, PhotometricPose, PointHandle, PoseHandle, PoseUpdate,
    Variables,
};

pub use photoba_camera_models as camera_models;
pub use photoba_io as io;
pub use photoba_manifolds as manifolds;
