//! Inverse-depth photometric patch edge.
//!
//! The edge compares the patch around a point in its anchor image with the
//! same patch re-projected into an observation image, after mapping the anchor
//! intensities through both poses' affine brightness models.
//!
//! # Residual
//!
//! For every offset `(dx, dy)` of the pattern, at pyramid level scale `s`:
//!
//! ```text
//! ref  = I_anchor(u0/s + dx, v0/s + dy)
//! P_a  = back_project((u0 + dx·s, v0 + dy·s), 1/ρ)
//! P_o  = T_obs · T_anchor⁻¹ · P_a
//! obs  = I_obs(project(P_o, baseline) / s)
//! r    = exp(a_o - a_l) · (ref - b_l) - (obs - b_o)
//! ```
//!
//! `(a_l, b_l)` is the anchor's left bias. `(a_o, b_o)` is the observation's
//! left bias for a zero baseline and its right bias otherwise. If any sample of
//! the patch falls outside its image, every component is set to the penalty.
//!
//! # Jacobians
//!
//! Poses are updated as `T ← exp(δ) ∘ T` with `δ = [ρ, θ]`, so a point moves
//! by `[I | -[P]×] δ` under a perturbation of the pose that maps it. With
//! `g = ∇I_obs` and `J = ∂(project/s)/∂P_o`:
//!
//! ```text
//! ∂r/∂ρ      =  g J R_oa P_a / ρ
//! ∂r/∂δ_obs  = -g J [I | -[P_o]×]
//! ∂r/∂δ_anc  =  g J R_oa [I | -[P_a]×]
//! ```
//!
//! A stereo self-edge compares the left and right images of one pose: the rigid
//! motion cancels and only the brightness columns remain.

use std::sync::Arc;

use nalgebra::{Matrix3, RowVector3, SMatrix, SVector, Vector2, Vector3};
use tracing::{debug, warn};

use super::config::PatchEdgeConfig;
use super::validity::is_geometry_valid;
use crate::error::{PhotobaError, PhotobaResult};
use crate::image::{ImagePyramid, PyramidLevel, sample_gradient, sample_intensity};
use crate::variables::{
    A_LEFT, A_RIGHT, B_LEFT, B_RIGHT, InverseDepthPoint, POSE_DOF, PhotometricPose, PointHandle,
    PoseHandle, Variables,
};
use photoba_camera_models::CameraModel;
use photoba_io::{EdgeRecord, PATCH_DIM, PatchEdgeEntry};
use photoba_manifolds::{LieGroup, SE3, skew_symmetric};

/// Residual of one patch.
pub type PatchVector = SVector<f64, PATCH_DIM>;

/// Jacobian of a patch residual w.r.t. the inverse depth.
pub type PointJacobian = SMatrix<f64, PATCH_DIM, 1>;

/// Jacobian of a patch residual w.r.t. a photometric pose update.
pub type PoseJacobian = SMatrix<f64, PATCH_DIM, POSE_DOF>;

/// How the observation relates to the anchor, fixed when the edge is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Single camera, no baseline
    Monocular,
    /// Stereo rig, both images on the same side
    StereoSameSide,
    /// Stereo rig, observation on the other side of a distinct pose
    StereoCrossSide,
    /// Left against right image of the same pose
    StereoSelf,
}

impl EdgeKind {
    /// Whether the observation side uses the right brightness pair.
    pub fn uses_right_bias(self) -> bool {
        matches!(self, EdgeKind::StereoCrossSide | EdgeKind::StereoSelf)
    }

    pub fn is_self_edge(self) -> bool {
        self == EdgeKind::StereoSelf
    }

    fn classify(
        observation: PoseHandle,
        anchor: PoseHandle,
        baseline: f64,
        camera_baseline: f64,
        epsilon: f64,
    ) -> PhotobaResult<Self> {
        if !baseline.is_finite() {
            return Err(PhotobaError::InvalidEdge(format!(
                "baseline must be finite, got {baseline}"
            )));
        }
        if baseline <= -epsilon {
            return Err(PhotobaError::InvalidEdge(format!(
                "baseline must not be negative, got {baseline}"
            )));
        }
        let zero_baseline = baseline < epsilon;

        if observation == anchor {
            if zero_baseline {
                warn!(
                    "Rejecting self-edge on pose {} without a stereo baseline",
                    anchor.0
                );
                return Err(PhotobaError::InvalidEdge(format!(
                    "self-edge on pose {} needs a non-zero baseline",
                    anchor.0
                )));
            }
            return Ok(EdgeKind::StereoSelf);
        }

        Ok(if !zero_baseline {
            EdgeKind::StereoCrossSide
        } else if camera_baseline.abs() < epsilon {
            EdgeKind::Monocular
        } else {
            EdgeKind::StereoSameSide
        })
    }
}

/// Anchor and observation pyramids and the level an edge works on.
#[derive(Debug, Clone)]
pub struct PatchImages {
    pub anchor: Arc<ImagePyramid>,
    pub observation: Arc<ImagePyramid>,
    pub level: usize,
}

impl PatchImages {
    pub fn new(anchor: Arc<ImagePyramid>, observation: Arc<ImagePyramid>, level: usize) -> Self {
        Self {
            anchor,
            observation,
            level,
        }
    }
}

/// Resolved variables of one evaluation.
///
/// For a self-edge `observation` and `anchor` refer to the same pose.
#[derive(Debug, Clone, Copy)]
pub struct EdgeState<'a> {
    pub point: &'a InverseDepthPoint,
    pub observation: &'a PhotometricPose,
    pub anchor: &'a PhotometricPose,
}

/// Jacobian blocks of one patch residual.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchJacobians {
    pub point: PointJacobian,
    pub observation: PoseJacobian,
    pub anchor: PoseJacobian,
}

impl PatchJacobians {
    pub fn zeros() -> Self {
        Self {
            point: PointJacobian::zeros(),
            observation: PoseJacobian::zeros(),
            anchor: PoseJacobian::zeros(),
        }
    }
}

/// Intermediates of one pattern offset.
#[derive(Debug, Clone, Copy)]
struct OffsetSample {
    p_anchor: Vector3<f64>,
    p_obs: Vector3<f64>,
    obs_uv: Vector2<f64>,
    reference: f64,
    observed: f64,
}

/// Everything the residual and the Jacobians share.
#[derive(Debug, Clone)]
struct ForwardPass {
    samples: [OffsetSample; PATCH_DIM],
    rotation_oa: Matrix3<f64>,
    /// `exp(a_o - a_l)`
    gain_ratio: f64,
    observation_offset: f64,
    anchor_offset: f64,
}

impl ForwardPass {
    fn residual(&self) -> PatchVector {
        PatchVector::from_fn(|i, _| {
            let s = &self.samples[i];
            self.gain_ratio * (s.reference - self.anchor_offset)
                - (s.observed - self.observation_offset)
        })
    }
}

/// Photometric residual of one inverse-depth point between two poses.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nalgebra::DMatrix;
/// use photoba::factors::{PatchEdge, PatchEdgeConfig, PatchImages};
/// use photoba::image::{ImagePyramid, PyramidLevel};
/// use photoba::variables::{InverseDepthPoint, PhotometricPose, Variables};
/// use photoba_camera_models::{PinholeCamera, PinholeParams};
///
/// let camera = PinholeCamera::new(PinholeParams::new(300.0, 300.0, 32.0, 24.0)?)?;
/// let image = DMatrix::from_fn(48, 64, |r, c| (r + 2 * c) as f32);
/// let pyramid = Arc::new(ImagePyramid::new(vec![PyramidLevel::from_intensity(image, 1.0)?])?);
///
/// let mut variables = Variables::new();
/// let point = variables.add_point(InverseDepthPoint::from_depth(30.0, 20.0, 2.0));
/// let anchor = variables.add_pose(PhotometricPose::identity());
/// let observation = variables.add_pose(PhotometricPose::identity());
///
/// let images = PatchImages::new(pyramid.clone(), pyramid, 0);
/// let edge = PatchEdge::new(point, observation, anchor, camera, images, 0.0, PatchEdgeConfig::default())?;
/// let residual = edge.compute_residual(&variables)?;
/// assert!(residual.norm() < 1e-6);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct PatchEdge<CAM: CameraModel> {
    point: PointHandle,
    observation: PoseHandle,
    anchor: PoseHandle,
    camera: CAM,
    images: PatchImages,
    baseline: f64,
    kind: EdgeKind,
    config: PatchEdgeConfig,
    record: EdgeRecord,
}

impl<CAM: CameraModel> PatchEdge<CAM> {
    /// Binds an edge to its variables, camera and images.
    ///
    /// `observation == anchor` builds a stereo self-edge, which requires a
    /// non-zero `baseline`. The level must exist in both pyramids with the
    /// same scale.
    pub fn new(
        point: PointHandle,
        observation: PoseHandle,
        anchor: PoseHandle,
        camera: CAM,
        images: PatchImages,
        baseline: f64,
        config: PatchEdgeConfig,
    ) -> PhotobaResult<Self> {
        camera.validate_params()?;

        let anchor_level = images.anchor.level(images.level);
        let observation_level = images.observation.level(images.level);
        let (Some(anchor_level), Some(observation_level)) = (anchor_level, observation_level)
        else {
            return Err(PhotobaError::InvalidEdge(format!(
                "level {} missing from pyramids with {} and {} levels",
                images.level,
                images.anchor.num_levels(),
                images.observation.num_levels()
            )));
        };
        if (anchor_level.scale() - observation_level.scale()).abs() > 1e-9 {
            return Err(PhotobaError::InvalidEdge(format!(
                "anchor scale {} and observation scale {} differ at level {}",
                anchor_level.scale(),
                observation_level.scale(),
                images.level
            )));
        }

        let kind = EdgeKind::classify(
            observation,
            anchor,
            baseline,
            camera.stereo_baseline(),
            config.baseline_epsilon,
        )?;

        Ok(Self {
            point,
            observation,
            anchor,
            camera,
            images,
            baseline,
            kind,
            config,
            record: EdgeRecord::new(0, PatchVector::zeros(), SMatrix::identity()),
        })
    }

    /// Rebuilds an edge from a persisted entry, using its ids as handles.
    pub fn from_entry(
        entry: &PatchEdgeEntry,
        camera: CAM,
        images: PatchImages,
        baseline: f64,
        config: PatchEdgeConfig,
    ) -> PhotobaResult<Self> {
        let edge = Self::new(
            PointHandle(entry.point_id),
            PoseHandle(entry.observation_id),
            PoseHandle(entry.anchor_id),
            camera,
            images,
            baseline,
            config,
        )?;
        Ok(edge.with_record(entry.record.clone()))
    }

    pub fn with_record(mut self, record: EdgeRecord) -> Self {
        self.record = record;
        self
    }

    pub fn with_parameter_id(mut self, parameter_id: i32) -> Self {
        self.record.parameter_id = parameter_id;
        self
    }

    /// Stored measurement; persisted with the edge, not used by the residual.
    pub fn with_measurement(mut self, measurement: PatchVector) -> Self {
        self.record.measurement = measurement;
        self
    }

    pub fn with_information(mut self, information: SMatrix<f64, PATCH_DIM, PATCH_DIM>) -> Self {
        self.record.information = information;
        self
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn point_handle(&self) -> PointHandle {
        self.point
    }

    pub fn observation_handle(&self) -> PoseHandle {
        self.observation
    }

    pub fn anchor_handle(&self) -> PoseHandle {
        self.anchor
    }

    pub fn camera(&self) -> &CAM {
        &self.camera
    }

    pub fn config(&self) -> &PatchEdgeConfig {
        &self.config
    }

    pub fn record(&self) -> &EdgeRecord {
        &self.record
    }

    pub fn information(&self) -> &SMatrix<f64, PATCH_DIM, PATCH_DIM> {
        &self.record.information
    }

    /// Persisted form of the edge.
    pub fn to_entry(&self) -> PatchEdgeEntry {
        PatchEdgeEntry {
            point_id: self.point.0,
            observation_id: self.observation.0,
            anchor_id: self.anchor.0,
            record: self.record.clone(),
        }
    }

    /// Looks up the edge's variables.
    pub fn resolve<'a>(&self, variables: &'a Variables) -> PhotobaResult<EdgeState<'a>> {
        Ok(EdgeState {
            point: variables.point(self.point)?,
            observation: variables.pose(self.observation)?,
            anchor: variables.pose(self.anchor)?,
        })
    }

    pub fn compute_residual(&self, variables: &Variables) -> PhotobaResult<PatchVector> {
        Ok(self.residual(&self.resolve(variables)?))
    }

    pub fn compute_linearization(
        &self,
        variables: &Variables,
    ) -> PhotobaResult<(PatchVector, PatchJacobians)> {
        Ok(self.linearize(&self.resolve(variables)?))
    }

    /// Whether the point lies in front of both cameras.
    pub fn is_depth_positive(&self, variables: &Variables) -> PhotobaResult<bool> {
        let state = self.resolve(variables)?;
        Ok(is_geometry_valid(
            state.point,
            state.observation,
            state.anchor,
            &self.camera,
        ))
    }

    /// `rᵀ Ω r`
    pub fn chi2(&self, residual: &PatchVector) -> f64 {
        (residual.transpose() * self.record.information * residual)[(0, 0)]
    }

    /// Patch residual at the given estimates.
    pub fn residual(&self, state: &EdgeState<'_>) -> PatchVector {
        match self.forward(state) {
            Some(pass) => pass.residual(),
            None => PatchVector::repeat(self.config.penalty),
        }
    }

    /// Patch residual and its Jacobian blocks at the given estimates.
    ///
    /// A patch that bails out yields the penalty residual and zero Jacobians.
    pub fn linearize(&self, state: &EdgeState<'_>) -> (PatchVector, PatchJacobians) {
        let mut jacobians = PatchJacobians::zeros();
        let Some(pass) = self.forward(state) else {
            return (PatchVector::repeat(self.config.penalty), jacobians);
        };

        let Some(level) = self.observation_level() else {
            return (PatchVector::repeat(self.config.penalty), jacobians);
        };
        let inv_scale = 1.0 / level.scale();
        let self_edge = self.kind.is_self_edge();
        let (a_obs_col, b_obs_col) = if self.kind.uses_right_bias() {
            (A_RIGHT, B_RIGHT)
        } else {
            (A_LEFT, B_LEFT)
        };

        for (i, sample) in pass.samples.iter().enumerate() {
            let gradient = sample_gradient(level, sample.obs_uv.x, sample.obs_uv.y);
            let d_uv_d_pobs = self.camera.jacobian_point(&sample.p_obs, self.baseline) * inv_scale;
            // ∂obs/∂P_o
            let g_j: RowVector3<f64> = gradient.transpose() * d_uv_d_pobs;
            let g_j_r: RowVector3<f64> = g_j * pass.rotation_oa;

            jacobians.point[(i, 0)] =
                (g_j_r * sample.p_anchor)[(0, 0)] / state.point.inverse_depth;

            if !self_edge {
                let obs_rot = g_j * skew_symmetric(&sample.p_obs);
                let anchor_rot = -(g_j_r * skew_symmetric(&sample.p_anchor));
                for c in 0..3 {
                    jacobians.observation[(i, c)] = -g_j[c];
                    jacobians.observation[(i, 3 + c)] = obs_rot[c];
                    jacobians.anchor[(i, c)] = g_j_r[c];
                    jacobians.anchor[(i, 3 + c)] = anchor_rot[c];
                }
            }

            let d_reference = pass.gain_ratio * (sample.reference - pass.anchor_offset);
            jacobians.anchor[(i, A_LEFT)] = -d_reference;
            jacobians.anchor[(i, B_LEFT)] = -pass.gain_ratio;

            if self_edge {
                jacobians.anchor[(i, A_RIGHT)] = d_reference;
                jacobians.anchor[(i, B_RIGHT)] = 1.0;
                for c in A_LEFT..POSE_DOF {
                    jacobians.observation[(i, c)] = jacobians.anchor[(i, c)];
                }
            } else {
                jacobians.observation[(i, a_obs_col)] = d_reference;
                jacobians.observation[(i, b_obs_col)] = 1.0;
            }
        }

        (pass.residual(), jacobians)
    }

    fn anchor_level(&self) -> Option<&PyramidLevel> {
        self.images.anchor.level(self.images.level)
    }

    fn observation_level(&self) -> Option<&PyramidLevel> {
        self.images.observation.level(self.images.level)
    }

    /// Unproject, transform, project and sample every pattern offset.
    ///
    /// `None` when any sample leaves its image.
    fn forward(&self, state: &EdgeState<'_>) -> Option<ForwardPass> {
        let anchor_level = self.anchor_level()?;
        let observation_level = self.observation_level()?;
        let scale = anchor_level.scale();

        let relative = if self.kind.is_self_edge() {
            SE3::identity()
        } else {
            state
                .observation
                .pose
                .compose(&state.anchor.pose.inverse())
        };

        let point = state.point;
        let mut samples = [OffsetSample {
            p_anchor: Vector3::zeros(),
            p_obs: Vector3::zeros(),
            obs_uv: Vector2::zeros(),
            reference: 0.0,
            observed: 0.0,
        }; PATCH_DIM];

        for (i, &(dx, dy)) in self.config.pattern.offsets().iter().enumerate() {
            let ref_u = point.u0 / scale + dx;
            let ref_v = point.v0 / scale + dy;
            let reference = sample_intensity(anchor_level, ref_u, ref_v);

            let p_anchor = point.anchor_point(&self.camera, dx * scale, dy * scale);
            let p_obs = relative.act(&p_anchor);
            let obs_uv = self
                .camera
                .project(&p_obs, self.baseline)
                .ok()
                .map(|uv| uv / scale);
            let observed = obs_uv.and_then(|uv| sample_intensity(observation_level, uv.x, uv.y));

            let (Some(reference), Some(observed), Some(obs_uv)) = (reference, observed, obs_uv)
            else {
                if self.config.verbose_bailout {
                    debug!(
                        "Patch of point {} bailed out at offset {} ({}, {}) between poses {} and {}",
                        self.point.0, i, dx, dy, self.anchor.0, self.observation.0
                    );
                }
                return None;
            };

            samples[i] = OffsetSample {
                p_anchor,
                p_obs,
                obs_uv,
                reference,
                observed,
            };
        }

        let (a_obs, b_obs) = state.observation.bias.side(self.kind.uses_right_bias());
        Some(ForwardPass {
            samples,
            rotation_oa: relative.rotation_matrix(),
            gain_ratio: (a_obs - state.anchor.bias.a_left).exp(),
            observation_offset: b_obs,
            anchor_offset: state.anchor.bias.b_left,
        })
    }
}
