//! Optimizer-owned estimates read by the patch edges.
//!
//! Points and poses live in a [`Variables`] store and are referred to by typed
//! handles. Edges resolve their handles once per evaluation; a handle of the
//! wrong kind cannot be passed where the other is expected.

pub mod point;
pub mod pose;

pub use point::InverseDepthPoint;
pub use pose::{
    A_LEFT, A_RIGHT, B_LEFT, B_RIGHT, POSE_DOF, PhotometricBias, PhotometricPose, PoseUpdate,
};

use crate::error::{PhotobaError, PhotobaResult};

/// Handle of an [`InverseDepthPoint`] in a [`Variables`] store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointHandle(pub usize);

/// Handle of a [`PhotometricPose`] in a [`Variables`] store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoseHandle(pub usize);

/// Current point and pose estimates.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    points: Vec<InverseDepthPoint>,
    poses: Vec<PhotometricPose>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: InverseDepthPoint) -> PointHandle {
        self.points.push(point);
        PointHandle(self.points.len() - 1)
    }

    pub fn add_pose(&mut self, pose: PhotometricPose) -> PoseHandle {
        self.poses.push(pose);
        PoseHandle(self.poses.len() - 1)
    }

    pub fn point(&self, handle: PointHandle) -> PhotobaResult<&InverseDepthPoint> {
        self.points
            .get(handle.0)
            .ok_or(PhotobaError::UnknownVariable {
                kind: "point",
                index: handle.0,
            })
    }

    pub fn pose(&self, handle: PoseHandle) -> PhotobaResult<&PhotometricPose> {
        self.poses.get(handle.0).ok_or(PhotobaError::UnknownVariable {
            kind: "pose",
            index: handle.0,
        })
    }

    pub fn point_mut(&mut self, handle: PointHandle) -> PhotobaResult<&mut InverseDepthPoint> {
        self.points
            .get_mut(handle.0)
            .ok_or(PhotobaError::UnknownVariable {
                kind: "point",
                index: handle.0,
            })
    }

    pub fn pose_mut(&mut self, handle: PoseHandle) -> PhotobaResult<&mut PhotometricPose> {
        self.poses
            .get_mut(handle.0)
            .ok_or(PhotobaError::UnknownVariable {
                kind: "pose",
                index: handle.0,
            })
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_poses(&self) -> usize {
        self.poses.len()
    }
}
