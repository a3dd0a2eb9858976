//! The oriented selection volume a run tests against

use serde::{Deserialize, Serialize};

use crate::foundation::math::{transform_point, Mat4, Quat, Transform, Vec3};
use crate::geometry::{AABB, OBB};

/// Oriented selection box plus its derived world AABB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SelectionParams", into = "SelectionParams")]
pub struct SelectionVolume {
    center: Vec3,
    half_extents: Vec3,
    rotation: Quat,
    obb: OBB,
    aabb: AABB,
    inverse_rigid: Mat4,
}

#[derive(Serialize, Deserialize)]
struct SelectionParams {
    center: Vec3,
    half_extents: Vec3,
    rotation: Quat,
}

impl From<SelectionParams> for SelectionVolume {
    fn from(params: SelectionParams) -> Self {
        Self::new(params.center, params.half_extents, params.rotation)
    }
}

impl From<SelectionVolume> for SelectionParams {
    fn from(volume: SelectionVolume) -> Self {
        Self {
            center: volume.center,
            half_extents: volume.half_extents,
            rotation: volume.rotation,
        }
    }
}

impl SelectionVolume {
    /// Selection centered at `center`; negative half extents are clamped to zero
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        let half_extents = half_extents.map(|h| h.max(0.0));
        let obb = OBB::new(center, half_extents, rotation);
        let placement = Transform::from_position_rotation(center, rotation);
        Self {
            center,
            half_extents,
            rotation,
            aabb: obb.world_aabb(),
            obb,
            inverse_rigid: placement.to_inverse_rigid_matrix(),
        }
    }

    /// Axis-aligned selection between two corners
    pub fn axis_aligned(min: Vec3, max: Vec3) -> Self {
        let aabb = AABB::new(min.inf(&max), min.sup(&max));
        Self::new(aabb.center(), aabb.extents(), Quat::identity())
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half extents along the box's local axes
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Rotation of the box
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Exact oriented box
    pub fn obb(&self) -> &OBB {
        &self.obb
    }

    /// World AABB enclosing the oriented box
    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    /// Box in its own frame: `[-half, +half]` on each axis
    pub fn local_box(&self) -> AABB {
        AABB::from_center_extents(Vec3::zeros(), self.half_extents)
    }

    /// World point expressed in the selection's frame (rotation and translation only)
    pub fn to_local(&self, point: &Vec3) -> Vec3 {
        transform_point(&self.inverse_rigid, point)
    }

    /// Whether the volume has no extent on some axis
    pub fn is_degenerate(&self) -> bool {
        self.half_extents.iter().any(|h| *h == 0.0)
    }
}
