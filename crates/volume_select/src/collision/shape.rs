//! Collision actors and their shapes
//!
//! Actors carry a world placement; each shape is placed relative to its actor.
//! Box, capsule and sphere shapes are stored as parameters only. Mesh shapes
//! reference collision geometry by `(partition hash, shape hash)` and are
//! fetched from the content provider when evaluated.

use serde::{Deserialize, Serialize};

use crate::collision::mesh::Mesh;
use crate::foundation::math::{translation_of, Mat4, Transform, Vec3};
use crate::geometry::{AABB, OBB};

/// Kind of a physics shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Box with half extents equal to the shape scale
    Box,
    /// Capsule, approximated by its bounding box
    Capsule,
    /// Sphere with radius equal to the shape scale's X component
    Sphere,
    /// Triangle mesh geometry
    TriangleMesh,
    /// Convex hull geometry
    ConvexMesh,
    /// Shape kind outside the known set
    Other(String),
}

impl ShapeKind {
    /// Whether geometry must be fetched to evaluate the shape
    pub fn is_mesh(&self) -> bool {
        matches!(self, Self::TriangleMesh | Self::ConvexMesh)
    }

    /// Display name used in log messages
    pub fn name(&self) -> &str {
        match self {
            Self::Box => "Box",
            Self::Capsule => "Capsule",
            Self::Sphere => "Sphere",
            Self::TriangleMesh => "TriangleMesh",
            Self::ConvexMesh => "ConvexMesh",
            Self::Other(name) => name,
        }
    }
}

/// One physics shape attached to an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionShape {
    /// Shape kind
    pub kind: ShapeKind,
    /// Placement relative to the owning actor
    pub transform: Transform,
    /// Collision geometry key for mesh kinds
    pub hash: Option<u64>,
}

/// A collision actor: a world placement plus its shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionActor {
    /// World placement of the actor
    pub transform: Transform,
    /// Attached shapes
    pub shapes: Vec<CollisionShape>,
}

impl CollisionShape {
    /// Shape of the given kind at a local placement
    pub fn new(kind: ShapeKind, transform: Transform) -> Self {
        Self {
            kind,
            transform,
            hash: None,
        }
    }

    /// Mesh-backed shape referencing collision geometry
    pub fn mesh(kind: ShapeKind, transform: Transform, hash: u64) -> Self {
        Self {
            kind,
            transform,
            hash: Some(hash),
        }
    }

    /// Actor (T·R·S) times shape (T·R); shape scale is a size parameter here
    pub fn parametric_world_matrix(&self, actor: &Transform) -> Mat4 {
        actor.to_matrix() * self.transform.to_rigid_matrix()
    }

    /// Actor (T·R·S) times shape (T·R·S), used for mesh geometry
    pub fn mesh_world_matrix(&self, actor: &Transform) -> Mat4 {
        actor.to_matrix() * self.transform.to_matrix()
    }

    /// Actor (T·R) times shape (T·R); neither scale applies
    pub fn rigid_world_matrix(&self, actor: &Transform) -> Mat4 {
        actor.to_rigid_matrix() * self.transform.to_rigid_matrix()
    }

    /// Local box half extents for box and capsule shapes
    ///
    /// Capsules keep their height on local Z: half height is
    /// `scale.y / 2 + actor_scale.x`, radius is `scale.x`.
    pub fn local_half_extents(&self, actor: &Transform) -> Option<Vec3> {
        let scale = self.transform.scale;
        match self.kind {
            ShapeKind::Box => Some(scale),
            ShapeKind::Capsule => Some(Vec3::new(
                scale.x,
                scale.x,
                scale.y / 2.0 + actor.scale.x,
            )),
            _ => None,
        }
    }

    /// World box for box-like kinds
    pub fn world_obb(&self, actor: &Transform) -> Option<OBB> {
        let half = self.local_half_extents(actor)?;
        let local = AABB::from_center_extents(Vec3::zeros(), half);
        Some(OBB::from_transformed_aabb(&local, &self.parametric_world_matrix(actor)))
    }

    /// World position of the shape origin including actor scale
    pub fn world_origin(&self, actor: &Transform) -> Vec3 {
        translation_of(&self.parametric_world_matrix(actor))
    }

    /// Sphere center; neither the actor's nor the shape's scale moves it
    pub fn sphere_center(&self, actor: &Transform) -> Vec3 {
        translation_of(&self.rigid_world_matrix(actor))
    }

    /// World AABB enclosing everything the shape's test can hit
    ///
    /// Uses the same frames as the per-shape tests: the parametric box for
    /// boxes and capsules, the rigid center for spheres, and the full
    /// actor × shape matrix for mesh geometry. Mesh kinds without `geometry`
    /// shrink to their origin. `None` for unknown kinds and empty meshes.
    pub fn world_bounds(&self, actor: &Transform, geometry: Option<&Mesh>) -> Option<AABB> {
        match &self.kind {
            ShapeKind::Box | ShapeKind::Capsule => self.world_obb(actor).map(|obb| obb.world_aabb()),
            ShapeKind::Sphere => Some(AABB::from_center_extents(
                self.sphere_center(actor),
                Vec3::repeat(self.transform.scale.x.abs()),
            )),
            ShapeKind::TriangleMesh | ShapeKind::ConvexMesh => match geometry {
                Some(mesh) => {
                    let matrix = self.mesh_world_matrix(actor);
                    mesh.submeshes
                        .iter()
                        .map(|submesh| submesh.bounds.transformed(&matrix))
                        .reduce(|a, b| a.union(&b))
                }
                None => {
                    let origin = self.world_origin(actor);
                    Some(AABB::new(origin, origin))
                }
            },
            ShapeKind::Other(_) => None,
        }
    }
}
