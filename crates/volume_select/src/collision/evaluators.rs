//! Per-shape intersection tests against the selection volume

use std::sync::Arc;

use log::warn;

use crate::collision::mesh::Mesh;
use crate::collision::shape::{CollisionShape, ShapeKind};
use crate::foundation::math::Transform;
use crate::world::selection::SelectionVolume;

/// Outcome of testing one shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTest {
    /// The shape touches the selection
    Hit,
    /// The shape is clear of the selection
    Miss,
    /// The shape kind cannot be evaluated
    Unsupported,
}

impl From<bool> for ShapeTest {
    fn from(hit: bool) -> Self {
        if hit {
            Self::Hit
        } else {
            Self::Miss
        }
    }
}

/// Box and capsule shapes: world AABB reject, then exact box/box test
pub fn box_like_hits(shape: &CollisionShape, actor: &Transform, selection: &SelectionVolume) -> bool {
    let Some(obb) = shape.world_obb(actor) else {
        return false;
    };
    if !obb.world_aabb().intersects(selection.aabb()) {
        return false;
    }
    selection.obb().containment(&obb).is_hit()
}

/// Sphere shapes
///
/// The center ignores both the actor's and the shape's scale and is tested
/// in the selection's local frame against `[-half, +half]`, radius
/// `shape.scale.x`.
pub fn sphere_hits(shape: &CollisionShape, actor: &Transform, selection: &SelectionVolume) -> bool {
    let local = selection.to_local(&shape.sphere_center(actor));
    selection
        .local_box()
        .intersects_sphere(&local, shape.transform.scale.x)
}

/// Mesh-backed shapes; missing geometry falls back to the shape origin
pub fn mesh_shape_hits(
    shape: &CollisionShape,
    actor: &Transform,
    geometry: Option<&Mesh>,
    selection: &SelectionVolume,
) -> bool {
    match geometry {
        Some(mesh) => mesh.hits_with_matrix(&shape.mesh_world_matrix(actor), selection),
        None => selection.obb().contains_point(&shape.world_origin(actor)),
    }
}

/// Dispatch on the shape kind
///
/// `geometry` resolves collision meshes for mesh kinds; it is only called
/// for those.
pub fn test_shape<F>(
    shape: &CollisionShape,
    actor: &Transform,
    selection: &SelectionVolume,
    geometry: F,
) -> ShapeTest
where
    F: FnOnce(&CollisionShape) -> Option<Arc<Mesh>>,
{
    match &shape.kind {
        ShapeKind::Box | ShapeKind::Capsule => box_like_hits(shape, actor, selection).into(),
        ShapeKind::Sphere => sphere_hits(shape, actor, selection).into(),
        ShapeKind::TriangleMesh | ShapeKind::ConvexMesh => {
            let mesh = geometry(shape);
            if mesh.is_none() {
                warn!(
                    "Collision geometry {:?} missing for {} shape, testing its position only",
                    shape.hash,
                    shape.kind.name()
                );
            }
            mesh_shape_hits(shape, actor, mesh.as_deref(), selection).into()
        }
        ShapeKind::Other(_) => ShapeTest::Unsupported,
    }
}
