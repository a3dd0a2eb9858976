//! Oriented bounding boxes and box/box separating-axis tests

use crate::foundation::math::{transform_point, Mat4, Quat, Vec3, DEGENERATE_LENGTH_SQUARED};
use crate::geometry::aabb::AABB;

/// Result of testing one volume against another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// No shared point
    Disjoint,
    /// Overlapping but not fully enclosed
    Intersects,
    /// The tested volume lies entirely inside
    Contains,
}

impl Containment {
    /// Anything but [`Containment::Disjoint`]
    pub fn is_hit(self) -> bool {
        self != Self::Disjoint
    }
}

/// Oriented box: a center, three unit edge directions and a half-length per direction
///
/// Directions come from the columns of the matrix the box was built with, so
/// a sheared transform yields non-orthogonal directions. Separating-axis
/// tests use the true face normals (cross products of edge directions) and
/// stay exact for such parallelepipeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OBB {
    /// World-space center
    pub center: Vec3,
    /// Unit edge directions
    pub axes: [Vec3; 3],
    /// Half-length along each edge direction
    pub half_extents: Vec3,
}

impl OBB {
    /// Box from a center, non-negative half extents and a rotation
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        let matrix = rotation.to_rotation_matrix();
        let basis = matrix.matrix();
        Self {
            center,
            axes: [
                basis.column(0).into_owned(),
                basis.column(1).into_owned(),
                basis.column(2).into_owned(),
            ],
            half_extents: half_extents.map(|h| h.max(0.0)),
        }
    }

    /// Axis-aligned box viewed as an oriented one
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self {
            center: aabb.center(),
            axes: [Vec3::x(), Vec3::y(), Vec3::z()],
            half_extents: aabb.extents(),
        }
    }

    /// Local box carried through an affine matrix; scale lands in the extents
    pub fn from_transformed_aabb(local: &AABB, matrix: &Mat4) -> Self {
        let center = transform_point(matrix, &local.center());
        let extents = local.extents();
        let columns = [
            matrix.fixed_view::<3, 1>(0, 0).into_owned(),
            matrix.fixed_view::<3, 1>(0, 1).into_owned(),
            matrix.fixed_view::<3, 1>(0, 2).into_owned(),
        ];
        let lengths = columns.map(|column| column.norm());

        let mut axes = [Vec3::zeros(); 3];
        for (index, column) in columns.iter().enumerate() {
            if lengths[index] * lengths[index] > DEGENERATE_LENGTH_SQUARED {
                axes[index] = column / lengths[index];
            }
        }
        repair_degenerate_axes(&mut axes);

        Self {
            center,
            axes,
            half_extents: Vec3::new(
                lengths[0] * extents.x.abs(),
                lengths[1] * extents.y.abs(),
                lengths[2] * extents.z.abs(),
            ),
        }
    }

    /// Half-edge vectors (direction scaled by half length)
    fn half_edges(&self) -> [Vec3; 3] {
        [
            self.axes[0] * self.half_extents.x,
            self.axes[1] * self.half_extents.y,
            self.axes[2] * self.half_extents.z,
        ]
    }

    /// Face normals; equal to the axes when they are orthogonal
    pub fn face_normals(&self) -> [Vec3; 3] {
        let [a, b, c] = self.axes;
        [
            normalized_or(b.cross(&c), a),
            normalized_or(c.cross(&a), b),
            normalized_or(a.cross(&b), c),
        ]
    }

    /// Half-width of the box's shadow on `axis`
    pub fn projection_radius(&self, axis: &Vec3) -> f32 {
        self.half_edges().iter().map(|edge| edge.dot(axis).abs()).sum()
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let [e0, e1, e2] = self.half_edges();
        let c = self.center;
        [
            c - e0 - e1 - e2,
            c + e0 - e1 - e2,
            c - e0 + e1 - e2,
            c + e0 + e1 - e2,
            c - e0 - e1 + e2,
            c + e0 - e1 + e2,
            c - e0 + e1 + e2,
            c + e0 + e1 + e2,
        ]
    }

    /// Axis-aligned box enclosing every corner
    pub fn world_aabb(&self) -> AABB {
        let corners = self.corners();
        let mut aabb = AABB::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            aabb.expand_point(corner);
        }
        aabb
    }

    /// Whether `point` lies inside or on the box
    pub fn contains_point(&self, point: &Vec3) -> bool {
        let offset = point - self.center;
        self.face_normals().iter().all(|normal| {
            offset.dot(normal).abs() <= self.projection_radius(normal) + CONTAINMENT_TOLERANCE
        })
    }

    /// Exact separating-axis overlap test
    pub fn intersects(&self, other: &OBB) -> bool {
        let offset = other.center - self.center;
        let separated = |axis: &Vec3| {
            offset.dot(axis).abs() > self.projection_radius(axis) + other.projection_radius(axis)
        };

        if self.face_normals().iter().any(separated) || other.face_normals().iter().any(separated) {
            return false;
        }

        for a in &self.axes {
            for b in &other.axes {
                let axis = a.cross(b);
                if axis.norm_squared() <= DEGENERATE_LENGTH_SQUARED {
                    continue;
                }
                if separated(&axis.normalize()) {
                    return false;
                }
            }
        }
        true
    }

    /// Tri-state test of `other` against this box
    pub fn containment(&self, other: &OBB) -> Containment {
        if !self.intersects(other) {
            Containment::Disjoint
        } else if other.corners().iter().all(|corner| self.contains_point(corner)) {
            Containment::Contains
        } else {
            Containment::Intersects
        }
    }

    /// Tri-state test of an axis-aligned box against this box
    pub fn containment_aabb(&self, aabb: &AABB) -> Containment {
        self.containment(&OBB::from_aabb(aabb))
    }
}

const CONTAINMENT_TOLERANCE: f32 = 1e-5;

fn normalized_or(vector: Vec3, fallback: Vec3) -> Vec3 {
    if vector.norm_squared() > DEGENERATE_LENGTH_SQUARED {
        vector.normalize()
    } else {
        fallback
    }
}

/// Flat boxes (zero scale on an axis) still need a full basis for face normals
fn repair_degenerate_axes(axes: &mut [Vec3; 3]) {
    let basis = [Vec3::x(), Vec3::y(), Vec3::z()];
    for index in 0..3 {
        if axes[index] != Vec3::zeros() {
            continue;
        }
        let (next, prev) = (axes[(index + 1) % 3], axes[(index + 2) % 3]);
        let candidate = next.cross(&prev);
        axes[index] = if candidate.norm_squared() > DEGENERATE_LENGTH_SQUARED {
            candidate.normalize()
        } else {
            basis
                .iter()
                .copied()
                .find(|axis| {
                    axes.iter()
                        .all(|existing| existing.dot(axis).abs() < 1.0 - CONTAINMENT_TOLERANCE)
                })
                .unwrap_or(basis[index])
        };
    }
}
