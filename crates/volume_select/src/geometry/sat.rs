//! Separating-axis test between a convex polygon and an oriented box
//!
//! The polygon is given in world space and is not transformed here. Candidate
//! axes are the box's face normals, the polygon's face normal and the cross
//! product of every polygon edge with every box axis. Near-zero cross
//! products are skipped.

use crate::foundation::math::{Vec3, DEGENERATE_LENGTH_SQUARED};
use crate::geometry::obb::OBB;

/// Closed interval of projections onto an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInterval {
    /// Smallest projected value
    pub min: f32,
    /// Largest projected value
    pub max: f32,
}

impl ProjectionInterval {
    /// Interval covering `points` projected on `axis`, measured from `origin`
    pub fn of_points(points: &[Vec3], origin: &Vec3, axis: &Vec3) -> Self {
        let mut interval = Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        };
        for point in points {
            let distance = (point - origin).dot(axis);
            interval.min = interval.min.min(distance);
            interval.max = interval.max.max(distance);
        }
        interval
    }

    /// Symmetric interval `[-radius, radius]`
    pub fn centered(radius: f32) -> Self {
        Self {
            min: -radius,
            max: radius,
        }
    }

    /// Whether the two intervals share at least one value
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// Face normal from the first three vertices, `None` when they are collinear
pub fn polygon_normal(vertices: &[Vec3]) -> Option<Vec3> {
    if vertices.len() < 3 {
        return None;
    }
    let normal = (vertices[1] - vertices[0]).cross(&(vertices[2] - vertices[0]));
    if normal.norm_squared() <= DEGENERATE_LENGTH_SQUARED {
        None
    } else {
        Some(normal.normalize())
    }
}

/// Exact overlap test between a convex world-space polygon and a box
pub fn polygon_intersects_obb(vertices: &[Vec3], obb: &OBB) -> bool {
    if vertices.is_empty() {
        return false;
    }

    let separated = |axis: &Vec3| {
        let polygon = ProjectionInterval::of_points(vertices, &obb.center, axis);
        let shadow = ProjectionInterval::centered(obb.projection_radius(axis));
        !polygon.overlaps(&shadow)
    };

    if obb.face_normals().iter().any(separated) {
        return false;
    }

    if let Some(normal) = polygon_normal(vertices) {
        if separated(&normal) {
            return false;
        }
    }

    for (index, start) in vertices.iter().enumerate() {
        let end = &vertices[(index + 1) % vertices.len()];
        let edge = end - start;
        for box_axis in &obb.axes {
            let axis = edge.cross(box_axis);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;

    fn unit_box() -> OBB {
        OBB::new(Vec3::zeros(), Vec3::repeat(1.0), Quat::identity())
    }

    #[test]
    fn test_triangle_through_box() {
        let triangle = [
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 5.0),
        ];
        assert!(polygon_intersects_obb(&triangle, &unit_box()));
    }

    #[test]
    fn test_triangle_beside_box() {
        let triangle = [
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(3.5, 1.0, 0.0),
        ];
        assert!(!polygon_intersects_obb(&triangle, &unit_box()));
    }

    #[test]
    fn test_triangle_cutting_corner_region_but_missing_box() {
        // The triangle's AABB swallows the box corner, the plane passes beyond it.
        let triangle = [
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        ];
        assert!(!polygon_intersects_obb(&triangle, &unit_box()));

        let closer = [
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
        ];
        assert!(polygon_intersects_obb(&closer, &unit_box()));
    }

    #[test]
    fn test_quad_against_rotated_box() {
        let rotated = OBB::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 0.2, 0.2),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4),
        );
        // Small quad sitting on the diagonal the box is aligned with.
        let on_diagonal = [
            Vec3::new(1.4, 1.4, -0.1),
            Vec3::new(1.6, 1.4, -0.1),
            Vec3::new(1.6, 1.6, -0.1),
            Vec3::new(1.4, 1.6, -0.1),
        ];
        let off_diagonal = on_diagonal.map(|v| Vec3::new(v.x, -v.y, v.z));

        assert!(polygon_intersects_obb(&on_diagonal, &rotated));
        assert!(!polygon_intersects_obb(&off_diagonal, &rotated));
    }

    #[test]
    fn test_degenerate_polygons() {
        assert!(!polygon_intersects_obb(&[], &unit_box()));
        assert!(polygon_intersects_obb(&[Vec3::new(0.5, 0.5, 0.5)], &unit_box()));
        assert!(!polygon_intersects_obb(&[Vec3::new(1.5, 0.0, 0.0)], &unit_box()));
        assert!(polygon_normal(&[Vec3::zeros(), Vec3::x(), Vec3::x() * 2.0]).is_none());
    }
}
