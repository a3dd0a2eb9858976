//! Axis-aligned bounding boxes

use serde::{Deserialize, Serialize};

use crate::foundation::math::{transform_point, Mat4, Vec3};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box holding every point, `None` for an empty iterator
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut aabb = Self::new(first, first);
        for point in points {
            aabb.expand_point(point);
        }
        Some(aabb)
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow to include `point`
    pub fn expand_point(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Smallest box holding both boxes
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grow by `amount` on every side
    #[must_use]
    pub fn inflate(&self, amount: f32) -> Self {
        let delta = Vec3::repeat(amount);
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Whether the box has collapsed to a single point
    pub fn is_point(&self) -> bool {
        self.min == self.max
    }

    /// The eight corners, min corner first
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// World-space box enclosing this box after an affine transform
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|corner| transform_point(matrix, &corner));
        let mut aabb = Self::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            aabb.expand_point(corner);
        }
        aabb
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Interval overlap on all three axes; touching faces count
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Sphere test by closest-point distance
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        let closest = center.sup(&self.min).inf(&self.max);
        (closest - center).norm_squared() <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Transform};
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_contains_point() {
        let aabb = AABB::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        assert!(aabb.contains_point(&Vec3::zeros()));
        assert!(aabb.contains_point(&Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(&Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let aabb1 = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let aabb3 = AABB::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));
        let touching = AABB::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 2.0));

        assert!(aabb1.intersects(&aabb2));
        assert!(!aabb1.intersects(&aabb3));
        assert!(aabb1.intersects(&touching));
    }

    #[test]
    fn test_transformed_rotated_box_grows() {
        let unit = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0));
        let rotated = Transform::from_position_rotation(
            Vec3::new(5.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4),
        );
        let world = unit.transformed(&rotated.to_matrix());

        let half_diagonal = std::f32::consts::SQRT_2;
        assert_relative_eq!(world.max.x, 5.0 + half_diagonal, epsilon = 1e-5);
        assert_relative_eq!(world.min.y, -half_diagonal, epsilon = 1e-5);
        assert_relative_eq!(world.max.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_from_points_and_inflate() {
        assert!(AABB::from_points(std::iter::empty()).is_none());

        let single = AABB::from_points(&[Vec3::new(3.0, 3.0, 3.0)]);
        let single = single.map(|aabb| {
            assert!(aabb.is_point());
            aabb.inflate(1.0)
        });
        assert_eq!(
            single,
            Some(AABB::new(Vec3::repeat(2.0), Vec3::repeat(4.0)))
        );
    }

    #[test]
    fn test_sphere_touching_corner_region() {
        let aabb = AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0));
        assert!(aabb.intersects_sphere(&Vec3::new(2.0, 0.0, 0.0), 1.0));
        assert!(!aabb.intersects_sphere(&Vec3::new(2.0, 2.0, 0.0), 1.0));
    }
}
