//! Geometry primitives and separating-axis intersection tests
//!
//! - [`AABB`]: axis-aligned boxes used for broad-phase rejects and cached bounds
//! - [`OBB`]: oriented boxes with exact box/box tests and a tri-state [`Containment`]
//! - [`polygon_intersects_obb`]: convex polygon against an oriented box

pub mod aabb;
pub mod obb;
pub mod sat;

pub use aabb::AABB;
pub use obb::{Containment, OBB};
pub use sat::{polygon_intersects_obb, polygon_normal, ProjectionInterval};
