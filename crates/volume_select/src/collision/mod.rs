//! Collision shapes, meshes and the per-shape tests against a selection

pub mod evaluators;
pub mod mesh;
pub mod shape;

pub use evaluators::{test_shape, ShapeTest};
pub use mesh::{Mesh, Submesh};
pub use shape::{CollisionActor, CollisionShape, ShapeKind};
