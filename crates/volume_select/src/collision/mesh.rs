//! Render and collision meshes tested against a selection
//!
//! Meshes are stored in model space and transformed per placement while
//! testing. Each submesh is rejected by its transformed AABB first; only
//! survivors have their polygons moved to world space and run through the
//! polygon/box separating-axis test.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{transform_point, Mat4, Transform, Vec3};
use crate::geometry::{polygon_intersects_obb, AABB};
use crate::world::selection::SelectionVolume;

/// A mesh part with its own bounds and polygon soup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submesh {
    /// Model-space bounds
    pub bounds: AABB,
    /// Model-space vertex positions
    pub vertices: Vec<Vec3>,
    /// Per-polygon vertex indices; n-gons allowed
    pub polygons: Vec<Vec<u32>>,
}

impl Submesh {
    /// Submesh with bounds only; any overlap of its bounds counts as a hit
    pub fn bounds_only(bounds: AABB) -> Self {
        Self {
            bounds,
            vertices: Vec::new(),
            polygons: Vec::new(),
        }
    }

    /// Submesh from vertices and polygons, with bounds computed from the vertices
    pub fn from_polygons(vertices: Vec<Vec3>, polygons: Vec<Vec<u32>>) -> Self {
        let bounds = AABB::from_points(&vertices)
            .unwrap_or_else(|| AABB::new(Vec3::zeros(), Vec3::zeros()));
        Self {
            bounds,
            vertices,
            polygons,
        }
    }

    fn has_geometry(&self) -> bool {
        !self.vertices.is_empty() && !self.polygons.is_empty()
    }

    /// Whether any polygon, carried through `matrix`, touches the selection
    fn polygons_hit(&self, matrix: &Mat4, selection: &SelectionVolume) -> bool {
        let world: Vec<Vec3> = self
            .vertices
            .iter()
            .map(|vertex| transform_point(matrix, vertex))
            .collect();

        let mut polygon = Vec::new();
        self.polygons.iter().any(|indices| {
            polygon.clear();
            for index in indices {
                match world.get(*index as usize) {
                    Some(vertex) => polygon.push(*vertex),
                    None => return false,
                }
            }
            polygon_intersects_obb(&polygon, selection.obb())
        })
    }

    fn hit(&self, matrix: &Mat4, selection: &SelectionVolume) -> bool {
        if !self.bounds.transformed(matrix).intersects(selection.aabb()) {
            return false;
        }
        !self.has_geometry() || self.polygons_hit(matrix, selection)
    }
}

/// Mesh made of submeshes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    /// Parts of the mesh
    pub submeshes: Vec<Submesh>,
}

impl Mesh {
    /// Mesh from its parts
    pub fn new(submeshes: Vec<Submesh>) -> Self {
        Self { submeshes }
    }

    /// Model-space bounds of every submesh
    pub fn local_bounds(&self) -> Option<AABB> {
        self.submeshes
            .iter()
            .map(|submesh| submesh.bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Whether the mesh placed by `matrix` touches the selection
    pub fn hits_with_matrix(&self, matrix: &Mat4, selection: &SelectionVolume) -> bool {
        self.submeshes.iter().any(|submesh| submesh.hit(matrix, selection))
    }

    /// Indices of placements whose mesh touches the selection
    ///
    /// With `check_all` every hitting placement is listed once, in order;
    /// otherwise the search stops at the first hit.
    pub fn hitting_placements(
        &self,
        placements: &[Transform],
        selection: &SelectionVolume,
        check_all: bool,
    ) -> Vec<usize> {
        let mut hits = Vec::new();
        for (index, placement) in placements.iter().enumerate() {
            if self.hits_with_matrix(&placement.to_matrix(), selection) {
                hits.push(index);
                if !check_all {
                    break;
                }
            }
        }
        hits
    }
}
