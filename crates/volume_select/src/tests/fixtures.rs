//! Shared world fixtures

use std::sync::Arc;

use tempfile::TempDir;

use crate::cache::ContentCache;
use crate::collision::{Mesh, Submesh};
use crate::config::{CacheConfig, SelectionConfig};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::geometry::AABB;
use crate::spatial::{BoundsBuilder, BuildMode};
use crate::world::{
    ContentOrigin, ContentProvider, MemoryContent, NodeDataEntry, NodeEntry, NodeType, Partition, SelectionVolume,
};
use crate::SelectionEngine;

pub const CUBE_MESH: &str = "base\\props\\cube.mesh";

/// Closed 2x2x2 cube centered at the origin
pub fn cube_mesh() -> Mesh {
    let vertices = AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0)).corners().to_vec();
    let polygons = vec![
        vec![0, 1, 3, 2],
        vec![4, 5, 7, 6],
        vec![0, 1, 5, 4],
        vec![2, 3, 7, 6],
        vec![0, 2, 6, 4],
        vec![1, 3, 7, 5],
    ];
    Mesh::new(vec![Submesh::from_polygons(vertices, polygons)])
}

pub fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vec3::new(x, y, z))
}

pub fn selection_box(center: Vec3, half: f32) -> SelectionVolume {
    SelectionVolume::new(center, Vec3::repeat(half), Quat::identity())
}

/// Partition holding one node with the given placements
pub fn partition_with(path: &str, node: NodeEntry, transforms: Vec<Transform>) -> Partition {
    let mut partition = Partition::new(path);
    partition.push(node, NodeDataEntry::new(0, transforms));
    partition
}

pub fn cube_node(node_type: NodeType) -> NodeEntry {
    NodeEntry::new(node_type).with_resource(CUBE_MESH)
}

pub fn cache_config(dir: &TempDir) -> CacheConfig {
    CacheConfig {
        content_version: "test-content".to_string(),
        tool_version: "test-tool".to_string(),
        ..CacheConfig::at(dir.path().join("cache"))
    }
}

/// Content, cache and engine wired together without read-through caching
pub struct TestWorld {
    pub dir: TempDir,
    pub content: Arc<MemoryContent>,
    pub cache: Arc<ContentCache>,
}

impl TestWorld {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = Arc::new(ContentCache::open(cache_config(&dir)).expect("open cache"));
        let content = Arc::new(MemoryContent::new());
        content.insert_mesh(ContentOrigin::Baseline, CUBE_MESH, cube_mesh());
        Self { dir, content, cache }
    }

    pub fn add(&self, origin: ContentOrigin, partition: Partition) {
        self.content.insert_partition(origin, partition);
    }

    pub fn provider(&self) -> Arc<dyn ContentProvider> {
        Arc::clone(&self.content) as Arc<dyn ContentProvider>
    }

    pub fn build_bounds(&self) {
        BoundsBuilder::new(self.provider(), Arc::clone(&self.cache))
            .build(BuildMode::All, None)
            .expect("build bounds");
    }

    pub fn engine(&self, config: SelectionConfig) -> SelectionEngine {
        SelectionEngine::new(self.provider(), Arc::clone(&self.cache), config)
    }
}
