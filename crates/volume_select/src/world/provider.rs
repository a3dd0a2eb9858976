//! Source of partitions, meshes and collision geometry

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::collision::mesh::Mesh;
use crate::world::partition::Partition;

/// Where a piece of content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentOrigin {
    /// Shipped game content
    Baseline,
    /// Content layered on top of the baseline
    Added,
}

/// Read access to world content
///
/// Lookups return `None` when content is missing or cannot be parsed; the
/// caller decides how to degrade.
pub trait ContentProvider: Send + Sync {
    /// Parsed partition at `path`
    fn partition(&self, path: &str) -> Option<Arc<Partition>>;

    /// Render mesh at `path`
    fn mesh(&self, path: &str) -> Option<Arc<Mesh>>;

    /// Collision geometry of a mesh shape
    fn collision_mesh(&self, partition_hash: u64, shape_hash: u64) -> Option<Arc<Mesh>>;

    /// Every partition path of one origin
    fn partition_paths(&self, _origin: ContentOrigin) -> Vec<String> {
        Vec::new()
    }

    /// Origin of the partition or resource at `path`
    fn origin_of(&self, _path: &str) -> ContentOrigin {
        ContentOrigin::Baseline
    }
}

impl<T: ContentProvider + ?Sized> ContentProvider for Arc<T> {
    fn partition(&self, path: &str) -> Option<Arc<Partition>> {
        (**self).partition(path)
    }

    fn mesh(&self, path: &str) -> Option<Arc<Mesh>> {
        (**self).mesh(path)
    }

    fn collision_mesh(&self, partition_hash: u64, shape_hash: u64) -> Option<Arc<Mesh>> {
        (**self).collision_mesh(partition_hash, shape_hash)
    }

    fn partition_paths(&self, origin: ContentOrigin) -> Vec<String> {
        (**self).partition_paths(origin)
    }

    fn origin_of(&self, path: &str) -> ContentOrigin {
        (**self).origin_of(path)
    }
}

#[derive(Default)]
struct MemoryTables {
    partitions: HashMap<String, (ContentOrigin, Arc<Partition>)>,
    meshes: HashMap<String, (ContentOrigin, Arc<Mesh>)>,
    collision_meshes: HashMap<(u64, u64), Arc<Mesh>>,
}

/// In-memory content, for tools that already hold parsed data
///
/// Counts every lookup so callers can verify what was loaded.
#[derive(Default)]
pub struct MemoryContent {
    tables: RwLock<MemoryTables>,
    partition_loads: AtomicUsize,
    mesh_loads: AtomicUsize,
}

impl MemoryContent {
    /// Empty content set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a partition under its own path
    pub fn insert_partition(&self, origin: ContentOrigin, partition: Partition) {
        if let Ok(mut tables) = self.tables.write() {
            tables
                .partitions
                .insert(partition.path.clone(), (origin, Arc::new(partition)));
        }
    }

    /// Register a render mesh
    pub fn insert_mesh(&self, origin: ContentOrigin, path: impl Into<String>, mesh: Mesh) {
        if let Ok(mut tables) = self.tables.write() {
            tables.meshes.insert(path.into(), (origin, Arc::new(mesh)));
        }
    }

    /// Register collision geometry
    pub fn insert_collision_mesh(&self, partition_hash: u64, shape_hash: u64, mesh: Mesh) {
        if let Ok(mut tables) = self.tables.write() {
            tables
                .collision_meshes
                .insert((partition_hash, shape_hash), Arc::new(mesh));
        }
    }

    /// Number of `partition` calls, including misses
    pub fn partition_loads(&self) -> usize {
        self.partition_loads.load(Ordering::Relaxed)
    }

    /// Number of `mesh` calls, including misses
    pub fn mesh_loads(&self) -> usize {
        self.mesh_loads.load(Ordering::Relaxed)
    }
}

impl ContentProvider for MemoryContent {
    fn partition(&self, path: &str) -> Option<Arc<Partition>> {
        self.partition_loads.fetch_add(1, Ordering::Relaxed);
        let tables = self.tables.read().ok()?;
        tables.partitions.get(path).map(|(_, partition)| Arc::clone(partition))
    }

    fn mesh(&self, path: &str) -> Option<Arc<Mesh>> {
        self.mesh_loads.fetch_add(1, Ordering::Relaxed);
        let tables = self.tables.read().ok()?;
        tables.meshes.get(path).map(|(_, mesh)| Arc::clone(mesh))
    }

    fn collision_mesh(&self, partition_hash: u64, shape_hash: u64) -> Option<Arc<Mesh>> {
        let tables = self.tables.read().ok()?;
        tables
            .collision_meshes
            .get(&(partition_hash, shape_hash))
            .map(Arc::clone)
    }

    fn partition_paths(&self, origin: ContentOrigin) -> Vec<String> {
        let Ok(tables) = self.tables.read() else {
            return Vec::new();
        };
        let mut paths: Vec<String> = tables
            .partitions
            .iter()
            .filter(|(_, (partition_origin, _))| *partition_origin == origin)
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    fn origin_of(&self, path: &str) -> ContentOrigin {
        let Ok(tables) = self.tables.read() else {
            return ContentOrigin::Baseline;
        };
        tables
            .partitions
            .get(path)
            .map(|(origin, _)| *origin)
            .or_else(|| tables.meshes.get(path).map(|(origin, _)| *origin))
            .unwrap_or(ContentOrigin::Baseline)
    }
}
