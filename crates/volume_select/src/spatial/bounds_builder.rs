//! Per-partition bounds used by the broad phase
//!
//! A partition's bounds are the union over its placement records of:
//! - mesh nodes: every submesh AABB carried through every placement
//! - collider nodes: the world box of every actor × shape pair
//! - anything else: the raw placement positions
//!
//! Missing meshes or collision geometry degrade to positions. A box that
//! collapsed to a single point is inflated by one unit per side.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::cache::{encode, normalize_key, ContentCache, Namespace};
use crate::collision::CollisionActor;
use crate::foundation::math::Vec3;
use crate::foundation::progress::{ProgressCallback, ProgressCounter};
use crate::geometry::AABB;
use crate::world::{ContentOrigin, ContentProvider, NodeCapability, NodeDataEntry, Partition};
use crate::pipeline::engine::EngineResult;

/// Which partitions a bounds build covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Every baseline and added partition
    All,
    /// Baseline partitions only
    BaselineOnly,
    /// Every added partition, overwriting existing bounds
    RebuildAdded,
    /// Added partitions that have no cached bounds yet
    MissingAdded,
}

impl BuildMode {
    /// Whether a finished build covers the whole baseline
    pub fn covers_baseline(self) -> bool {
        matches!(self, Self::All | Self::BaselineOnly)
    }
}

/// Outcome of one bounds build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Partitions scheduled
    pub scheduled: usize,
    /// Bounds queued for writing
    pub written: usize,
    /// Partitions without any placement
    pub empty: usize,
    /// Partitions the provider could not load
    pub missing: usize,
    /// Bounds that could not be encoded, queued or committed
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartitionOutcome {
    Written,
    Empty,
    Missing,
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
struct BoundsAccumulator(Option<AABB>);

impl BoundsAccumulator {
    fn add_point(&mut self, point: &Vec3) {
        self.0 = Some(match self.0 {
            Some(mut bounds) => {
                bounds.expand_point(point);
                bounds
            }
            None => AABB::new(*point, *point),
        });
    }

    fn add_aabb(&mut self, aabb: &AABB) {
        self.0 = Some(match self.0 {
            Some(bounds) => bounds.union(aabb),
            None => *aabb,
        });
    }

    fn finish(self) -> Option<AABB> {
        self.0
            .map(|bounds| if bounds.is_point() { bounds.inflate(1.0) } else { bounds })
    }
}

/// Bounds of one partition; `None` when it places nothing
pub fn partition_bounds(partition: &Partition, content: &dyn ContentProvider) -> Option<AABB> {
    let mut bounds = BoundsAccumulator::default();
    for data in &partition.node_data {
        let Some(node) = partition.node_of(data) else {
            warn!(
                "{}: placement refers to missing node {}, using its positions",
                partition.path, data.node_index
            );
            add_positions(&mut bounds, data);
            continue;
        };

        match node.capability() {
            NodeCapability::Mesh { resource_path } => match content.mesh(resource_path) {
                Some(mesh) => {
                    for placement in &data.transforms {
                        let matrix = placement.to_matrix();
                        for submesh in &mesh.submeshes {
                            bounds.add_aabb(&submesh.bounds.transformed(&matrix));
                        }
                    }
                }
                None => {
                    warn!("Mesh {resource_path} unavailable, bounding {} by positions", partition.path);
                    add_positions(&mut bounds, data);
                }
            },
            NodeCapability::Collider { actors, partition_hash } => {
                add_actors(&mut bounds, actors, partition_hash, content);
            }
            NodeCapability::PointLike => add_positions(&mut bounds, data),
        }
    }
    bounds.finish()
}

fn add_positions(bounds: &mut BoundsAccumulator, data: &NodeDataEntry) {
    for position in data.positions() {
        bounds.add_point(position);
    }
}

fn add_actors(
    bounds: &mut BoundsAccumulator,
    actors: &[CollisionActor],
    partition_hash: u64,
    content: &dyn ContentProvider,
) {
    for actor in actors {
        for shape in &actor.shapes {
            let geometry = if shape.kind.is_mesh() {
                let mesh = shape
                    .hash
                    .and_then(|shape_hash| content.collision_mesh(partition_hash, shape_hash));
                if mesh.is_none() {
                    warn!(
                        "Collision geometry {partition_hash}:{:?} unavailable, using the {} shape origin",
                        shape.hash,
                        shape.kind.name()
                    );
                }
                mesh
            } else {
                None
            };
            if let Some(aabb) = shape.world_bounds(&actor.transform, geometry.as_deref()) {
                bounds.add_aabb(&aabb);
            }
        }
    }
}

/// Fills the bounds namespaces of a [`ContentCache`]
pub struct BoundsBuilder {
    content: Arc<dyn ContentProvider>,
    cache: Arc<ContentCache>,
}

impl BoundsBuilder {
    /// Builder reading from `content` and writing into `cache`
    pub fn new(content: Arc<dyn ContentProvider>, cache: Arc<ContentCache>) -> Self {
        Self { content, cache }
    }

    fn scheduled_paths(&self, mode: BuildMode) -> EngineResult<Vec<(String, Namespace)>> {
        let mut baseline = BTreeSet::new();
        let mut added = BTreeSet::new();
        match mode {
            BuildMode::All => {
                baseline.extend(self.content.partition_paths(ContentOrigin::Baseline));
                added.extend(self.content.partition_paths(ContentOrigin::Added));
            }
            BuildMode::BaselineOnly => {
                baseline.extend(self.content.partition_paths(ContentOrigin::Baseline));
            }
            BuildMode::RebuildAdded => {
                added.extend(self.content.partition_paths(ContentOrigin::Added));
            }
            BuildMode::MissingAdded => {
                let known: BTreeSet<String> = self.cache.keys(Namespace::AddedBounds)?.into_iter().collect();
                added.extend(
                    self.content
                        .partition_paths(ContentOrigin::Added)
                        .into_iter()
                        .filter(|path| !known.contains(&normalize_key(path))),
                );
            }
        }

        Ok(baseline
            .into_iter()
            .map(|path| (path, Namespace::BaselineBounds))
            .chain(added.into_iter().map(|path| (path, Namespace::AddedBounds)))
            .collect())
    }

    fn build_one(&self, path: &str, namespace: Namespace) -> PartitionOutcome {
        let Some(partition) = self.content.partition(path) else {
            warn!("Partition {path} could not be loaded, no bounds built");
            return PartitionOutcome::Missing;
        };
        let Some(bounds) = partition_bounds(&partition, self.content.as_ref()) else {
            debug!("Partition {path} places nothing");
            return PartitionOutcome::Empty;
        };

        let queued = encode(&bounds).and_then(|bytes| self.cache.enqueue_write(path, bytes, namespace));
        match queued {
            Ok(()) => PartitionOutcome::Written,
            Err(error) => {
                warn!("Bounds of {path} could not be queued: {error}");
                PartitionOutcome::Failed
            }
        }
    }

    /// Build bounds for every partition `mode` covers
    ///
    /// Partitions are processed in parallel; a partition that fails is
    /// logged and counted, never fatal. Returns once every bound has been
    /// committed to the cache.
    pub fn build(&self, mode: BuildMode, progress: Option<ProgressCallback<'_>>) -> EngineResult<BuildSummary> {
        let started = Instant::now();
        let jobs = self.scheduled_paths(mode)?;
        info!("Building bounds for {} partitions ({mode:?})", jobs.len());

        let counter = ProgressCounter::new(jobs.len());
        let listening = self.cache.listen()?;
        let outcomes: Vec<PartitionOutcome> = jobs
            .par_iter()
            .map(|(path, namespace)| {
                let outcome = self.build_one(path, *namespace);
                let snapshot = counter.advance();
                if let Some(report) = progress {
                    report(snapshot);
                }
                outcome
            })
            .collect();
        let drained = listening.finish()?;

        let mut summary = BuildSummary {
            scheduled: jobs.len(),
            ..BuildSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                PartitionOutcome::Written => summary.written += 1,
                PartitionOutcome::Empty => summary.empty += 1,
                PartitionOutcome::Missing => summary.missing += 1,
                PartitionOutcome::Failed => summary.failed += 1,
            }
        }
        summary.written = summary.written.saturating_sub(drained.failed);
        summary.failed += drained.failed;

        if mode.covers_baseline() {
            self.cache.set_baseline_bounds_built(true)?;
        }
        info!(
            "Built bounds in {:.2?}: {} written, {} empty, {} missing, {} failed",
            started.elapsed(),
            summary.written,
            summary.empty,
            summary.missing,
            summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionShape, Mesh, ShapeKind, Submesh};
    use crate::config::CacheConfig;
    use crate::foundation::math::{Quat, Transform};
    use crate::foundation::progress::Progress;
    use crate::world::{MemoryContent, NodeEntry, NodeType};
    use approx::assert_relative_eq;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn unit_mesh() -> Mesh {
        Mesh::new(vec![Submesh::bounds_only(AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0)))])
    }

    #[test]
    fn test_mesh_placements_are_unioned() {
        let content = MemoryContent::new();
        content.insert_mesh(ContentOrigin::Baseline, "base\\rock.mesh", unit_mesh());
        let mut partition = Partition::new("p");
        partition.push(
            NodeEntry::new(NodeType::InstancedMesh).with_resource("base\\rock.mesh"),
            NodeDataEntry::new(
                0,
                vec![
                    Transform::from_position(Vec3::new(10.0, 0.0, 0.0)),
                    Transform::new(Vec3::new(-10.0, 0.0, 0.0), Quat::identity(), Vec3::repeat(2.0)),
                ],
            ),
        );

        let bounds = partition_bounds(&partition, &content).expect("bounds");
        assert_relative_eq!(bounds.min, Vec3::new(-12.0, -2.0, -2.0));
        assert_relative_eq!(bounds.max, Vec3::new(11.0, 2.0, 2.0));
    }

    #[test]
    fn test_collider_shapes_use_actor_and_shape_frames() {
        let actor = CollisionActor {
            transform: Transform::new(Vec3::new(0.0, 0.0, 10.0), Quat::identity(), Vec3::new(2.0, 1.0, 1.0)),
            shapes: vec![
                CollisionShape::new(ShapeKind::Box, Transform::new(Vec3::zeros(), Quat::identity(), Vec3::repeat(1.0))),
                CollisionShape::mesh(ShapeKind::ConvexMesh, Transform::from_position(Vec3::new(0.0, 50.0, 0.0)), 7),
            ],
        };
        let mut partition = Partition::new("p");
        partition.push(
            NodeEntry::new(NodeType::Collision).with_actors(vec![actor], 3),
            NodeDataEntry::new(0, vec![Transform::identity()]),
        );

        // Collision geometry 3:7 is missing: the mesh shape adds its origin only.
        let bounds = partition_bounds(&partition, &MemoryContent::new()).expect("bounds");
        assert_relative_eq!(bounds.min, Vec3::new(-2.0, -1.0, 9.0));
        assert_relative_eq!(bounds.max, Vec3::new(2.0, 50.0, 11.0));
    }

    #[test]
    fn test_single_point_is_inflated_and_empty_is_none() {
        let mut partition = Partition::new("p");
        assert!(partition_bounds(&partition, &MemoryContent::new()).is_none());

        partition.push(
            NodeEntry::new(NodeType::StaticLight),
            NodeDataEntry::new(0, vec![Transform::from_position(Vec3::new(5.0, 5.0, 5.0))]),
        );
        let bounds = partition_bounds(&partition, &MemoryContent::new()).expect("bounds");
        assert_eq!(bounds, AABB::new(Vec3::repeat(4.0), Vec3::repeat(6.0)));
    }

    #[test]
    fn test_missing_mesh_falls_back_to_positions() {
        let mut partition = Partition::new("p");
        partition.push(
            NodeEntry::new(NodeType::Mesh).with_resource("base\\gone.mesh"),
            NodeDataEntry::new(
                0,
                vec![
                    Transform::from_position(Vec3::zeros()),
                    Transform::from_position(Vec3::new(3.0, 4.0, 5.0)),
                ],
            ),
        );
        let bounds = partition_bounds(&partition, &MemoryContent::new()).expect("bounds");
        assert_eq!(bounds, AABB::new(Vec3::zeros(), Vec3::new(3.0, 4.0, 5.0)));
    }

    fn point_partition(path: &str, x: f32) -> Partition {
        let mut partition = Partition::new(path);
        partition.push(
            NodeEntry::new(NodeType::Entity),
            NodeDataEntry::new(0, vec![Transform::from_position(Vec3::new(x, 0.0, 0.0))]),
        );
        partition
    }

    #[test]
    fn test_build_modes_fill_their_namespaces() {
        let dir = tempdir().expect("temp dir");
        let cache = Arc::new(ContentCache::open(CacheConfig::at(dir.path())).expect("open"));
        let content = Arc::new(MemoryContent::new());
        content.insert_partition(ContentOrigin::Baseline, point_partition("base\\a", 0.0));
        content.insert_partition(ContentOrigin::Baseline, Partition::new("base\\empty"));
        content.insert_partition(ContentOrigin::Added, point_partition("mod\\b", 20.0));
        let builder = BoundsBuilder::new(Arc::clone(&content) as Arc<dyn ContentProvider>, Arc::clone(&cache));

        let seen = Mutex::new(Vec::new());
        let record = |progress: Progress| seen.lock().expect("progress lock").push(progress);
        let summary = builder.build(BuildMode::BaselineOnly, Some(&record)).expect("build");
        assert_eq!(summary.scheduled, 2);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.empty, 1);
        assert_eq!(seen.lock().expect("progress lock").len(), 2);
        assert!(cache.metadata().expect("metadata").baseline_bounds_built);
        assert_eq!(cache.keys(Namespace::BaselineBounds).expect("keys"), vec!["base\\a".to_string()]);
        assert!(cache.keys(Namespace::AddedBounds).expect("keys").is_empty());

        let summary = builder.build(BuildMode::MissingAdded, None).expect("build");
        assert_eq!(summary.written, 1);
        let stored: Option<AABB> = cache.get_decoded("mod\\b", Namespace::AddedBounds).expect("get");
        assert_eq!(stored, Some(AABB::new(Vec3::new(19.0, -1.0, -1.0), Vec3::new(21.0, 1.0, 1.0))));

        let summary = builder.build(BuildMode::MissingAdded, None).expect("build");
        assert_eq!(summary.scheduled, 0);
        let summary = builder.build(BuildMode::RebuildAdded, None).expect("build");
        assert_eq!(summary.scheduled, 1);
    }
}
