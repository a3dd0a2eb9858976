//! Narrow phase for a single placement record

use log::warn;

use crate::collision::{test_shape, CollisionActor, CollisionShape, ShapeTest};
use crate::foundation::logging::WarnOnce;
use crate::geometry::Containment;
use crate::pipeline::filter::NodeFilter;
use crate::world::{
    ContentProvider, NodeCapability, NodeDataEntry, NodeEntry, NodeRemovalResult, NodeType, Partition,
    SelectionVolume,
};

/// Everything a node evaluation reads
pub struct NodeContext<'a> {
    /// Source of meshes and collision geometry
    pub content: &'a dyn ContentProvider,
    /// Volume under test
    pub selection: &'a SelectionVolume,
    /// Name and type rejects
    pub filter: &'a NodeFilter,
    /// Once-per-type warnings for unknown node and shape types
    pub warnings: &'a WarnOnce,
    /// Report foliage per instance
    pub foliage_as_instanced: bool,
}

impl NodeContext<'_> {
    fn reports_instances(&self, node_type: &NodeType) -> bool {
        node_type.is_instanced() || (self.foliage_as_instanced && *node_type == NodeType::Foliage)
    }
}

/// Evaluate placement record `index` of `partition`
///
/// Returns `None` when the node is filtered out, unsupported, or clear of
/// the selection.
pub fn evaluate_node(context: &NodeContext<'_>, partition: &Partition, index: usize) -> Option<NodeRemovalResult> {
    let data = partition.node_data.get(index)?;
    let Some(node) = partition.node_of(data) else {
        warn!("{}: placement {index} refers to missing node {}", partition.path, data.node_index);
        return None;
    };

    if let NodeType::Other(name) = &node.node_type {
        context
            .warnings
            .warn(name, || format!("Skipping nodes of unsupported type {name}"));
        return None;
    }
    if !context.filter.allows_names(node) || !context.filter.allows_type(&node.node_type) {
        return None;
    }

    let flagged = |sub_indices: Option<Vec<usize>>, expected_count: Option<u32>| NodeRemovalResult {
        index,
        node_type: node.node_type.clone(),
        debug_name: node.debug_name.clone(),
        sub_indices,
        expected_count,
    };

    match node.capability() {
        NodeCapability::Mesh { resource_path } => {
            let hits = mesh_hits(context, node, data, resource_path)?;
            if context.reports_instances(&node.node_type) {
                Some(flagged(Some(hits), count(data.transforms.len())))
            } else {
                Some(flagged(None, node.expected_sub_count))
            }
        }
        NodeCapability::Collider { actors, partition_hash } => {
            let hits = actor_hits(context, actors, partition_hash);
            (!hits.is_empty()).then(|| flagged(Some(hits), count(actors.len())))
        }
        NodeCapability::PointLike => {
            let inside = data
                .positions()
                .any(|position| context.selection.obb().contains_point(position));
            inside.then(|| flagged(None, node.expected_sub_count))
        }
    }
}

fn count(len: usize) -> Option<u32> {
    u32::try_from(len).ok()
}

/// Placements of a mesh node that touch the selection; `None` when there are none
fn mesh_hits(
    context: &NodeContext<'_>,
    node: &NodeEntry,
    data: &NodeDataEntry,
    resource_path: &str,
) -> Option<Vec<usize>> {
    if let Some(hint) = &data.aabb_hint {
        if context.selection.obb().containment_aabb(hint) == Containment::Disjoint {
            return None;
        }
    }

    let check_all = context.reports_instances(&node.node_type);
    let hits = match context.content.mesh(resource_path) {
        Some(mesh) => mesh.hitting_placements(&data.transforms, context.selection, check_all),
        None => {
            warn!("Mesh {resource_path} unavailable, testing placement positions only");
            let mut hits = data
                .positions()
                .enumerate()
                .filter(|(_, position)| context.selection.obb().contains_point(position))
                .map(|(placement, _)| placement);
            if check_all {
                hits.collect()
            } else {
                hits.next().into_iter().collect()
            }
        }
    };
    (!hits.is_empty()).then_some(hits)
}

/// Indices of actors with at least one shape touching the selection
fn actor_hits(context: &NodeContext<'_>, actors: &[CollisionActor], partition_hash: u64) -> Vec<usize> {
    let geometry = |shape: &CollisionShape| {
        shape
            .hash
            .and_then(|shape_hash| context.content.collision_mesh(partition_hash, shape_hash))
    };

    actors
        .iter()
        .enumerate()
        .filter(|(_, actor)| {
            actor.shapes.iter().any(|shape| {
                match test_shape(shape, &actor.transform, context.selection, geometry) {
                    ShapeTest::Hit => true,
                    ShapeTest::Miss => false,
                    ShapeTest::Unsupported => {
                        let kind = shape.kind.name();
                        context
                            .warnings
                            .warn(kind, || format!("Skipping collision shapes of unsupported kind {kind}"));
                        false
                    }
                }
            })
        })
        .map(|(actor_index, _)| actor_index)
        .collect()
}
