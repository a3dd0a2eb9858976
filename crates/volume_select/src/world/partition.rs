//! Partitions of the world and the nodes they place

use serde::{Deserialize, Serialize};

use crate::collision::shape::CollisionActor;
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::AABB;
use crate::world::node_type::NodeType;

/// Resource path suffixes of render meshes
const MESH_EXTENSIONS: [&str; 2] = [".mesh", ".w2mesh"];

/// A node definition shared by one or more placements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Node type tag
    pub node_type: NodeType,
    /// Referenced resource, e.g. a mesh
    pub resource_path: Option<String>,
    /// Collision actors, for collider nodes
    pub actors: Vec<CollisionActor>,
    /// Key of the partition's collision geometry
    pub partition_hash: Option<u64>,
    /// Human-readable name
    pub debug_name: Option<String>,
    /// Sub-object count the downstream consumer expects
    pub expected_sub_count: Option<u32>,
}

impl NodeEntry {
    /// Node of `node_type` with nothing attached
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            resource_path: None,
            actors: Vec::new(),
            partition_hash: None,
            debug_name: None,
            expected_sub_count: None,
        }
    }

    /// Attach a resource path
    #[must_use]
    pub fn with_resource(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    /// Attach collision actors and the geometry key they resolve against
    #[must_use]
    pub fn with_actors(mut self, actors: Vec<CollisionActor>, partition_hash: u64) -> Self {
        self.actors = actors;
        self.partition_hash = Some(partition_hash);
        self
    }

    /// Attach a debug name
    #[must_use]
    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }

    /// How the node is evaluated
    pub fn capability(&self) -> NodeCapability<'_> {
        if let Some(path) = self.resource_path.as_deref().filter(|path| is_mesh_resource(path)) {
            return NodeCapability::Mesh { resource_path: path };
        }
        match self.partition_hash {
            Some(partition_hash) if !self.actors.is_empty() => NodeCapability::Collider {
                actors: &self.actors,
                partition_hash,
            },
            _ => NodeCapability::PointLike,
        }
    }
}

/// Evaluation strategy of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeCapability<'a> {
    /// Placements of a render mesh
    Mesh {
        /// Mesh resource
        resource_path: &'a str,
    },
    /// Physics actors with shapes
    Collider {
        /// Actors to test
        actors: &'a [CollisionActor],
        /// Key for collision geometry lookups
        partition_hash: u64,
    },
    /// Anything else, tested by placement position
    PointLike,
}

/// Whether `path` names a render mesh
pub fn is_mesh_resource(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    MESH_EXTENSIONS.iter().any(|extension| lower.ends_with(extension))
}

/// One placement record of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDataEntry {
    /// Index into [`Partition::nodes`]
    pub node_index: usize,
    /// World placements; instanced nodes carry many
    pub transforms: Vec<Transform>,
    /// Precomputed world bounds, when the source data has them
    pub aabb_hint: Option<AABB>,
}

impl NodeDataEntry {
    /// Placement record for node `node_index`
    pub fn new(node_index: usize, transforms: Vec<Transform>) -> Self {
        Self {
            node_index,
            transforms,
            aabb_hint: None,
        }
    }

    /// World positions of every placement
    pub fn positions(&self) -> impl Iterator<Item = &Vec3> + '_ {
        self.transforms.iter().map(|transform| &transform.position)
    }
}

/// A loadable unit of world content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// Resource path identifying the partition
    pub path: String,
    /// Node definitions
    pub nodes: Vec<NodeEntry>,
    /// Placement records
    pub node_data: Vec<NodeDataEntry>,
}

impl Partition {
    /// Empty partition at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            nodes: Vec::new(),
            node_data: Vec::new(),
        }
    }

    /// Add a node and one placement record for it; returns the record index
    pub fn push(&mut self, node: NodeEntry, data: NodeDataEntry) -> usize {
        let node_index = self.nodes.len();
        self.nodes.push(node);
        self.node_data.push(NodeDataEntry { node_index, ..data });
        self.node_data.len() - 1
    }

    /// Node definition of a placement record
    pub fn node_of(&self, data: &NodeDataEntry) -> Option<&NodeEntry> {
        self.nodes.get(data.node_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shape::{CollisionShape, ShapeKind};

    #[test]
    fn test_capability_classification() {
        let mesh = NodeEntry::new(NodeType::Mesh).with_resource("base\\props\\crate.MESH");
        assert_eq!(
            mesh.capability(),
            NodeCapability::Mesh { resource_path: "base\\props\\crate.MESH" }
        );

        let actors = vec![CollisionActor {
            transform: Transform::identity(),
            shapes: vec![CollisionShape::new(ShapeKind::Box, Transform::identity())],
        }];
        let collider = NodeEntry::new(NodeType::Collision).with_actors(actors, 9);
        assert!(matches!(
            collider.capability(),
            NodeCapability::Collider { partition_hash: 9, .. }
        ));

        let mut no_hash = collider.clone();
        no_hash.partition_hash = None;
        assert_eq!(no_hash.capability(), NodeCapability::PointLike);

        let light = NodeEntry::new(NodeType::StaticLight).with_resource("base\\fx\\light.ent");
        assert_eq!(light.capability(), NodeCapability::PointLike);
    }

    #[test]
    fn test_push_links_records_to_nodes() {
        let mut partition = Partition::new("base\\worlds\\a.streamingsector");
        partition.push(
            NodeEntry::new(NodeType::StaticDecal),
            NodeDataEntry::new(99, vec![Transform::identity()]),
        );
        let index = partition.push(
            NodeEntry::new(NodeType::Entity),
            NodeDataEntry::new(99, vec![Transform::identity()]),
        );

        assert_eq!(index, 1);
        let node = partition.node_of(&partition.node_data[1]);
        assert_eq!(node.map(|node| &node.node_type), Some(&NodeType::Entity));
    }
}
