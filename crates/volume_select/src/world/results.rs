//! Per-node and per-partition selection results

use serde::{Deserialize, Serialize};

use crate::world::node_type::NodeType;

/// A node flagged by the selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRemovalResult {
    /// Index of the placement record inside its partition
    pub index: usize,
    /// Type of the node
    pub node_type: NodeType,
    /// Debug name of the node, if any
    pub debug_name: Option<String>,
    /// Flagged instances or actors; `None` flags the whole node
    pub sub_indices: Option<Vec<usize>>,
    /// Number of instances or actors the node has in total
    pub expected_count: Option<u32>,
}

impl NodeRemovalResult {
    /// Whether only part of the node is flagged
    pub fn is_partial(&self) -> bool {
        match (&self.sub_indices, self.expected_count) {
            (Some(indices), Some(expected)) => indices.len() < expected as usize,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Flagged nodes of one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRemovalResult {
    /// Resource path of the partition
    pub path: String,
    /// Number of placement records the partition holds
    pub expected_nodes: usize,
    /// Flagged nodes, ordered by index; never empty
    pub nodes: Vec<NodeRemovalResult>,
}

impl PartitionRemovalResult {
    /// Result for `path`, or `None` when nothing was flagged
    pub fn from_nodes(
        path: impl Into<String>,
        expected_nodes: usize,
        mut nodes: Vec<NodeRemovalResult>,
    ) -> Option<Self> {
        if nodes.is_empty() {
            return None;
        }
        nodes.sort_by_key(|node| node.index);
        Some(Self {
            path: path.into(),
            expected_nodes,
            nodes,
        })
    }
}
