//! World data model: partitions, nodes, selections and results

pub mod node_type;
pub mod partition;
pub mod provider;
pub mod results;
pub mod selection;

pub use node_type::{NodeType, NodeTypeMask};
pub use partition::{is_mesh_resource, NodeCapability, NodeDataEntry, NodeEntry, Partition};
pub use provider::{ContentOrigin, ContentProvider, MemoryContent};
pub use results::{NodeRemovalResult, PartitionRemovalResult};
pub use selection::SelectionVolume;
