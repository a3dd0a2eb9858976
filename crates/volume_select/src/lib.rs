//! # Volume Select
//!
//! Finds which objects of a large, partitioned 3D world fall inside an
//! oriented selection box, and reports them as whole nodes, individual
//! instances or individual physics actors.
//!
//! ## Features
//!
//! - **Exact geometry**: separating-axis tests for oriented boxes, polygons,
//!   capsules and spheres
//! - **Broad phase**: per-partition bounds built once and cached on disk
//! - **Parallel narrow phase**: partitions and nodes evaluated on rayon
//! - **Persistent cache**: coalesced background writes into append-only logs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use volume_select::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     volume_select::foundation::logging::init();
//!
//!     let content = MemoryContent::new();
//!     let engine = SelectionEngine::open(content, EngineConfig::default())?;
//!
//!     let builder = BoundsBuilder::new(Arc::clone(engine.content()), Arc::clone(engine.cache()));
//!     builder.build(BuildMode::All, None)?;
//!
//!     let volume = SelectionVolume::new(Vec3::zeros(), Vec3::repeat(10.0), Quat::identity());
//!     let report = engine.run(&SelectionRequest::new(volume), &CancellationToken::new())?;
//!     for partition in &report.results {
//!         println!("{}: {} nodes", partition.path, partition.nodes.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod geometry;
pub mod collision;
pub mod world;
pub mod cache;
pub mod spatial;
pub mod pipeline;

pub use pipeline::{EngineError, EngineResult, SelectionEngine, SelectionReport, SelectionRequest};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        EngineError, SelectionEngine, SelectionReport, SelectionRequest,
        cache::{CachedContent, ContentCache, Namespace},
        config::{CacheConfig, Config, EngineConfig, FilterConfig, FilterMode, MissingBoundsPolicy, SelectionConfig},
        foundation::{
            cancel::CancellationToken,
            math::{Quat, Transform, Vec3},
            progress::Progress,
        },
        geometry::{AABB, OBB},
        spatial::{BoundsBuilder, BuildMode, BuildSummary},
        world::{
            ContentOrigin, ContentProvider, MemoryContent, NodeDataEntry, NodeEntry, NodeRemovalResult,
            NodeType, NodeTypeMask, Partition, PartitionRemovalResult, SelectionVolume,
        },
    };
}

#[cfg(test)]
mod tests;
