//! Spatial broad phase
//!
//! Partition bounds are built once per content version by [`BoundsBuilder`]
//! and stored in the cache; [`select_candidates`] compares them against a
//! selection so only overlapping partitions get loaded.

pub mod bounds_builder;
pub mod broad_phase;

pub use bounds_builder::{partition_bounds, BoundsBuilder, BuildMode, BuildSummary};
pub use broad_phase::{select_candidates, BoundsIndex, CandidateSet};
