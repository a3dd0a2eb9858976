//! Selection pipeline
//!
//! A run narrows partitions through cached bounds, loads the survivors in
//! parallel and evaluates every placement record against the selection.
//! Results are aggregated per partition and sorted by path.

pub mod engine;
pub mod filter;
pub mod node;

pub use engine::{EngineError, EngineResult, SelectionEngine, SelectionReport, SelectionRequest};
pub use filter::{compile_patterns, NodeFilter};
pub use node::{evaluate_node, NodeContext};
