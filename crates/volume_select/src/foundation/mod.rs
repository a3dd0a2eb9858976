//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and placement transforms
//! - Logging setup
//! - Progress reporting and cancellation for long-running jobs

pub mod math;
pub mod logging;
pub mod progress;
pub mod cancel;
