//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn, LevelFilter};

use std::collections::HashSet;
use std::sync::Mutex;

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a fixed default level
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}

/// Emits a warning at most once per distinct key
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: Mutex<HashSet<String>>,
}

impl WarnOnce {
    /// Create an empty set of reported keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` if `key` has not been reported yet; returns whether it logged
    pub fn warn(&self, key: &str, message: impl FnOnce() -> String) -> bool {
        let first = match self.seen.lock() {
            Ok(mut seen) => seen.insert(key.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(key.to_string()),
        };
        if first {
            log::warn!("{}", message());
        }
        first
    }

    /// Keys reported so far
    pub fn reported(&self) -> Vec<String> {
        let seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut keys: Vec<String> = seen.iter().cloned().collect();
        keys.sort();
        keys
    }
}
