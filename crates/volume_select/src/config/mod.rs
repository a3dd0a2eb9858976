//! Configuration system
//!
//! Every config type is plain serde data loadable from `.toml` or `.ron`
//! through the [`Config`] trait.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use serde::{Deserialize, Serialize};

use crate::pipeline::filter::compile_patterns;
use crate::world::NodeTypeMask;

/// On-disk syntax of a settings file, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl FileFormat {
    /// Format of `path`
    pub fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(extension) if extension.eq_ignore_ascii_case("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Settings that live in a `.toml` or `.ron` file
///
/// Fields missing from the file take their `Default` values.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read settings from `path`
    fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = FileFormat::of(path)?;
        let text = std::fs::read_to_string(path)?;
        match format {
            FileFormat::Toml => toml::from_str(&text).map_err(|error| ConfigError::Parse(error.to_string())),
            FileFormat::Ron => ron::from_str(&text).map_err(|error| ConfigError::Parse(error.to_string())),
        }
    }

    /// Write settings to `path`, replacing what is there
    fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match FileFormat::of(path)? {
            FileFormat::Toml => toml::to_string_pretty(self).map_err(|error| ConfigError::Serialize(error.to_string()))?,
            FileFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|error| ConfigError::Serialize(error.to_string()))?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Failure to read, write or accept a settings value
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read or written
    #[error("settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The file's text does not match the settings layout
    #[error("malformed settings: {0}")]
    Parse(String),

    /// The settings could not be rendered as text
    #[error("cannot write settings: {0}")]
    Serialize(String),

    /// The extension is neither `.toml` nor `.ron`
    #[error("{0} is not a .toml or .ron file")]
    UnsupportedFormat(String),

    /// A value is out of range or malformed
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cache store settings
    pub cache: CacheConfig,
    /// Selection run settings
    pub selection: SelectionConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()
    }
}

/// Cache store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the namespace logs and metadata
    pub directory: PathBuf,
    /// Version of the world content the cache was built from
    pub content_version: String,
    /// Version of the tool that wrote the cache
    pub tool_version: String,
    /// Sleep between write-drain cycles, in milliseconds
    pub drain_interval_ms: u64,
    /// Bound of the write queue; `None` leaves it unbounded
    pub write_queue_capacity: Option<usize>,
    /// Persist parsed partitions and meshes
    pub cache_content: bool,
    /// Also persist content from the added origin
    pub cache_added_content: bool,
    /// Resize once a namespace reaches this fraction of free disk space
    pub resize_free_space_ratio: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("cache"),
            content_version: String::new(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            drain_interval_ms: 1,
            write_queue_capacity: None,
            cache_content: true,
            cache_added_content: false,
            resize_free_space_ratio: 0.5,
        }
    }
}

impl Config for CacheConfig {}

impl CacheConfig {
    /// Default settings rooted at `directory`
    pub fn at(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Drain sleep interval
    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_queue_capacity == Some(0) {
            return Err(ConfigError::Invalid {
                field: "write_queue_capacity",
                reason: "a bounded queue needs room for at least one write".to_string(),
            });
        }
        if !(self.resize_free_space_ratio > 0.0 && self.resize_free_space_ratio.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "resize_free_space_ratio",
                reason: format!("expected a positive ratio, got {}", self.resize_free_space_ratio),
            });
        }
        Ok(())
    }
}

/// What happens to a candidate partition that has no cached bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingBoundsPolicy {
    /// Load and evaluate it anyway
    #[default]
    Evaluate,
    /// Leave it out
    Skip,
    /// Leave it out and report it for a bounds rebuild
    FlagForRebuild,
}

/// Selection run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Consider partitions from the added origin
    pub include_added_content: bool,
    /// Treatment of candidates without cached bounds
    pub missing_bounds_policy: MissingBoundsPolicy,
    /// Report foliage placements per instance, like instanced meshes
    pub foliage_as_instanced: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            include_added_content: true,
            missing_bounds_policy: MissingBoundsPolicy::default(),
            foliage_as_instanced: false,
        }
    }
}

impl Config for SelectionConfig {}

/// How the debug-name and resource-path pattern lists combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// A node passes when either list matches
    #[default]
    Or,
    /// A node passes only when both lists match
    And,
}

/// Per-run node filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Case-insensitive regular expressions searched in debug names
    pub debug_name_patterns: Vec<String>,
    /// Case-insensitive regular expressions searched in resource paths
    pub resource_path_patterns: Vec<String>,
    /// Combination of the two lists when both are set
    pub mode: FilterMode,
    /// Node types allowed in results
    pub node_types: NodeTypeMask,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            debug_name_patterns: Vec::new(),
            resource_path_patterns: Vec::new(),
            mode: FilterMode::default(),
            node_types: NodeTypeMask::all(),
        }
    }
}

impl Config for FilterConfig {}

impl FilterConfig {
    /// Check that every pattern compiles
    pub fn validate(&self) -> Result<(), ConfigError> {
        compile_patterns("debug_name_patterns", &self.debug_name_patterns)?;
        compile_patterns("resource_path_patterns", &self.resource_path_patterns)?;
        Ok(())
    }
}
