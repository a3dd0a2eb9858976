//! Cheap per-node rejects applied before any geometry test

use regex::{Regex, RegexBuilder};

use crate::config::{ConfigError, FilterConfig, FilterMode};
use crate::world::{NodeEntry, NodeType, NodeTypeMask};

/// Compile `patterns` as unanchored, case-insensitive regular expressions
pub fn compile_patterns(field: &'static str, patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|error| ConfigError::Invalid {
                    field,
                    reason: format!("pattern {pattern:?}: {error}"),
                })
        })
        .collect()
}

/// Compiled [`FilterConfig`]
#[derive(Debug, Clone)]
pub struct NodeFilter {
    debug_names: Vec<Regex>,
    resource_paths: Vec<Regex>,
    mode: FilterMode,
    node_types: NodeTypeMask,
}

impl Default for NodeFilter {
    fn default() -> Self {
        Self {
            debug_names: Vec::new(),
            resource_paths: Vec::new(),
            mode: FilterMode::default(),
            node_types: NodeTypeMask::all(),
        }
    }
}

impl NodeFilter {
    /// Compile the patterns of `config`
    pub fn new(config: &FilterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            debug_names: compile_patterns("debug_name_patterns", &config.debug_name_patterns)?,
            resource_paths: compile_patterns("resource_path_patterns", &config.resource_path_patterns)?,
            mode: config.mode,
            node_types: config.node_types,
        })
    }

    /// Whether nodes of `node_type` may be flagged; unknown types never are
    pub fn allows_type(&self, node_type: &NodeType) -> bool {
        node_type
            .mask()
            .is_some_and(|flag| self.node_types.contains(flag))
    }

    fn any_match(patterns: &[Regex], value: Option<&str>) -> bool {
        value.is_some_and(|value| patterns.iter().any(|pattern| pattern.is_match(value)))
    }

    /// Whether the node's name and resource pass the pattern lists
    ///
    /// An empty list places no constraint. With both lists set, [`FilterMode`]
    /// decides whether one or both must match.
    pub fn allows_names(&self, node: &NodeEntry) -> bool {
        let by_name = (!self.debug_names.is_empty())
            .then(|| Self::any_match(&self.debug_names, node.debug_name.as_deref()));
        let by_path = (!self.resource_paths.is_empty())
            .then(|| Self::any_match(&self.resource_paths, node.resource_path.as_deref()));

        match (by_name, by_path) {
            (None, None) => true,
            (Some(matched), None) | (None, Some(matched)) => matched,
            (Some(name), Some(path)) => match self.mode {
                FilterMode::Or => name || path,
                FilterMode::And => name && path,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(patterns: &[&str]) -> NodeFilter {
        let config = FilterConfig {
            debug_name_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            ..FilterConfig::default()
        };
        NodeFilter::new(&config).expect("valid patterns")
    }

    #[test]
    fn test_patterns_are_unanchored_case_insensitive_regexes() {
        let named = |name: &str| NodeEntry::new(NodeType::Entity).with_debug_name(name);

        assert!(names(&["lamp"]).allows_names(&named("street_LAMP_01")));
        assert!(names(&[r"lamp_\d+"]).allows_names(&named("lamp_01")));
        assert!(!names(&[r"^lamp_\d+$"]).allows_names(&named("lamp_a1")));
        assert!(names(&["a|b"]).allows_names(&named("a")));
        assert!(names(&["[xyz]_door"]).allows_names(&named("Y_Door")));
        assert!(!names(&["crate"]).allows_names(&named("barrel")));
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let config = FilterConfig {
            resource_path_patterns: vec!["*.mesh".to_string()],
            ..FilterConfig::default()
        };
        assert!(matches!(
            NodeFilter::new(&config),
            Err(ConfigError::Invalid { field: "resource_path_patterns", .. })
        ));
    }

    fn node(name: &str, path: &str) -> NodeEntry {
        NodeEntry::new(NodeType::Mesh)
            .with_debug_name(name)
            .with_resource(path)
    }

    #[test]
    fn test_or_and_modes() {
        let mut config = FilterConfig {
            debug_name_patterns: vec!["^door".to_string()],
            resource_path_patterns: vec![r"\.mesh$".to_string()],
            ..FilterConfig::default()
        };
        let door_entity = node("door_01", "base\\door.ent");
        let crate_mesh = node("crate", "base\\crate.mesh");

        let or = NodeFilter::new(&config).expect("valid patterns");
        assert!(or.allows_names(&door_entity));
        assert!(or.allows_names(&crate_mesh));

        config.mode = FilterMode::And;
        let and = NodeFilter::new(&config).expect("valid patterns");
        assert!(!and.allows_names(&door_entity));
        assert!(and.allows_names(&node("door_02", "base\\door.mesh")));
    }

    #[test]
    fn test_missing_name_fails_a_name_filter() {
        let unnamed = NodeEntry::new(NodeType::Entity);
        assert!(!names(&[".*"]).allows_names(&unnamed));
        assert!(NodeFilter::default().allows_names(&unnamed));
    }

    #[test]
    fn test_type_mask() {
        let config = FilterConfig {
            node_types: NodeTypeMask::all() - NodeTypeMask::FOLIAGE,
            ..FilterConfig::default()
        };
        let filter = NodeFilter::new(&config).expect("no patterns");
        assert!(!filter.allows_type(&NodeType::Foliage));
        assert!(filter.allows_type(&NodeType::Mesh));
        assert!(!filter.allows_type(&NodeType::Other("worldFancyNode".into())));
    }
}
