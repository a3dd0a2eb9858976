//! Cache namespaces and key normalization

use serde::{Deserialize, Serialize};

use crate::world::ContentOrigin;

/// One of the four independent keyspaces of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Namespace {
    /// Parsed baseline partitions and meshes
    BaselineContent,
    /// Parsed added partitions and meshes
    AddedContent,
    /// Bounds of baseline partitions
    BaselineBounds,
    /// Bounds of added partitions
    AddedBounds,
}

impl Namespace {
    /// Every namespace, in storage order
    pub const ALL: [Self; 4] = [
        Self::BaselineContent,
        Self::AddedContent,
        Self::BaselineBounds,
        Self::AddedBounds,
    ];

    /// Content namespace of an origin
    pub fn content(origin: ContentOrigin) -> Self {
        match origin {
            ContentOrigin::Baseline => Self::BaselineContent,
            ContentOrigin::Added => Self::AddedContent,
        }
    }

    /// Bounds namespace of an origin
    pub fn bounds(origin: ContentOrigin) -> Self {
        match origin {
            ContentOrigin::Baseline => Self::BaselineBounds,
            ContentOrigin::Added => Self::AddedBounds,
        }
    }

    /// Position in [`Self::ALL`]
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::BaselineContent => 0,
            Self::AddedContent => 1,
            Self::BaselineBounds => 2,
            Self::AddedBounds => 3,
        }
    }

    /// Whether the namespace holds partition bounds
    pub fn is_bounds(self) -> bool {
        matches!(self, Self::BaselineBounds | Self::AddedBounds)
    }

    /// Log file name inside the cache directory
    pub fn file_name(self) -> &'static str {
        match self {
            Self::BaselineContent => "baseline_content.log",
            Self::AddedContent => "added_content.log",
            Self::BaselineBounds => "baseline_bounds.log",
            Self::AddedBounds => "added_bounds.log",
        }
    }
}

/// Normalized form of a resource path used as a cache key
///
/// Whitespace is trimmed, `/` becomes `\`, repeated separators collapse and
/// ASCII letters are lowercased, so different spellings of one archive path
/// share an entry.
pub fn normalize_key(path: &str) -> String {
    let mut key = String::with_capacity(path.len());
    let mut previous_separator = false;
    for character in path.trim().chars() {
        let is_separator = character == '\\' || character == '/';
        if is_separator {
            if !previous_separator {
                key.push('\\');
            }
        } else {
            key.push(character.to_ascii_lowercase());
        }
        previous_separator = is_separator;
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_folds_spellings() {
        assert_eq!(
            normalize_key("  Base\\\\Worlds//Exterior\\Sector_0_1.StreamingSector "),
            "base\\worlds\\exterior\\sector_0_1.streamingsector"
        );
        assert_eq!(normalize_key("a\\b"), normalize_key("A/B"));
    }

    #[test]
    fn test_origin_mapping() {
        assert_eq!(Namespace::bounds(ContentOrigin::Added), Namespace::AddedBounds);
        assert_eq!(Namespace::content(ContentOrigin::Baseline), Namespace::BaselineContent);
        assert!(Namespace::AddedBounds.is_bounds());
        assert!(!Namespace::AddedContent.is_bounds());
    }
}
