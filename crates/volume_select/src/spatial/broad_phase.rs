//! Broad phase: pick the partitions worth loading
//!
//! Cached partition bounds are compared against the selection's world AABB.
//! Caller-supplied candidates are merged in; those without cached bounds
//! follow the configured [`MissingBoundsPolicy`].

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::cache::{normalize_key, CacheError, ContentCache, Namespace};
use crate::config::{MissingBoundsPolicy, SelectionConfig};
use crate::geometry::AABB;
use crate::world::{ContentOrigin, ContentProvider, SelectionVolume};

/// Partitions chosen for the narrow phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    /// Partitions to load and evaluate, sorted
    pub partitions: Vec<String>,
    /// Candidates left out because they have no cached bounds, sorted
    pub needs_bounds: Vec<String>,
}

/// Cached bounds keyed by normalized partition path
#[derive(Debug, Default)]
pub struct BoundsIndex {
    bounds: BTreeMap<String, Vec<AABB>>,
}

impl BoundsIndex {
    /// Read the baseline bounds, plus the added ones when `include_added`
    pub fn load(cache: &ContentCache, include_added: bool) -> Result<Self, CacheError> {
        let mut index = Self::default();
        let namespaces: &[Namespace] = if include_added {
            &[Namespace::BaselineBounds, Namespace::AddedBounds]
        } else {
            &[Namespace::BaselineBounds]
        };
        for namespace in namespaces {
            for (key, aabb) in cache.bounds(*namespace)? {
                index.insert(&key, aabb);
            }
        }
        Ok(index)
    }

    /// Record bounds for `path`
    pub fn insert(&mut self, path: &str, aabb: AABB) {
        self.bounds.entry(normalize_key(path)).or_default().push(aabb);
    }

    /// Number of partitions with bounds
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether no partition has bounds
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// `Some(overlapping)` for partitions with bounds, `None` otherwise
    pub fn overlaps(&self, path: &str, selection: &AABB) -> Option<bool> {
        self.bounds
            .get(&normalize_key(path))
            .map(|bounds| bounds.iter().any(|aabb| aabb.intersects(selection)))
    }

    /// Normalized paths of every partition whose bounds overlap `selection`
    pub fn overlapping<'a>(&'a self, selection: &'a AABB) -> impl Iterator<Item = &'a str> + 'a {
        self.bounds
            .iter()
            .filter(|(_, bounds)| bounds.iter().any(|aabb| aabb.intersects(selection)))
            .map(|(key, _)| key.as_str())
    }
}

/// Choose the partitions a selection run loads
///
/// Paths come back in the provider's spelling where the provider lists
/// them, since cache keys are normalized.
pub fn select_candidates(
    index: &BoundsIndex,
    content: &dyn ContentProvider,
    selection: &SelectionVolume,
    candidate_paths: &[String],
    config: &SelectionConfig,
) -> CandidateSet {
    let mut spellings: BTreeMap<String, String> = BTreeMap::new();
    let mut origins = vec![ContentOrigin::Baseline];
    if config.include_added_content {
        origins.push(ContentOrigin::Added);
    }
    for origin in origins {
        for path in content.partition_paths(origin) {
            spellings.entry(normalize_key(&path)).or_insert(path);
        }
    }
    for path in candidate_paths {
        spellings.insert(normalize_key(path), path.clone());
    }

    let window = selection.aabb();
    let mut chosen: BTreeSet<String> = index.overlapping(window).map(str::to_string).collect();
    let mut needs_bounds = BTreeSet::new();

    for path in candidate_paths {
        let key = normalize_key(path);
        match index.overlaps(path, window) {
            Some(true) => {
                chosen.insert(key);
            }
            Some(false) => debug!("Candidate {path} is outside the selection"),
            None => match config.missing_bounds_policy {
                MissingBoundsPolicy::Evaluate => {
                    chosen.insert(key);
                }
                MissingBoundsPolicy::Skip => debug!("Skipping {path}: no cached bounds"),
                MissingBoundsPolicy::FlagForRebuild => {
                    needs_bounds.insert(path.clone());
                }
            },
        }
    }

    if !needs_bounds.is_empty() {
        warn!("{} candidate partitions have no cached bounds", needs_bounds.len());
    }

    let mut partitions: Vec<String> = chosen
        .into_iter()
        .map(|key| spellings.get(&key).cloned().unwrap_or(key))
        .collect();
    partitions.sort();
    CandidateSet {
        partitions,
        needs_bounds: needs_bounds.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Vec3};
    use crate::world::{MemoryContent, Partition};

    fn index() -> BoundsIndex {
        let mut index = BoundsIndex::default();
        index.insert("base\\near", AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0)));
        index.insert("base\\far", AABB::new(Vec3::repeat(100.0), Vec3::repeat(101.0)));
        index
    }

    fn selection() -> SelectionVolume {
        SelectionVolume::new(Vec3::zeros(), Vec3::repeat(2.0), Quat::identity())
    }

    #[test]
    fn test_overlapping_bounds_are_chosen_in_provider_spelling() {
        let content = MemoryContent::new();
        content.insert_partition(ContentOrigin::Baseline, Partition::new("Base\\Near"));

        let chosen = select_candidates(&index(), &content, &selection(), &[], &SelectionConfig::default());
        assert_eq!(chosen.partitions, vec!["Base\\Near".to_string()]);
        assert!(chosen.needs_bounds.is_empty());
    }

    #[test]
    fn test_candidate_outside_its_bounds_is_dropped() {
        let candidates = vec!["base\\far".to_string()];
        let chosen = select_candidates(
            &index(),
            &MemoryContent::new(),
            &selection(),
            &candidates,
            &SelectionConfig::default(),
        );
        assert_eq!(chosen.partitions, vec!["base\\near".to_string()]);
    }

    #[test]
    fn test_missing_bounds_policies() {
        let candidates = vec!["base\\unknown".to_string()];
        let mut config = SelectionConfig::default();

        let evaluated = select_candidates(&index(), &MemoryContent::new(), &selection(), &candidates, &config);
        assert_eq!(evaluated.partitions, vec!["base\\near".to_string(), "base\\unknown".to_string()]);

        config.missing_bounds_policy = MissingBoundsPolicy::Skip;
        let skipped = select_candidates(&index(), &MemoryContent::new(), &selection(), &candidates, &config);
        assert_eq!(skipped.partitions, vec!["base\\near".to_string()]);
        assert!(skipped.needs_bounds.is_empty());

        config.missing_bounds_policy = MissingBoundsPolicy::FlagForRebuild;
        let flagged = select_candidates(&index(), &MemoryContent::new(), &selection(), &candidates, &config);
        assert_eq!(flagged.partitions, vec!["base\\near".to_string()]);
        assert_eq!(flagged.needs_bounds, candidates);
    }
}
