//! Cache behavior across runs and processes

use std::sync::Arc;

use super::fixtures::*;
use crate::cache::{ContentCache, Namespace};
use crate::config::{CacheConfig, EngineConfig, FilterConfig, SelectionConfig};
use crate::foundation::math::Vec3;
use crate::spatial::{BoundsBuilder, BuildMode};
use crate::world::{ContentOrigin, NodeType};
use crate::SelectionEngine;

fn cube_world() -> TestWorld {
    let world = TestWorld::new();
    world.add(
        ContentOrigin::Baseline,
        partition_with("base\\near.streamingsector", cube_node(NodeType::Mesh), vec![at(0.0, 0.0, 0.0)]),
    );
    world.add(
        ContentOrigin::Baseline,
        partition_with("base\\far.streamingsector", cube_node(NodeType::Mesh), vec![at(500.0, 0.0, 0.0)]),
    );
    world
}

#[test]
fn test_bounds_survive_reopen() {
    let world = cube_world();
    world.build_bounds();

    let reopened = ContentCache::open(cache_config(&world.dir)).expect("reopen");
    assert!(reopened.metadata().expect("metadata").baseline_bounds_built);
    assert_eq!(reopened.bounds(Namespace::BaselineBounds).expect("bounds").len(), 2);
}

#[test]
fn test_imported_bounds_drive_selection_without_rebuild() {
    let source = cube_world();
    source.build_bounds();
    let dump = source.dir.path().join("bounds.bin");
    assert_eq!(source.cache.export_bounds(&dump).expect("export"), 2);

    let target = cube_world();
    assert_eq!(target.cache.import_bounds(&dump).expect("import"), 2);
    assert!(target.cache.metadata().expect("metadata").baseline_bounds_built);

    let results = target
        .engine(SelectionConfig::default())
        .evaluate(&selection_box(Vec3::zeros(), 2.0), &[], &FilterConfig::default())
        .expect("evaluate");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, "base\\near.streamingsector");
    assert_eq!(target.content.partition_loads(), 1);
}

#[test]
fn test_engine_reads_partitions_through_the_cache() {
    let world = cube_world();
    // Separate from the cache TestWorld opened.
    let config = EngineConfig {
        cache: CacheConfig {
            directory: world.dir.path().join("engine-cache"),
            ..cache_config(&world.dir)
        },
        ..EngineConfig::default()
    };
    let engine = SelectionEngine::open(Arc::clone(&world.content), config).expect("open engine");

    BoundsBuilder::new(Arc::clone(engine.content()), Arc::clone(engine.cache()))
        .build(BuildMode::All, None)
        .expect("build bounds");
    assert_eq!(world.content.partition_loads(), 2);

    let volume = selection_box(Vec3::zeros(), 2.0);
    for _ in 0..2 {
        let results = engine.evaluate(&volume, &[], &FilterConfig::default()).expect("evaluate");
        assert_eq!(results.len(), 1);
    }
    assert_eq!(world.content.partition_loads(), 2);
    assert!(engine
        .cache()
        .contains("base\\near.streamingsector", Namespace::BaselineContent)
        .expect("contains"));
}

#[test]
fn test_version_change_discards_bounds() {
    let world = cube_world();
    world.build_bounds();

    let bumped = CacheConfig {
        content_version: "next-content".to_string(),
        ..cache_config(&world.dir)
    };
    let reopened = ContentCache::open(bumped).expect("reopen");
    assert!(!reopened.metadata().expect("metadata").baseline_bounds_built);
    assert!(reopened.bounds(Namespace::BaselineBounds).expect("bounds").is_empty());
}

#[test]
fn test_clearing_bounds_falls_back_to_candidates() {
    let world = cube_world();
    world.build_bounds();
    world.cache.clear(Namespace::BaselineBounds, false).expect("clear");

    let engine = world.engine(SelectionConfig::default());
    let volume = selection_box(Vec3::zeros(), 2.0);
    assert!(engine.evaluate(&volume, &[], &FilterConfig::default()).expect("evaluate").is_empty());

    let candidates = vec!["base\\near.streamingsector".to_string()];
    let results = engine.evaluate(&volume, &candidates, &FilterConfig::default()).expect("evaluate");
    assert_eq!(results.len(), 1);
}

#[test]
fn test_rebuild_added_leaves_baseline_alone() {
    let world = cube_world();
    world.build_bounds();
    world.add(
        ContentOrigin::Added,
        partition_with("mod\\extra.streamingsector", cube_node(NodeType::Mesh), vec![at(3.0, 0.0, 0.0)]),
    );

    let summary = BoundsBuilder::new(world.provider(), Arc::clone(&world.cache))
        .build(BuildMode::RebuildAdded, None)
        .expect("build");
    assert_eq!(summary.scheduled, 1);
    assert_eq!(world.cache.bounds(Namespace::AddedBounds).expect("bounds").len(), 1);
    assert_eq!(world.cache.bounds(Namespace::BaselineBounds).expect("bounds").len(), 2);

    let results = world
        .engine(SelectionConfig::default())
        .evaluate(&selection_box(Vec3::new(3.0, 0.0, 0.0), 1.5), &[], &FilterConfig::default())
        .expect("evaluate");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, "mod\\extra.streamingsector");
}
