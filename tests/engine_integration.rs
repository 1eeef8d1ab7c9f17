//! Integration tests for the engine's public operations.
//!
//! These tests build small homes through the public API and walk through
//! the scenarios a tree editor produces: reparenting, root promotion,
//! source attachment, repeated drag-and-drop, and concurrent callers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spacetree::core::location::{LocationPatch, NewLocation};
use spacetree::core::modules::{OffEvent, SourceMode, SourceSpec};
use spacetree::core::types::LocationId;
use spacetree::engine::{
    DeletePolicy, Engine, EngineError, EngineOptions, ErrorKind, LocationClient, Operation,
    TopologyChange,
};

// =============================================================================
// Test Fixtures
// =============================================================================

fn id(s: &str) -> LocationId {
    LocationId::new(s).unwrap()
}

/// `home → {main-floor → {kitchen, living-room}, second-floor}`.
fn two_floor_home() -> Engine {
    let engine = Engine::new(EngineOptions::default());
    engine
        .create(NewLocation::new("Home", "house").with_id(id("home")))
        .unwrap();
    for floor in ["main-floor", "second-floor"] {
        engine
            .create(
                NewLocation::new(floor, "floor")
                    .with_id(id(floor))
                    .under(id("home")),
            )
            .unwrap();
    }
    for room in ["kitchen", "living-room"] {
        engine
            .create(
                NewLocation::new(room, "room")
                    .with_id(id(room))
                    .under(id("main-floor")),
            )
            .unwrap();
    }
    engine
}

fn child_ids(engine: &Engine, parent: &str) -> Vec<String> {
    engine
        .children(Some(&id(parent)))
        .unwrap()
        .into_iter()
        .map(|c| c.as_str().to_string())
        .collect()
}

fn assert_unique_listing(engine: &Engine) {
    let records = engine.list().unwrap();
    let ids: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids.len(), records.len(), "duplicate ids in listing");
    assert!(engine.verify().unwrap().ok());
}

// =============================================================================
// Move scenarios
// =============================================================================

#[test]
fn kitchen_round_trip_between_floors() {
    let engine = two_floor_home();

    let away = engine
        .move_location(&id("kitchen"), Some(&id("second-floor")), 0)
        .unwrap();
    assert_eq!(away.old_parent, Some(id("main-floor")));
    assert_eq!(child_ids(&engine, "main-floor"), ["living-room"]);
    assert_eq!(child_ids(&engine, "second-floor"), ["kitchen"]);

    let back = engine
        .move_location(&id("kitchen"), Some(&id("main-floor")), 1)
        .unwrap();
    assert_eq!(back.index, 1);
    assert_eq!(child_ids(&engine, "main-floor"), ["living-room", "kitchen"]);
    assert!(child_ids(&engine, "second-floor").is_empty());

    let living = engine.get(&id("living-room")).unwrap();
    let kitchen = engine.get(&id("kitchen")).unwrap();
    assert!(living.order_index < kitchen.order_index);
    assert_unique_listing(&engine);
}

#[test]
fn promoting_to_root_flags_explicit_root() {
    let engine = two_floor_home();

    let result = engine.move_location(&id("kitchen"), None, 0).unwrap();
    assert!(result.is_explicit_root);
    assert_eq!(result.index, 0);

    let kitchen = engine.get(&id("kitchen")).unwrap();
    assert_eq!(kitchen.parent_id, None);
    assert!(kitchen.is_explicit_root);

    let snapshot = engine.snapshot().unwrap();
    assert_eq!(snapshot.count(&id("kitchen")), 1);

    // Placing it back under a parent clears the flag.
    engine
        .move_location(&id("kitchen"), Some(&id("main-floor")), 0)
        .unwrap();
    assert!(!engine.get(&id("kitchen")).unwrap().is_explicit_root);
}

#[test]
fn repeated_reparenting_never_duplicates() {
    let engine = two_floor_home();

    for _ in 0..8 {
        engine
            .move_location(&id("kitchen"), Some(&id("living-room")), 0)
            .unwrap();
        engine
            .move_location(&id("kitchen"), Some(&id("main-floor")), 0)
            .unwrap();
        engine
            .move_location(&id("living-room"), Some(&id("kitchen")), 0)
            .unwrap();
        engine
            .move_location(&id("living-room"), Some(&id("main-floor")), 0)
            .unwrap();
        assert_unique_listing(&engine);
    }

    assert_eq!(child_ids(&engine, "main-floor"), ["living-room", "kitchen"]);
}

#[test]
fn same_move_twice_commits_once() {
    let engine = two_floor_home();
    let before = engine.version().unwrap();

    let first = engine
        .move_location(&id("kitchen"), Some(&id("second-floor")), 0)
        .unwrap();
    let tree = engine.tree().unwrap();
    let second = engine
        .move_location(&id("kitchen"), Some(&id("second-floor")), 0)
        .unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(engine.tree().unwrap(), tree);
    assert_eq!(engine.version().unwrap(), before + 1);
}

#[test]
fn stale_index_is_clamped() {
    let engine = two_floor_home();
    let result = engine
        .move_location(&id("kitchen"), Some(&id("second-floor")), 99)
        .unwrap();
    assert_eq!(result.index, 0);

    let result = engine.reorder(&id("living-room"), 42).unwrap();
    assert_eq!(result.index, 0);
}

#[test]
fn cycle_is_refused_and_tree_unchanged() {
    let engine = two_floor_home();
    let before = engine.snapshot().unwrap();

    let err = engine
        .move_location(&id("main-floor"), Some(&id("kitchen")), 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldCreateCycle);

    let after = engine.snapshot().unwrap();
    assert_eq!(before.version, after.version);
    assert_eq!(before.locations, after.locations);
}

#[test]
fn type_rules_apply_to_moves() {
    let engine = two_floor_home();

    let err = engine
        .move_location(&id("second-floor"), Some(&id("living-room")), 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHierarchy);

    let err = engine
        .move_location(&id("home"), Some(&id("main-floor")), 0)
        .unwrap_err();
    assert!(matches!(err, EngineError::WouldCreateCycle { .. }));
}

// =============================================================================
// Store scenarios
// =============================================================================

#[test]
fn delete_leaf_and_refuse_parent() {
    let engine = two_floor_home();

    let err = engine
        .delete(&id("main-floor"), DeletePolicy::LeafOnly)
        .unwrap_err();
    assert!(matches!(err, EngineError::HasChildren { count: 2, .. }));

    let removed = engine.delete(&id("kitchen"), DeletePolicy::LeafOnly).unwrap();
    assert_eq!(removed, vec![id("kitchen")]);
    assert_eq!(child_ids(&engine, "main-floor"), ["living-room"]);
    assert_eq!(engine.get(&id("living-room")).unwrap().order_index, 0);
}

#[test]
fn cascade_delete_removes_subtree() {
    let engine = two_floor_home();
    let removed = engine.delete(&id("main-floor"), DeletePolicy::Cascade).unwrap();

    assert_eq!(removed.len(), 3);
    assert_eq!(engine.list().unwrap().len(), 2);
    assert_eq!(child_ids(&engine, "home"), ["second-floor"]);
    assert_eq!(engine.get(&id("second-floor")).unwrap().order_index, 0);
}

#[test]
fn patch_fields_and_path() {
    let engine = two_floor_home();
    engine
        .update_fields(&id("kitchen"), LocationPatch::rename("Galley"))
        .unwrap();
    assert_eq!(engine.get(&id("kitchen")).unwrap().name, "Galley");

    let path = engine.path(&id("kitchen")).unwrap();
    assert_eq!(path, vec![id("home"), id("main-floor"), id("kitchen")]);
}

// =============================================================================
// Sources
// =============================================================================

#[test]
fn media_player_gets_defaults() {
    let engine = two_floor_home();

    let source = engine
        .attach_source(&id("living-room"), "occupancy", SourceSpec::new("media_player.tv"))
        .unwrap();
    assert_eq!(source.mode, SourceMode::AnyChange);
    assert_eq!(source.on_timeout, Some(1800));
    assert_eq!(source.off_event, OffEvent::None);

    let listed = engine.list_sources(&id("living-room"), "occupancy").unwrap();
    assert_eq!(listed, vec![source]);
}

#[test]
fn explicit_mode_wins_and_duplicates_are_refused() {
    let engine = two_floor_home();
    let spec = SourceSpec::new("media_player.tv").mode("state");

    let source = engine
        .attach_source(&id("living-room"), "occupancy", spec.clone())
        .unwrap();
    assert_eq!(source.mode, SourceMode::State);

    let err = engine
        .attach_source(&id("living-room"), "occupancy", spec)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateSource);

    let err = engine
        .attach_source(
            &id("kitchen"),
            "occupancy",
            SourceSpec::new("binary_sensor.door").mode("sometimes"),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMode);
}

#[test]
fn sources_follow_their_location() {
    let engine = two_floor_home();
    engine
        .attach_source(&id("kitchen"), "occupancy", SourceSpec::new("binary_sensor.motion"))
        .unwrap();
    engine
        .move_location(&id("kitchen"), Some(&id("second-floor")), 0)
        .unwrap();

    let sources = engine.list_sources(&id("kitchen"), "occupancy").unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].mode, SourceMode::State);

    engine
        .remove_source(&id("kitchen"), "occupancy", "binary_sensor.motion")
        .unwrap();
    assert!(engine
        .list_sources(&id("kitchen"), "occupancy")
        .unwrap()
        .is_empty());
}

// =============================================================================
// Notifications and client
// =============================================================================

#[test]
fn one_notification_per_commit() {
    let engine = two_floor_home();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    engine.add_listener(Arc::new(move |_: &TopologyChange| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    engine
        .move_location(&id("kitchen"), Some(&id("second-floor")), 0)
        .unwrap();
    engine
        .move_location(&id("kitchen"), Some(&id("second-floor")), 0)
        .unwrap();
    let _ = engine.move_location(&id("home"), Some(&id("kitchen")), 0);

    assert_eq!(seen.load(Ordering::SeqCst), 1);

    let latest = engine.subscribe().borrow().clone();
    assert_eq!(latest.operation, Operation::Move);
    assert!(latest.affected.contains(&id("kitchen")));
}

#[test]
fn client_cache_goes_stale_and_refreshes() {
    let engine = Arc::new(two_floor_home());
    let mut client = LocationClient::connect(Arc::clone(&engine)).unwrap();
    assert!(!client.is_stale());

    engine
        .create(
            NewLocation::new("Bedroom", "room")
                .with_id(id("bedroom"))
                .under(id("second-floor")),
        )
        .unwrap();
    assert!(client.is_stale());
    assert!(client.cached().get(&id("bedroom")).is_none());

    let snapshot = client.snapshot().unwrap();
    assert!(snapshot.get(&id("bedroom")).is_some());
    assert_eq!(client.version(), engine.version().unwrap());

    let result = client
        .request_move(&id("bedroom"), Some(&id("main-floor")), 0)
        .unwrap();
    assert_eq!(result.index, 0);
    assert_eq!(
        client.cached().get(&id("bedroom")).unwrap().parent_id,
        Some(id("main-floor"))
    );
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_movers_keep_tree_consistent() {
    let engine = two_floor_home();
    for room in ["bedroom", "office", "bath"] {
        engine
            .create(
                NewLocation::new(room, "room")
                    .with_id(id(room))
                    .under(id("second-floor")),
            )
            .unwrap();
    }

    let rooms = ["kitchen", "living-room", "bedroom", "office", "bath"];
    let floors = ["main-floor", "second-floor"];

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let engine = &engine;
            scope.spawn(move || {
                for step in 0..50 {
                    let room = id(rooms[(worker + step) % rooms.len()]);
                    let floor = id(floors[(worker * 3 + step) % floors.len()]);
                    match engine.move_location(&room, Some(&floor), step % 4) {
                        Ok(_) => {}
                        Err(err) => assert_eq!(err.kind(), ErrorKind::Busy, "{err}"),
                    }
                }
            });
        }

        scope.spawn(|| {
            for _ in 0..100 {
                if let Ok(snapshot) = engine.snapshot() {
                    let ids: HashSet<_> = snapshot.locations.iter().map(|r| &r.id).collect();
                    assert_eq!(ids.len(), 8);
                    assert_eq!(snapshot.locations.len(), 8);
                }
            }
        });
    });

    assert_unique_listing(&engine);
    let placed: usize = floors.iter().map(|f| child_ids(&engine, f).len()).sum();
    assert_eq!(placed, rooms.len());
}
