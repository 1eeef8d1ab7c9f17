//! Integration tests for the `st` binary.
//!
//! These tests drive the real binary against a temporary data directory
//! and check its output, exit status, and what ends up on disk.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

// =============================================================================
// Test Fixtures
// =============================================================================

/// A temporary home with an isolated data dir and config path.
struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// `st` with `--data-dir` pointed into the temp dir.
    fn st(&self) -> Command {
        let mut cmd = Command::cargo_bin("st").expect("binary builds");
        cmd.env("HOME", self.dir.path())
            .env("SPACETREE_CONFIG", self.dir.child("config.toml").path())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("SPACETREE_LOG")
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.dir.child("data").path());
        cmd
    }

    fn run(&self, args: &[&str]) {
        self.st().args(args).assert().success();
    }

    /// `home → {main-floor → {kitchen, living-room}, second-floor}`.
    fn seed(&self) {
        self.run(&["create", "Home", "--type", "house", "--id", "home"]);
        self.run(&["create", "Main Floor", "-t", "floor", "--id", "main-floor", "--parent", "home"]);
        self.run(&["create", "Second Floor", "-t", "floor", "--id", "second-floor", "--parent", "home"]);
        self.run(&["create", "Kitchen", "-t", "room", "--id", "kitchen", "--parent", "main-floor"]);
        self.run(&["create", "Living Room", "-t", "room", "--id", "living-room", "--parent", "main-floor"]);
    }

    fn store_json(&self) -> serde_json::Value {
        let path = self.dir.child("data").child("locations.json");
        let text = std::fs::read_to_string(path.path()).expect("store exists");
        serde_json::from_str(&text).expect("store parses")
    }
}

// =============================================================================
// Create and query
// =============================================================================

#[test]
fn empty_store_lists_nothing() {
    let env = TestEnv::new();
    env.st()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No locations."));
}

#[test]
fn create_persists_and_lists() {
    let env = TestEnv::new();
    env.seed();

    env.st()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kitchen [room] (kitchen)"))
        .stdout(predicate::str::contains("Home [house] (home)"));

    env.dir
        .child("data")
        .child("locations.json")
        .assert(predicate::path::exists());
    assert_eq!(env.store_json()["locations"].as_array().unwrap().len(), 5);
}

#[test]
fn quiet_create_prints_generated_id() {
    let env = TestEnv::new();
    let output = env
        .st()
        .args(["-q", "create", "Garden", "--type", "grounds"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let id = String::from_utf8(output.stdout).unwrap().trim().to_string();
    assert!(!id.is_empty());
    env.st()
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Garden"));
}

#[test]
fn tree_renders_nesting() {
    let env = TestEnv::new();
    env.seed();

    env.st()
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("├── Main Floor"))
        .stdout(predicate::str::contains("└── Living Room"));
}

#[test]
fn show_json_and_path() {
    let env = TestEnv::new();
    env.seed();

    let output = env.st().args(["show", "kitchen", "--json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["parent_id"], "main-floor");
    assert_eq!(json["type"], "room");

    env.st()
        .args(["path", "kitchen"])
        .assert()
        .success()
        .stdout("home / main-floor / kitchen\n");
}

#[test]
fn invalid_type_fails() {
    let env = TestEnv::new();
    env.st()
        .args(["create", "Moat", "--type", "castle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("castle"));
}

#[test]
fn floor_under_room_is_refused() {
    let env = TestEnv::new();
    env.seed();
    env.st()
        .args(["create", "Attic", "-t", "floor", "--parent", "kitchen"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be placed under"));
}

// =============================================================================
// Moves
// =============================================================================

#[test]
fn move_and_back() {
    let env = TestEnv::new();
    env.seed();

    env.st()
        .args(["move", "kitchen", "--parent", "second-floor", "--index", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved kitchen under second-floor at position 0"));

    env.st()
        .args(["move", "kitchen", "--parent", "main-floor", "--index", "1"])
        .assert()
        .success();

    let output = env.st().args(["list", "--json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kitchens: Vec<_> = json["locations"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|l| l["id"] == "kitchen")
        .collect();
    assert_eq!(kitchens.len(), 1);
    assert_eq!(kitchens[0]["parent_id"], "main-floor");
    assert_eq!(kitchens[0]["order_index"], 1);
}

#[test]
fn move_to_root_and_repeat() {
    let env = TestEnv::new();
    env.seed();

    env.st()
        .args(["move", "kitchen", "--root", "--index", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("to root"));
    env.st()
        .args(["move", "kitchen", "--root", "--index", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kitchen unchanged"));

    env.st()
        .args(["show", "kitchen"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[root]").or(predicate::str::contains("explicit")));
}

#[test]
fn cycle_is_reported() {
    let env = TestEnv::new();
    env.seed();
    let before = env.store_json()["fingerprint"].clone();

    env.st()
        .args(["move", "main-floor", "--parent", "kitchen"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));

    assert_eq!(env.store_json()["fingerprint"], before);
}

#[test]
fn reorder_within_group() {
    let env = TestEnv::new();
    env.seed();
    env.run(&["reorder", "living-room", "0"]);

    let output = env.st().args(["list", "--json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let living = json["locations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["id"] == "living-room")
        .unwrap()
        .clone();
    assert_eq!(living["order_index"], 0);
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn delete_requires_cascade_for_parents() {
    let env = TestEnv::new();
    env.seed();

    env.st()
        .args(["delete", "main-floor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("child location"));

    env.run(&["delete", "main-floor", "--cascade"]);
    assert_eq!(env.store_json()["locations"].as_array().unwrap().len(), 2);

    env.st().args(["show", "kitchen"]).assert().failure();
}

// =============================================================================
// Sources
// =============================================================================

#[test]
fn attach_media_player_defaults() {
    let env = TestEnv::new();
    env.seed();

    env.st()
        .args(["attach", "living-room", "media_player.tv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=any_change timeout=1800s off=none"));

    let output = env
        .st()
        .args(["sources", "living-room", "--json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["entity_id"], "media_player.tv");
    assert_eq!(json[0]["mode"], "any_change");
    assert_eq!(json[0]["on_timeout"], 1800);

    env.st()
        .args(["attach", "living-room", "media_player.tv"])
        .assert()
        .failure();

    env.run(&["detach", "living-room", "media_player.tv"]);
    env.st()
        .args(["sources", "living-room"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No occupancy sources"));
}

#[test]
fn attach_rejects_bad_mode_and_module() {
    let env = TestEnv::new();
    env.seed();

    env.st()
        .args(["attach", "kitchen", "binary_sensor.door", "--mode", "sometimes"])
        .assert()
        .failure();
    env.st()
        .args(["attach", "kitchen", "binary_sensor.door", "--module", "lighting"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lighting"));
}

// =============================================================================
// Verify
// =============================================================================

#[test]
fn verify_clean_store() {
    let env = TestEnv::new();
    env.seed();
    env.st()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: 5 location(s)"));
}

#[test]
fn verify_reports_tampering() {
    let env = TestEnv::new();
    env.seed();

    let mut json = env.store_json();
    json["locations"][0]["name"] = serde_json::json!("Tampered");
    env.dir
        .child("data")
        .child("locations.json")
        .write_str(&serde_json::to_string_pretty(&json).unwrap())
        .unwrap();

    env.st()
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("fingerprint mismatch"));
    env.st().arg("list").assert().failure();
}

#[test]
fn tightened_root_types_keep_store_usable() {
    let env = TestEnv::new();
    env.seed();
    env.run(&["move", "kitchen", "--root"]);
    env.st()
        .arg("--config")
        .arg(env.dir.child("config.toml").path())
        .args(["config", "set", "hierarchy.root_types", "house,grounds"])
        .assert()
        .success();

    env.st()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kitchen [room] (kitchen)"));

    env.st()
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("policy: location 'kitchen'"))
        .stdout(predicate::str::contains("corrupt").not());

    env.st()
        .args(["move", "living-room", "--root"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be placed at the root"));
    env.run(&["move", "kitchen", "--parent", "main-floor"]);
}

// =============================================================================
// Config and completion
// =============================================================================

#[test]
fn config_set_then_get() {
    let env = TestEnv::new();
    let config = env.dir.child("custom.toml");

    env.st()
        .args(["config", "--config"])
        .arg(config.path())
        .args(["set", "lock_timeout_ms", "500"])
        .assert()
        .success();
    config.assert(predicate::str::contains("lock_timeout_ms = 500"));

    env.st()
        .arg("--config")
        .arg(config.path())
        .args(["config", "get", "lock_timeout_ms"])
        .assert()
        .success()
        .stdout("500\n");
}

#[test]
fn config_rejects_unknown_key() {
    let env = TestEnv::new();
    env.st()
        .args(["config", "get", "colour"])
        .assert()
        .failure();
}

#[test]
fn completion_generates_script() {
    let env = TestEnv::new();
    env.st()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("st"));
}
