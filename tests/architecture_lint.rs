//! Architecture enforcement tests.
//!
//! Command handlers are a thin adapter over the engine. They must not
//! reach past it into the store, and every mutating handler must go
//! through `session::mutate`, which holds the store lock from load to
//! save. These tests catch handlers that drift from that shape.
//!
//! # Test Categories
//!
//! 1. **Store Access Detection** - Handlers must not load or save directly
//! 2. **Record Mutation Detection** - Handlers must not edit records
//! 3. **Lifecycle Verification** - Mutating handlers must use `mutate`

use std::fs;
use std::path::Path;

/// Files allowed to touch the store directly.
///
/// - `session.rs` - The load/lock/save plumbing itself
/// - `verify.rs` - Reads the raw document so nothing is repaired first
/// - `config_cmd.rs` - Config file I/O and data dir resolution
/// - `mod.rs` - Module definition file
const STORE_ACCESS_ALLOWED: &[&str] = &["session.rs", "verify.rs", "config_cmd.rs", "mod.rs"];

/// Handlers that change the hierarchy, with the functions that must call `mutate`.
const MUTATING_HANDLERS: &[(&str, &[&str])] = &[
    ("location.rs", &["create", "rename", "edit", "delete"]),
    ("move_cmd.rs", &["move_location", "reorder"]),
    ("sources.rs", &["attach", "detach"]),
];

fn command_files() -> Vec<(String, String)> {
    let command_dir = Path::new("src/cli/commands");
    let mut files = Vec::new();

    for entry in fs::read_dir(command_dir).expect("Failed to read commands directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.extension().map(|e| e == "rs").unwrap_or(false) {
            let filename = path.file_name().unwrap().to_str().unwrap().to_string();
            let content = fs::read_to_string(&path)
                .unwrap_or_else(|_| panic!("Failed to read {}", filename));
            files.push((filename, content));
        }
    }
    files
}

/// Strip the `#[cfg(test)]` module so test helpers are not linted.
fn production_part(content: &str) -> &str {
    content.split("#[cfg(test)]").next().unwrap_or(content)
}

/// Body of `pub fn <name>(` up to the next top-level `pub fn` or `fn`.
fn function_body<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let start = content.find(&format!("pub fn {}(", name))?;
    let rest = &content[start + 1..];
    let end = [rest.find("\npub fn "), rest.find("\nfn ")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

// =============================================================================
// Store Access Detection
// =============================================================================

#[test]
fn handlers_do_not_touch_the_store() {
    let forbidden = [
        "FileStore::new",
        "Engine::open",
        ".save(&",
        "StoreLock",
        "LocationTable",
    ];

    let mut violations = Vec::new();
    for (filename, content) in command_files() {
        if STORE_ACCESS_ALLOWED.contains(&filename.as_str()) {
            continue;
        }
        let code = production_part(&content);
        for pattern in forbidden {
            if code.contains(pattern) {
                violations.push(format!(
                    "{}: uses `{}` - go through session helpers instead",
                    filename, pattern
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

// =============================================================================
// Record Mutation Detection
// =============================================================================

#[test]
fn handlers_do_not_edit_records() {
    let forbidden = [".parent_id =", ".order_index =", ".is_explicit_root =", ".modules."];

    let mut violations = Vec::new();
    for (filename, content) in command_files() {
        let code = production_part(&content);
        for pattern in forbidden {
            if code.contains(pattern) {
                violations.push(format!("{}: writes `{}` directly", filename, pattern));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Handlers must mutate through engine operations:\n  {}",
        violations.join("\n  ")
    );
}

// =============================================================================
// Lifecycle Verification
// =============================================================================

#[test]
fn mutating_handlers_use_mutate() {
    let files = command_files();
    let mut violations = Vec::new();

    for (filename, functions) in MUTATING_HANDLERS {
        let content = files
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, content)| content.as_str())
            .unwrap_or_else(|| panic!("{} is missing", filename));

        for function in *functions {
            match function_body(content, function) {
                Some(body) if body.contains("mutate(") => {}
                Some(_) => violations.push(format!("{}::{} does not call mutate()", filename, function)),
                None => violations.push(format!("{}::{} not found", filename, function)),
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Mutating handlers must hold the store lock:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn query_handlers_never_lock() {
    let content = fs::read_to_string("src/cli/commands/query.rs").expect("read query.rs");
    let code = production_part(&content);
    assert!(!code.contains("mutate("), "query.rs must stay read-only");
    assert!(code.contains("read_engine("));
}
