//! core::verify
//!
//! Integrity verification of a location record set.
//!
//! # Issue Classes
//!
//! - **Recoverable**: sibling `order_index` collisions or gaps, and a root
//!   flag on a location that has a parent. A full index rebuild followed
//!   by renumbering repairs these deterministically.
//! - **Policy**: a pairing the structural table allows but the caller's
//!   tightened rules (`root_types`, `allow_nested_rooms`) do not. These are
//!   reported and left in place; only new placements are refused.
//! - **Irreconcilable**: duplicate ids, dangling parent references,
//!   cycles, and type pairings the structural table forbids. These are
//!   reported as corrupt state and never repaired silently.
//!
//! # Invariants
//!
//! - Never mutates its input
//! - Deterministic: issues are reported in a stable order

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use super::hierarchy::HierarchyIndex;
use super::location::Location;
use super::rules::HierarchyRules;
use super::types::{LocationId, LocationType};

/// A single integrity problem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyIssue {
    #[error("location id appears more than once: {0}")]
    DuplicateId(LocationId),

    #[error("location '{id}' references missing parent '{parent}'")]
    DanglingParent { id: LocationId, parent: LocationId },

    #[error("cycle detected in hierarchy at location: {0}")]
    CycleDetected(LocationId),

    #[error("location '{id}' ({child}) cannot be placed under {parent}")]
    InvalidHierarchy {
        id: LocationId,
        child: LocationType,
        parent: String,
    },

    #[error("location '{id}' ({child}) under {parent} is outside the configured rules")]
    OutsidePolicy {
        id: LocationId,
        child: LocationType,
        parent: String,
    },

    #[error("sibling order under {parent} is not dense and unique")]
    UnorderedSiblings { parent: String },

    #[error("location '{0}' has a parent but is flagged as explicit root")]
    StaleRootFlag(LocationId),
}

impl VerifyIssue {
    /// Whether an index rebuild can repair this issue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VerifyIssue::UnorderedSiblings { .. } | VerifyIssue::StaleRootFlag(_)
        )
    }

    /// Whether the record set cannot be loaded with this issue present.
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable() && !matches!(self, VerifyIssue::OutsidePolicy { .. })
    }
}

/// Result of verification.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifyResult {
    pub issues: Vec<VerifyIssue>,
}

impl VerifyResult {
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when no issue is fatal.
    pub fn is_recoverable(&self) -> bool {
        !self.issues.iter().any(VerifyIssue::is_fatal)
    }

    pub fn irreconcilable(&self) -> impl Iterator<Item = &VerifyIssue> {
        self.issues.iter().filter(|i| i.is_fatal())
    }
}

fn group_label(parent: Option<&LocationId>) -> String {
    match parent {
        Some(p) => format!("'{p}'"),
        None => "root".to_string(),
    }
}

/// Classify one placement: structural violations are fatal, policy ones are not.
fn placement_issue(
    record: &Location,
    parent: Option<LocationType>,
    rules: &HierarchyRules,
) -> Option<VerifyIssue> {
    let label = parent.map_or_else(|| "root".to_string(), |p| p.to_string());
    if HierarchyRules::structural()
        .check(record.location_type, parent)
        .is_err()
    {
        Some(VerifyIssue::InvalidHierarchy {
            id: record.id.clone(),
            child: record.location_type,
            parent: label,
        })
    } else if rules.check(record.location_type, parent).is_err() {
        Some(VerifyIssue::OutsidePolicy {
            id: record.id.clone(),
            child: record.location_type,
            parent: label,
        })
    } else {
        None
    }
}

/// Verify a record set against the structural invariants and `rules`.
pub fn verify_records(records: &[Location], rules: &HierarchyRules) -> VerifyResult {
    let mut issues = Vec::new();

    let mut by_id: BTreeMap<&LocationId, &Location> = BTreeMap::new();
    let mut seen_dupes = HashSet::new();
    for record in records {
        if by_id.insert(&record.id, record).is_some() && seen_dupes.insert(&record.id) {
            issues.push(VerifyIssue::DuplicateId(record.id.clone()));
        }
    }

    for record in by_id.values() {
        match &record.parent_id {
            Some(parent) => match by_id.get(parent) {
                None => issues.push(VerifyIssue::DanglingParent {
                    id: record.id.clone(),
                    parent: parent.clone(),
                }),
                Some(parent_record) => {
                    issues.extend(placement_issue(
                        record,
                        Some(parent_record.location_type),
                        rules,
                    ));
                    if record.is_explicit_root {
                        issues.push(VerifyIssue::StaleRootFlag(record.id.clone()));
                    }
                }
            },
            None => issues.extend(placement_issue(record, None, rules)),
        }
    }

    let mut groups: BTreeMap<Option<&LocationId>, Vec<u32>> = BTreeMap::new();
    for record in by_id.values() {
        groups
            .entry(record.parent_id.as_ref())
            .or_default()
            .push(record.order_index);
    }
    for (parent, mut orders) in groups {
        orders.sort_unstable();
        let dense = orders.iter().enumerate().all(|(i, o)| *o == i as u32);
        if !dense {
            issues.push(VerifyIssue::UnorderedSiblings {
                parent: group_label(parent),
            });
        }
    }

    if seen_dupes.is_empty() {
        let entries = by_id
            .values()
            .map(|r| (r.id.clone(), r.parent_id.clone(), r.order_index));
        if let Ok(index) = HierarchyIndex::rebuild(entries) {
            if let Some(id) = index.find_cycle() {
                issues.push(VerifyIssue::CycleDetected(id));
            }
        }
    }

    VerifyResult { issues }
}
