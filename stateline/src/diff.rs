//! Structural diffing between two successive state snapshots.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{ChangeMap, ChangeValue, State, is_plain_mapping};

/// Structural difference between two states.
///
/// Paths are dot-joined (`"parent.child"`) for fields nested inside plain
/// mappings. A changed field inside an unchanged parent produces one entry
/// per leaf that changed, never one per parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    /// Present in current, absent in previous.
    pub added: BTreeMap<String, Value>,
    /// Present in previous, absent in current.
    pub removed: BTreeMap<String, Value>,
    /// Present in both with differing values.
    pub changed: ChangeMap,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compute the structural difference between two successive states.
///
/// Returns `None` when `previous` is absent (first entry in a timeline).
/// Fields equal under value equality are skipped entirely. When both sides
/// of a differing common field are plain mappings the comparison recurses
/// field-by-field; otherwise a single leaf change is recorded. Output is
/// deterministic for the same two inputs.
pub fn compute_diff(current: &State, previous: Option<&State>) -> Option<StateDiff> {
    let previous = previous?;
    let mut diff = StateDiff::default();
    diff_level(previous, current, "", &mut diff);
    Some(diff)
}

fn diff_level(previous: &State, current: &State, prefix: &str, diff: &mut StateDiff) {
    for (field, new_value) in current {
        let path = join_path(prefix, field);
        match previous.get(field) {
            None => {
                diff.added.insert(path, new_value.clone());
            }
            Some(old_value) if old_value == new_value => {}
            Some(old_value) => {
                if let (Value::Object(old_map), Value::Object(new_map)) = (old_value, new_value)
                    && is_plain_mapping(old_value)
                    && is_plain_mapping(new_value)
                {
                    diff_level(old_map, new_map, &path, diff);
                } else {
                    diff.changed
                        .insert(path, ChangeValue::new(old_value.clone(), new_value.clone()));
                }
            }
        }
    }

    for (field, old_value) in previous {
        if !current.contains_key(field) {
            diff.removed.insert(join_path(prefix, field), old_value.clone());
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

/// Flatten a diff into a single dot-path → old/new mapping.
///
/// Added fields become changes from `null`. Removed fields are tracked on
/// the diff itself but intentionally omitted here.
pub fn extract_changes(diff: &StateDiff) -> ChangeMap {
    let mut changes = diff.changed.clone();
    for (path, value) in &diff.added {
        changes.insert(path.clone(), ChangeValue::appeared(value.clone()));
    }
    changes
}
