//! Role permission blobs.
//!
//! A role carries a JSON object such as
//! `{"parks": {"view": true, "edit": false}, "trees": true}`. A user's
//! effective permissions are the merge of every role they hold.

use serde_json::{Map, Value};

/// Key that grants every sibling permission at its level.
pub const WILDCARD: &str = "*";

/// Deep-merge `incoming` into `target`: booleans OR together, a `true`
/// replaces a whole subtree, objects merge key by key, and any other
/// value keeps whatever was there first.
pub fn merge_into(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Bool(true), _) => {}
        (target, Value::Bool(true)) => *target = Value::Bool(true),
        (Value::Object(existing), Value::Object(more)) => {
            for (key, value) in more {
                match existing.get_mut(key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, Value::Object(more)) if *target == Value::Bool(false) || target.is_null() => {
            *target = Value::Object(more.clone())
        }
        (target, other) if target.is_null() => *target = other.clone(),
        _ => {}
    }
}

/// Effective permissions for a set of role blobs.
pub fn merge_all<'a, I>(blobs: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut merged = Value::Object(Map::new());
    for blob in blobs {
        merge_into(&mut merged, blob);
    }
    merged
}

/// Walk a dotted path such as `parks.trees.edit`. A `true` or a `"*": true`
/// key anywhere along the walk, including the last object reached, grants.
pub fn is_granted(permissions: &Value, path: &str) -> bool {
    let mut current = permissions;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        match current {
            Value::Bool(granted) => return *granted,
            Value::Object(map) => {
                if map.get(WILDCARD) == Some(&Value::Bool(true)) {
                    return true;
                }
                match map.get(segment) {
                    Some(next) => current = next,
                    None => return false,
                }
            }
            _ => return false,
        }
    }
    match current {
        Value::Bool(granted) => *granted,
        Value::Object(map) => map.get(WILDCARD) == Some(&Value::Bool(true)),
        _ => false,
    }
}
