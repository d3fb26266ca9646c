//! Ordered fallback lookup over loosely-typed gateway payloads.
//!
//! Upstream payloads name the same concept differently depending on the
//! collector or model that produced them (`summary` vs `title`, `rule_id` vs
//! `ruleId`). Callers list candidate keys in priority order and take the first
//! one present.

use serde_json::{Map, Value};

/// Returns the first non-blank string among `keys` in `value`, trimmed.
///
/// Returns `None` when `value` is not an object. Keys holding non-string
/// values are skipped rather than stopping the search.
pub fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    first_str_in(value.as_object()?, keys)
}

/// [`first_str`] over an already-unpacked object.
pub fn first_str_in<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}
