//! Response body projections
//!
//! Parsers turn a decoded `200` body into the list of items a caller wants.
//! None of them fail: a missing or mistyped field projects to an empty list.

use serde_json::Value;

/// Default projection: the array under `items`, or nothing.
pub fn items(body: Value) -> Vec<Value> {
    take_items(body)
}

/// The `items` array nested under `key`, as returned by `search`
/// (`{"tracks": {"items": [...]}}`).
pub fn nested_items(key: impl Into<String>) -> impl Fn(Value) -> Vec<Value> + Clone {
    let key = key.into();
    move |mut body| match body.get_mut(&key) {
        Some(inner) => take_items(inner.take()),
        None => Vec::new(),
    }
}

/// The `track` object of each saved-track entry (`me/tracks`), skipping
/// entries without one.
pub fn saved_tracks(body: Value) -> Vec<Value> {
    take_items(body)
        .into_iter()
        .filter_map(|mut entry| match entry.get_mut("track") {
            Some(track) if !track.is_null() => Some(track.take()),
            _ => None,
        })
        .collect()
}

fn take_items(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
