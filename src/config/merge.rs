//! Shallow merge of configuration documents.
//!
//! Only top-level keys are merged. A key present in the overlay replaces the base value
//! wholesale, so lists such as `jsFiles` or `targetPaths` are never concatenated and nested
//! mappings such as `npmVendors` are never combined.
//!
//! A `null` in the overlay means "not specified" and keeps the base value. A `null`
//! left in the merged document is stripped so the field default applies.

use serde_json::{Map, Value};

/// Merge `overlay` over `base`, with overlay keys taking precedence.
///
/// Non-object values are treated as empty documents. Overlay `null`s keep the base value.
///
/// # Example
/// ```
/// use serde_json::json;
/// use theme_pipeline::config::shallow_merge;
///
/// let base = json!({ "themeName": "Acme", "jsFiles": ["a/*.js"] });
/// let local = json!({ "jsFiles": ["b/*.js"] });
/// let merged = shallow_merge(base, local);
/// assert_eq!(merged, json!({ "themeName": "Acme", "jsFiles": ["b/*.js"] }));
/// ```
pub fn shallow_merge(base: Value, overlay: Value) -> Value {
    let mut merged = into_map(base);
    merged.extend(into_map(overlay).into_iter().filter(|(_, v)| !v.is_null()));
    Value::Object(merged)
}

/// Drop top-level `null` values so they fall back to field defaults.
pub fn strip_nulls(value: Value) -> Value {
    let mut map = into_map(value);
    map.retain(|_, v| !v.is_null());
    Value::Object(map)
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
