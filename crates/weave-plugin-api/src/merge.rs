//! Structural deep merge over JSON values

use serde_json::Value;

/// Merge `overlay` into `base`
///
/// Objects are merged key by key, recursively. Any other overlay value,
/// arrays included, replaces the base value outright.
pub fn merge_deep(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_deep(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
