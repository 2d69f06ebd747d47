//! Recursive merge of configuration trees.

use serde_json::Value;

/// Merge `source` into `target`, key by key.
///
/// When both sides hold an object the merge recurses; in every other case
/// (scalars, arrays, mismatched kinds) the source value replaces the target
/// value outright. Arrays are never concatenated.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Return a new tree with `overrides` merged on top of `base`.
pub fn merged(base: &Value, overrides: &Value) -> Value {
    let mut out = base.clone();
    deep_merge(&mut out, overrides);
    out
}
