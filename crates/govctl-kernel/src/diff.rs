//! Shallow JSON-Patch-style diff between two [`PacketRuntimeState`] values,
//! stored verbatim in `DclCommit::diff` (spec §3).

use govctl_types::PacketRuntimeState;
use serde_json::Value;

/// Compute a flat list of `{op, path, value}` records describing which
/// top-level fields changed between `pre` and `post`. `PacketRuntimeState`
/// has no nested mutable structure worth diffing recursively — every field
/// is replaced as a whole, so a shallow, field-level diff is exact.
pub fn diff_runtime_state(pre: &PacketRuntimeState, post: &PacketRuntimeState) -> Value {
    let pre_value = serde_json::to_value(pre).unwrap_or(Value::Null);
    let post_value = serde_json::to_value(post).unwrap_or(Value::Null);

    let pre_obj = pre_value.as_object().cloned().unwrap_or_default();
    let post_obj = post_value.as_object().cloned().unwrap_or_default();

    let mut ops = Vec::new();
    let mut keys: Vec<&String> = post_obj.keys().chain(pre_obj.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        let before = pre_obj.get(key);
        let after = post_obj.get(key);
        match (before, after) {
            (Some(b), Some(a)) if b == a => {}
            (None, Some(a)) => ops.push(serde_json::json!({
                "op": "add",
                "path": format!("/{key}"),
                "value": a,
            })),
            (Some(_), None) => ops.push(serde_json::json!({
                "op": "remove",
                "path": format!("/{key}"),
            })),
            (_, Some(a)) => ops.push(serde_json::json!({
                "op": "replace",
                "path": format!("/{key}"),
                "value": a,
            })),
            (None, None) => {}
        }
    }

    Value::Array(ops)
}
