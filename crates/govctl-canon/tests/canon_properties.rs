//! Property tests for the canonicalization round-trip and key-order-
//! independence laws (spec §8's "Canonical stability" and "Round-trip /
//! idempotence" laws).

use govctl_canon::canonicalize;
use proptest::prelude::*;
use serde_json::Value;

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn shuffle_object_keys(value: &Value, reverse: bool) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.iter().map(|(k, v)| (k.clone(), shuffle_object_keys(v, reverse))).collect();
            if reverse {
                entries.reverse();
            }
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| shuffle_object_keys(v, reverse)).collect()),
        other => other.clone(),
    }
}

proptest! {
    #[test]
    fn canonical_bytes_independent_of_object_key_insertion_order(v in arb_json()) {
        let forward = canonicalize(&v).unwrap();
        let reversed = shuffle_object_keys(&v, true);
        let backward = canonicalize(&reversed).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn canonicalize_parse_canonicalize_is_idempotent(v in arb_json()) {
        let once = canonicalize(&v).unwrap();
        let parsed: Value = serde_json::from_slice(&once).unwrap();
        let twice = canonicalize(&parsed).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn canonical_bytes_are_valid_json_parseable_back_to_the_same_tree(v in arb_json()) {
        let bytes = canonicalize(&v).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        prop_assert_eq!(parsed, v);
    }
}
