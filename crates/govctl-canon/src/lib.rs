#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-canon** – Canonical serialization and hashing for the govctl
//! Deterministic Commitment Layer (DCL).
//!
//! This crate provides the single source of truth for turning a JSON value
//! into the unique byte representation used for hashing. Every hash in the
//! system — action, pre/post-state, commit, constitution, checkpoint — goes
//! through [`canonicalize`] followed by [`sha256_hex`].
//!
//! The contract (spec §4.A/§4.B): identical byte output for semantically
//! equal values regardless of input key order; object keys sorted
//! lexicographically by Unicode code point; compact separators; no
//! `NaN`/`±Infinity`; timestamps normalized to RFC 3339 UTC with a `Z`
//! suffix, truncated to microseconds.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Errors produced while canonicalizing a value.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CanonError {
    /// The value contained a non-finite float (`NaN` or `±Infinity`), which
    /// has no canonical JSON representation.
    #[error("value is not finite and cannot be canonicalized")]
    InvalidValue,
    /// The value could not be converted to JSON at all.
    #[error("failed to convert value to JSON: {0}")]
    NotSerializable(String),
}

/// Canonicalize any serializable value: convert to JSON, normalize embedded
/// RFC 3339 timestamps, sort object keys, and emit compact bytes.
///
/// This is the entry point most callers should use — it takes a typed Rust
/// value (a `PacketRuntimeState`, an `ActionEnvelope`, a `DclCommit` with its
/// own hash field blanked out) rather than a pre-built [`Value`].
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonError> {
    let mut json = serde_json::to_value(value).map_err(|e| CanonError::NotSerializable(e.to_string()))?;
    normalize_timestamps(&mut json);
    canonicalize(&json)
}

/// Canonicalize an already-built [`Value`] without timestamp normalization.
///
/// Use this when the caller has already normalized timestamps (or has none)
/// and wants direct control over the JSON shape, e.g. the checkpoint head
/// table.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CanonError> {
    let mut buf = Vec::new();
    write_canonical(value, &mut buf)?;
    Ok(buf)
}

/// SHA-256 over canonical bytes, returned as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest)
}

/// Convenience: canonicalize then hash a typed value in one step.
pub fn hash_value<T: Serialize>(value: &T) -> Result<String, CanonError> {
    Ok(sha256_hex(&canonical_bytes(value)?))
}

/// Format a UTC timestamp per the canonical rule: RFC 3339, `Z` suffix,
/// truncated to microsecond precision.
pub fn canonical_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

//─────────────────────────────
//  Internals
//─────────────────────────────

fn normalize_timestamps(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
                *s = canonical_timestamp(&parsed.with_timezone(&Utc));
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_timestamps),
        Value::Object(map) => map.values_mut().for_each(normalize_timestamps),
        _ => {}
    }
}

fn write_canonical(value: &Value, buf: &mut Vec<u8>) -> Result<(), CanonError> {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => write_number(n, buf)?,
        Value::String(s) => write_string(s, buf),
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_canonical(item, buf)?;
            }
            buf.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            buf.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_string(key, buf);
                buf.push(b':');
                write_canonical(&map[*key], buf)?;
            }
            buf.push(b'}');
        }
    }
    Ok(())
}

fn write_number(n: &serde_json::Number, buf: &mut Vec<u8>) -> Result<(), CanonError> {
    if let Some(f) = n.as_f64() {
        if n.is_f64() && (f.is_nan() || f.is_infinite()) {
            return Err(CanonError::InvalidValue);
        }
    }
    buf.extend_from_slice(n.to_string().as_bytes());
    Ok(())
}

fn write_string(s: &str, buf: &mut Vec<u8>) {
    buf.push(b'"');
    for c in s.chars() {
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            '\u{8}' => buf.extend_from_slice(b"\\b"),
            '\u{c}' => buf.extend_from_slice(b"\\f"),
            c if (c as u32) < 0x20 => {
                buf.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut tmp = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
            }
        }
    }
    buf.push(b'"');
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_independent() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn test_compact_no_spaces() {
        let v = json!({"a": [1, 2, 3]});
        let bytes = canonicalize(&v).unwrap();
        assert_eq!(bytes, br#"{"a":[1,2,3]}"#.to_vec());
    }

    #[test]
    fn test_array_order_preserved() {
        let a = json!([3, 1, 2]);
        let bytes = canonicalize(&a).unwrap();
        assert_eq!(bytes, b"[3,1,2]".to_vec());
    }

    #[test]
    fn test_control_chars_escaped() {
        let v = json!({"s": "a\u{1}b"});
        let bytes = canonicalize(&v).unwrap();
        assert_eq!(bytes, br#"{"s":"ab"}"#.to_vec());
    }

    #[test]
    fn test_nan_rejected() {
        // serde_json cannot represent NaN directly; simulate via a crafted
        // Number that bypasses the normal constructor would not compile, so
        // we exercise the guard through a value that serde_json itself
        // refuses to produce, confirming to_value surfaces an error instead.
        #[derive(Serialize)]
        struct HasNan {
            x: f64,
        }
        let result = canonical_bytes(&HasNan { x: f64::NAN });
        assert!(result.is_err());
    }

    #[test]
    fn test_integer_vs_float_distinct() {
        let int_val = json!({"n": 1});
        let float_val = json!({"n": 1.0});
        assert_ne!(canonicalize(&int_val).unwrap(), canonicalize(&float_val).unwrap());
    }

    #[test]
    fn test_timestamp_truncated_and_z_suffixed() {
        let dt: DateTime<Utc> = "2026-07-27T12:34:56.123456789Z".parse().unwrap();
        let formatted = canonical_timestamp(&dt);
        assert_eq!(formatted, "2026-07-27T12:34:56.123456Z");
    }

    #[test]
    fn test_roundtrip_idempotent() {
        let v = json!({"z": 1, "a": [1, 2, {"y": true, "x": null}]});
        let once = canonicalize(&v).unwrap();
        let parsed: Value = serde_json::from_slice(&once).unwrap();
        let twice = canonicalize(&parsed).unwrap();
        assert_eq!(once, twice);
    }
}
