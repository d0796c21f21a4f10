//! Canonical JSON encoding for deterministic signing.
//!
//! A payload is signed over `keccak256(canonical_json(payload))`. The
//! canonical form is:
//! - Object keys sorted by their UTF-8 byte sequence
//! - No insignificant whitespace
//! - Strings escaped exactly as `serde_json` escapes them
//! - Numbers in `serde_json`'s shortest round-trip form
//!
//! Sorting is done here rather than relying on the map type inside
//! `serde_json::Value`, so the encoding is unaffected by the
//! `preserve_order` feature being switched on anywhere in the build.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Encode a JSON value canonically.
pub fn canonical_json(value: &Value) -> String {
    let mut buf = String::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Convert any serializable value to JSON and encode it canonically.
pub fn canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(canonical_json(&value))
}

/// Recursively encode a value.
fn encode_value_to(buf: &mut String, value: &Value) {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => buf.push_str(&n.to_string()),
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                encode_value_to(buf, item);
            }
            buf.push(']');
        }
        Value::Object(map) => encode_object_canonical(buf, map),
    }
}

/// Encode an object with keys in byte order.
fn encode_object_canonical(buf: &mut String, map: &serde_json::Map<String, Value>) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    buf.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        encode_string(buf, key);
        buf.push(':');
        encode_value_to(buf, value);
    }
    buf.push('}');
}

fn encode_string(buf: &mut String, s: &str) {
    // Display on a string Value yields its escaped, quoted form.
    buf.push_str(&Value::String(s.to_owned()).to_string());
}
