//! Canonical request fingerprinting.
//!
//! An exact-cache key has the form `<endpoint>:<backend>:<sha256-hex>`,
//! where the digest covers a canonical JSON rendering of the
//! endpoint-specific fingerprint subset: object keys sorted
//! lexicographically at every depth, no insignificant whitespace.
//! Canonicalization is done by hand rather than trusting the serializer's
//! map ordering, so the key is stable across the whole dependency graph.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Renders `value` as canonical JSON: sorted object keys, `,`/`:`
/// separators, no whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json handles escaping; a bare string cannot fail.
            out.push_str(&serde_json::to_string(s).unwrap_or_default());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

/// Builds the exact-cache key for an endpoint/backend/fingerprint triple.
pub fn cache_key(endpoint: &str, backend: &str, fingerprint: &Map<String, Value>) -> String {
    let canonical = canonical_json(&Value::Object(fingerprint.clone()));
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{}:{}:{}", endpoint, backend, hex::encode(digest))
}

/// Normalizes free-form query text for fingerprinting: lowercase, ASCII
/// punctuation stripped, whitespace runs collapsed, trimmed.
///
/// Only the cache key sees normalized text; the body forwarded upstream
/// always carries the original string.
pub fn normalize_query(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
