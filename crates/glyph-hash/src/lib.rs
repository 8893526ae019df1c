//! Canonical JSON encoding and SHA-256 digests for glyph manifests.
//!
//! A digest is taken over the *canonical* encoding of a JSON value: object
//! keys sorted lexicographically at every nesting level, array order kept,
//! no whitespace. Two values that are structurally equal therefore hash to
//! the same 64-character lowercase hex string no matter how their maps were
//! built.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let a = json!({"name": "Test Glyph", "glyph_id": "GLYPH-TEST"});
//! let b = json!({"glyph_id": "GLYPH-TEST", "name": "Test Glyph"});
//!
//! assert_eq!(glyph_hash::digest(&a), glyph_hash::digest(&b));
//! assert_eq!(glyph_hash::digest(&a).len(), 64);
//! ```

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Render `value` as compact JSON with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

/// SHA-256 of the canonical encoding of `value`, hex encoded.
pub fn digest(value: &Value) -> String {
    digest_bytes(canonical_json(value).as_bytes())
}

/// SHA-256 of raw bytes, hex encoded.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// Rebuilding maps in sorted order keeps the output canonical even when
// serde_json is compiled with `preserve_order`.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
