//! Request Key Derivation
//!
//! Builds the deterministic fingerprint used to index cache and
//! deduplication entries. The same logical request always yields the same
//! key: object keys are serialized in sorted order (serde_json maps are
//! BTreeMap-backed, so insertion order cannot leak into the output) and the
//! HTTP method is uppercased before encoding.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde_json::{json, Value};

// == Request Key ==
/// Derives a stable cache key from a request's identifying fields.
///
/// # Arguments
/// * `url` - Request URL
/// * `method` - HTTP method, case-insensitive
/// * `params` - Optional query/params object
/// * `body` - Optional request body object
pub fn request_key(url: &str, method: &str, params: Option<&Value>, body: Option<&Value>) -> String {
    let canonical = json!({
        "url": url,
        "method": method.to_uppercase(),
        "params": params.cloned().unwrap_or(Value::Null),
        "body": body.cloned().unwrap_or(Value::Null),
    });

    // serde_json renders object keys sorted, so this string is canonical.
    BASE64_STANDARD.encode(canonical.to_string())
}
