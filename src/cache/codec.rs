//! Codec Pipeline Module
//!
//! Optional transforms applied to payloads before storage and reversed on
//! read. Two steps, both off by default:
//!
//! - Compression: a reversible key-aliasing scheme that shortens a fixed
//!   vocabulary of common field names in the JSON object tree. Not true
//!   compression, just lossless aliasing.
//! - Obfuscation: a repeating-key XOR over the serialized bytes, then
//!   base64 for storage. This is obfuscation only, with no integrity check;
//!   it must not be treated as encryption.
//!
//! Both steps degrade best-effort: if a transform fails, the plain
//! serialized form is stored or returned instead, flagged via
//! `passthrough`, and only a debug trace is emitted. Payloads that already
//! contain `~`-prefixed field names can defeat the aliasing inversion; the
//! per-object guards below skip ambiguous renames but cannot catch every
//! case.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CacheError, Result};

// == Alias Vocabulary ==
/// Field names aliased by the compression step. Aliases carry a `~` sigil
/// so they are unlikely to collide with real payload fields.
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("timestamp", "~ts"),
    ("description", "~dc"),
    ("created_at", "~ca"),
    ("updated_at", "~ua"),
    ("content", "~c"),
    ("message", "~m"),
    ("status", "~s"),
    ("result", "~r"),
    ("title", "~tt"),
    ("error", "~e"),
    ("value", "~v"),
    ("data", "~d"),
    ("name", "~n"),
    ("type", "~y"),
    ("id", "~i"),
];

// == Outcomes ==
/// Result of encoding a payload for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    /// The string actually stored
    pub payload: String,
    /// True when no transform was applied, either because both steps are
    /// disabled or because a step failed and the plain form was kept
    pub passthrough: bool,
}

/// Result of decoding a stored payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    /// The reconstructed payload
    pub value: T,
    /// True when the stored string was parsed as-is instead of being run
    /// back through the pipeline
    pub passthrough: bool,
}

// == Codec Pipeline ==
/// Per-instance codec configuration. Encode and decode are mutual inverses
/// when the enabled steps succeed.
#[derive(Debug, Clone)]
pub struct CodecPipeline {
    compression: bool,
    obfuscation: bool,
    key: Option<String>,
}

impl CodecPipeline {
    // == Constructor ==
    pub fn new(compression: bool, obfuscation: bool, key: Option<String>) -> Self {
        Self {
            compression,
            obfuscation,
            key,
        }
    }

    /// A pipeline with every step disabled (identity).
    pub fn disabled() -> Self {
        Self::new(false, false, None)
    }

    // == Encode ==
    /// Serializes `value` and applies the enabled transforms.
    ///
    /// Serialization failure is a hard error; transform failures fall back
    /// to the plain serialized form with `passthrough` set.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Encoded> {
        let plain = serde_json::to_string(value)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        if !self.compression && !self.obfuscation {
            return Ok(Encoded {
                payload: plain,
                passthrough: true,
            });
        }

        let mut text = plain.clone();

        if self.compression {
            match compress(&text) {
                Ok(compressed) => text = compressed,
                Err(err) => {
                    debug!(error = %err, "compression failed, storing plain payload");
                    return Ok(Encoded {
                        payload: plain,
                        passthrough: true,
                    });
                }
            }
        }

        if self.obfuscation {
            match self.obfuscate(&text) {
                Ok(obfuscated) => text = obfuscated,
                Err(err) => {
                    debug!(error = %err, "obfuscation failed, storing plain payload");
                    return Ok(Encoded {
                        payload: plain,
                        passthrough: true,
                    });
                }
            }
        }

        Ok(Encoded {
            payload: text,
            passthrough: false,
        })
    }

    // == Decode ==
    /// Reverses the enabled transforms and parses the payload.
    ///
    /// If the reverse pipeline fails (payload was stored as a passthrough,
    /// or the stored form is damaged) the stored string is parsed as plain
    /// JSON instead; only when that also fails is an error returned.
    pub fn decode<T: DeserializeOwned>(&self, stored: &str) -> Result<Decoded<T>> {
        if !self.compression && !self.obfuscation {
            let value = serde_json::from_str(stored)
                .map_err(|e| CacheError::Serialization(e.to_string()))?;
            return Ok(Decoded {
                value,
                passthrough: true,
            });
        }

        match self.reverse(stored) {
            Ok(plain) => match serde_json::from_str(&plain) {
                Ok(value) => Ok(Decoded {
                    value,
                    passthrough: false,
                }),
                Err(err) => {
                    debug!(error = %err, "decoded payload failed to parse, trying plain form");
                    self.decode_plain(stored)
                }
            },
            Err(err) => {
                debug!(error = %err, "reverse pipeline failed, trying plain form");
                self.decode_plain(stored)
            }
        }
    }

    fn decode_plain<T: DeserializeOwned>(&self, stored: &str) -> Result<Decoded<T>> {
        let value = serde_json::from_str(stored)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(Decoded {
            value,
            passthrough: true,
        })
    }

    fn reverse(&self, stored: &str) -> Result<String> {
        let mut text = stored.to_string();
        if self.obfuscation {
            text = self.deobfuscate(&text)?;
        }
        if self.compression {
            text = decompress(&text)?;
        }
        Ok(text)
    }

    // == Obfuscation Step ==
    fn key_bytes(&self) -> Result<&[u8]> {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key.as_bytes()),
            _ => Err(CacheError::InvalidConfig(
                "obfuscation requires a non-empty key".to_string(),
            )),
        }
    }

    fn obfuscate(&self, text: &str) -> Result<String> {
        let key = self.key_bytes()?;
        let mixed = xor_with_key(text.as_bytes(), key);
        Ok(BASE64_STANDARD.encode(mixed))
    }

    fn deobfuscate(&self, text: &str) -> Result<String> {
        let key = self.key_bytes()?;
        let raw = BASE64_STANDARD
            .decode(text)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let plain = xor_with_key(&raw, key);
        String::from_utf8(plain).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

/// XOR each byte against the key, repeating the key cyclically. Applying
/// the function twice with the same key is the identity.
fn xor_with_key(input: &[u8], key: &[u8]) -> Vec<u8> {
    input
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % key.len()])
        .collect()
}

// == Compression Step ==
/// Replaces vocabulary field names with their short aliases throughout the
/// JSON object tree.
fn compress(plain: &str) -> Result<String> {
    let mut value: Value =
        serde_json::from_str(plain).map_err(|e| CacheError::Serialization(e.to_string()))?;
    rename_fields(&mut value, true);
    Ok(value.to_string())
}

/// Expands short aliases back to the original field names.
fn decompress(compressed: &str) -> Result<String> {
    let mut value: Value =
        serde_json::from_str(compressed).map_err(|e| CacheError::Serialization(e.to_string()))?;
    rename_fields(&mut value, false);
    Ok(value.to_string())
}

fn rename_fields(value: &mut Value, forward: bool) {
    match value {
        Value::Object(map) => {
            for (from, to) in FIELD_ALIASES {
                let (from, to) = if forward { (*from, *to) } else { (*to, *from) };
                // Skip when the target name already exists; renaming would
                // silently drop one of the two values and break inversion.
                if map.contains_key(from) && !map.contains_key(to) {
                    if let Some(inner) = map.remove(from) {
                        map.insert(to.to_string(), inner);
                    }
                }
            }
            for (_, inner) in map.iter_mut() {
                rename_fields(inner, forward);
            }
        }
        Value::Array(items) => {
            for item in items {
                rename_fields(item, forward);
            }
        }
        _ => {}
    }
}
