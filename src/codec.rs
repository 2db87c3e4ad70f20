//! Byte Codec Module
//!
//! Converts arbitrary serializable values to and from the opaque byte
//! sequences stored in the table. Each encoded value carries a type tag so
//! that reading an entry back as a different type is detected and degrades
//! to a cache miss instead of returning garbage or failing hard.
//!
//! # Encoded Layout
//! `[tagLen: u32 BE][tag: UTF-8][payload: JSON]`
//!
//! The tag is the Rust type name of the stored value. It is only compared
//! for equality, so its exact rendering does not matter: a mismatch (stale
//! entry from another schema version, or a different compiler rendering) is
//! a soft miss by design.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

// == Decoded Result ==
/// Outcome of decoding a stored byte sequence as a `T`.
///
/// Type mismatch and malformed data are distinct from each other and from
/// success so callers can log them differently, but both read as "absent".
#[derive(Debug)]
pub enum Decoded<T> {
    /// The entry decoded cleanly as a `T`
    Value(T),
    /// The entry was written as a different type; treated as a miss
    TypeMismatch {
        /// Tag the caller asked for
        expected: String,
        /// Tag found in the stored bytes
        found: String,
    },
    /// The byte stream is not a valid encoded value
    Malformed(CacheError),
}

// == Encode ==
/// Serializes a value into a tagged byte sequence.
///
/// Fails with [`CacheError::Encode`] if the value cannot be serialized
/// (e.g. a map with non-string keys, or a non-finite float).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload =
        serde_json::to_vec(value).map_err(|e| CacheError::Encode(e.to_string()))?;
    let tag = type_tag::<T>();

    let mut out = Vec::with_capacity(4 + tag.len() + payload.len());
    out.extend_from_slice(&(tag.len() as u32).to_be_bytes());
    out.extend_from_slice(tag.as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

// == Decode ==
/// Deserializes a tagged byte sequence, checking the type tag first.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Decoded<T> {
    if bytes.len() < 4 {
        return Decoded::Malformed(CacheError::Decode(
            "entry shorter than tag length prefix".to_string(),
        ));
    }

    let tag_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let payload_start = match 4usize.checked_add(tag_len) {
        Some(n) if n <= bytes.len() => n,
        _ => {
            return Decoded::Malformed(CacheError::Decode(format!(
                "tag length {} exceeds entry of {} bytes",
                tag_len,
                bytes.len()
            )))
        }
    };

    let found = match std::str::from_utf8(&bytes[4..payload_start]) {
        Ok(tag) => tag,
        Err(_) => {
            return Decoded::Malformed(CacheError::Decode(
                "type tag is not valid UTF-8".to_string(),
            ))
        }
    };

    let expected = type_tag::<T>();
    if found != expected {
        return Decoded::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        };
    }

    match serde_json::from_slice(&bytes[payload_start..]) {
        Ok(value) => Decoded::Value(value),
        Err(e) => Decoded::Malformed(CacheError::Decode(e.to_string())),
    }
}

// == Type Tag ==
/// Tag recorded alongside each encoded value.
fn type_tag<T>() -> &'static str {
    std::any::type_name::<T>()
}
