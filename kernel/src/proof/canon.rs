//! Canonical JSON bytes: the single serialization-for-hashing implementation.
//!
//! **Exactly one place** produces canonical JSON bytes in sealpack. Every
//! identity hash (`dict_hash`, `block_hash`, `pack_hash`) is computed over the
//! output of [`canonical_json_bytes`].
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted by Unicode code point (equivalently, UTF-8 byte
//!    order) at every depth.
//! 2. Array element order is preserved.
//! 3. No extraneous whitespace (compact form: `{"a":1,"b":2}`).
//! 4. Strings are escaped exactly as a standard JSON serializer does:
//!    `\"`, `\\`, `\b`, `\f`, `\n`, `\r`, `\t`, and `\u00xx` (lowercase hex)
//!    for the remaining control characters. Everything else is raw UTF-8.
//! 5. Numbers must be integers (`i64` or `u64`). Floats are rejected so that
//!    no implementation ever has to agree on float formatting.
//! 6. `null`, `true`, `false` are written literally.

use std::io::Write;

/// Error type for canonical JSON serialization and hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// A JSON number was not an integer (float, NaN, Infinity).
    NonIntegerNumber { raw: String },
    /// Input bytes were not parseable JSON.
    InvalidJson { detail: String },
    /// The hash primitive failed its self-test or its worker died.
    HashFailed { detail: String },
}

impl std::fmt::Display for CanonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonIntegerNumber { raw } => {
                write!(f, "non-integer number in canonical JSON: {raw}")
            }
            Self::InvalidJson { detail } => write!(f, "invalid JSON: {detail}"),
            Self::HashFailed { detail } => write!(f, "hash provider failure: {detail}"),
        }
    }
}

impl std::error::Error for CanonError {}

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// # Errors
///
/// Returns [`CanonError::NonIntegerNumber`] if any JSON number is not
/// representable as `i64` or `u64`.
pub fn canonical_json_bytes(value: &serde_json::Value) -> Result<Vec<u8>, CanonError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

/// Parse JSON bytes and re-emit them in canonical form.
///
/// # Errors
///
/// Returns [`CanonError::InvalidJson`] if `bytes` is not JSON, or
/// [`CanonError::NonIntegerNumber`] if it contains a float.
pub fn canonicalize_json_slice(bytes: &[u8]) -> Result<Vec<u8>, CanonError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| CanonError::InvalidJson {
            detail: e.to_string(),
        })?;
    canonical_json_bytes(&value)
}

/// Canonical bytes of an object with one top-level key removed.
///
/// This is the preimage of every self-referential hash field: a pack's
/// `pack_hash` is computed over the pack without `pack_hash`, and likewise
/// for `dict_hash` and `block_hash`. Non-object values are serialized as-is.
///
/// # Errors
///
/// Same as [`canonical_json_bytes`].
pub fn canonical_json_bytes_without(
    value: &serde_json::Value,
    excluded_key: &str,
) -> Result<Vec<u8>, CanonError> {
    match value {
        serde_json::Value::Object(map) => {
            let mut buf = Vec::new();
            let mut keys: Vec<&String> = map.keys().filter(|k| *k != excluded_key).collect();
            keys.sort();
            write_object(&mut buf, &keys, map)?;
            Ok(buf)
        }
        other => canonical_json_bytes(other),
    }
}

fn write_value(buf: &mut Vec<u8>, value: &serde_json::Value) -> Result<(), CanonError> {
    match value {
        serde_json::Value::Null => {
            buf.extend_from_slice(b"null");
        }
        serde_json::Value::Bool(b) => {
            if *b {
                buf.extend_from_slice(b"true");
            } else {
                buf.extend_from_slice(b"false");
            }
        }
        serde_json::Value::Number(n) => {
            write_number(buf, n)?;
        }
        serde_json::Value::String(s) => {
            write_string(buf, s);
        }
        serde_json::Value::Array(arr) => {
            buf.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item)?;
            }
            buf.push(b']');
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            write_object(buf, &keys, map)?;
        }
    }
    Ok(())
}

fn write_object(
    buf: &mut Vec<u8>,
    sorted_keys: &[&String],
    map: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), CanonError> {
    buf.push(b'{');
    for (i, key) in sorted_keys.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write_string(buf, key);
        buf.push(b':');
        write_value(buf, &map[*key])?;
    }
    buf.push(b'}');
    Ok(())
}

fn write_number(buf: &mut Vec<u8>, n: &serde_json::Number) -> Result<(), CanonError> {
    // Try i64 first (handles negatives), then u64 (handles large positives).
    if let Some(i) = n.as_i64() {
        let _ = write!(buf, "{i}");
        Ok(())
    } else if let Some(u) = n.as_u64() {
        let _ = write!(buf, "{u}");
        Ok(())
    } else {
        Err(CanonError::NonIntegerNumber {
            raw: n.to_string(),
        })
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\u{0008}' => buf.extend_from_slice(b"\\b"),
            '\u{000C}' => buf.extend_from_slice(b"\\f"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if c < '\u{0020}' => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => {
                let mut utf8_buf = [0u8; 4];
                let encoded = c.encode_utf8(&mut utf8_buf);
                buf.extend_from_slice(encoded.as_bytes());
            }
        }
    }
    buf.push(b'"');
}
