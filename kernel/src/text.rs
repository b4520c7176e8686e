//! Source text canonicalization and UTF-16 helpers.
//!
//! The codec works on UTF-16 code units: dictionary indices, literal escapes
//! and output limits are all counted in code units, never in chars or bytes.

/// Normalize line endings: `"\r\n"` and lone `"\r"` both become `"\n"`.
///
/// Applied to every source text before it is hashed, tokenized or encoded,
/// so a pack's identity does not depend on the platform that produced it.
#[must_use]
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

/// UTF-16 code units of `text`.
#[must_use]
pub fn to_units(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// Length of `text` in UTF-16 code units.
#[must_use]
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Convert code units to a `String`, replacing unpaired surrogates with U+FFFD.
#[must_use]
pub fn units_to_string_lossy(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Lexicographic comparison of two strings by UTF-16 code units.
///
/// This is the tie-break order for equal-length dictionary entries. It can
/// differ from `str` ordering for characters above U+FFFF.
#[must_use]
pub fn cmp_utf16(a: &str, b: &str) -> std::cmp::Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}
