//! Bytecode decoder: the normative inverse of the encoder.
//!
//! Fail-closed: every malformed input yields a typed [`DecodeError`] carrying
//! the byte offset of the offending token. No partial output is ever
//! returned, and no input can make the decoder allocate beyond
//! [`DecodeLimits::max_output_units`] code units.

use super::wire::{Token, MAX_LITERAL, OP_DICT_REF, OP_RAW_UNIT, WIDE_TOKEN_LEN};
use crate::text::{to_units, units_to_string_lossy};

/// Default decompression-bomb guard, in UTF-16 code units.
pub const DEFAULT_MAX_OUTPUT_UNITS: usize = 134_217_728;

/// Resource bounds for one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum accumulated output length in code units.
    pub max_output_units: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_output_units: DEFAULT_MAX_OUTPUT_UNITS,
        }
    }
}

/// Typed decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A byte in `0x82..=0xFF` appeared where a token must start.
    InvalidByte { offset: usize, byte: u8 },
    /// A three-byte token starts fewer than three bytes before the end.
    TruncatedSequence { offset: usize },
    /// A dictionary reference is outside `0..dict_len`.
    DictIndexOob {
        offset: usize,
        index: u16,
        dict_len: usize,
    },
    /// The referenced dictionary slot does not hold a string.
    DictEntryInvalid { offset: usize, index: u16 },
    /// Appending the next token would exceed the output bound.
    OutputLimit { offset: usize, limit: usize },
}

impl DecodeError {
    /// Byte offset of the token that failed.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::InvalidByte { offset, .. }
            | Self::TruncatedSequence { offset }
            | Self::DictIndexOob { offset, .. }
            | Self::DictEntryInvalid { offset, .. }
            | Self::OutputLimit { offset, .. } => *offset,
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidByte { offset, byte } => {
                write!(f, "invalid byte 0x{byte:02x} at offset {offset}")
            }
            Self::TruncatedSequence { offset } => {
                write!(f, "truncated 3-byte sequence at offset {offset}")
            }
            Self::DictIndexOob {
                offset,
                index,
                dict_len,
            } => write!(
                f,
                "dictionary index {index} out of range (size {dict_len}) at offset {offset}"
            ),
            Self::DictEntryInvalid { offset, index } => {
                write!(f, "dictionary entry {index} is not a string (offset {offset})")
            }
            Self::OutputLimit { offset, limit } => {
                write!(f, "output exceeds {limit} code units at offset {offset}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// The decoder's view of a dictionary.
///
/// A slot is `None` when the source dictionary held something other than a
/// string there; referencing such a slot is [`DecodeError::DictEntryInvalid`].
#[derive(Debug, Clone, Default)]
pub struct DecodeTable {
    entries: Vec<Option<Vec<u16>>>,
}

impl DecodeTable {
    /// Table over well-typed string entries.
    #[must_use]
    pub fn from_strings(entries: &[String]) -> Self {
        Self {
            entries: entries.iter().map(|e| Some(to_units(e))).collect(),
        }
    }

    /// Table over an untrusted JSON array; non-strings become invalid slots.
    #[must_use]
    pub fn from_json(entries: &[serde_json::Value]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| e.as_str().map(to_units))
                .collect(),
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode `bytes` against `dict` into UTF-16 code units.
///
/// # Errors
///
/// Returns the first [`DecodeError`] in byte order. See the module docs.
pub fn decode(
    dict: &DecodeTable,
    bytes: &[u8],
    limits: &DecodeLimits,
) -> Result<Vec<u16>, DecodeError> {
    let mut out: Vec<u16> = Vec::with_capacity(bytes.len().min(limits.max_output_units));
    let mut i = 0usize;
    while i < bytes.len() {
        let offset = i;
        match read_token(bytes, &mut i)? {
            Token::Literal(b) => {
                push_checked(&mut out, &[u16::from(b)], offset, limits)?;
            }
            Token::RawUnit(unit) => {
                push_checked(&mut out, &[unit], offset, limits)?;
            }
            Token::DictRef(index) => {
                let slot = dict.entries.get(usize::from(index)).ok_or(
                    DecodeError::DictIndexOob {
                        offset,
                        index,
                        dict_len: dict.len(),
                    },
                )?;
                let entry = slot
                    .as_deref()
                    .ok_or(DecodeError::DictEntryInvalid { offset, index })?;
                push_checked(&mut out, entry, offset, limits)?;
            }
        }
    }
    tracing::trace!(input_bytes = bytes.len(), output_units = out.len(), "decoded lane");
    Ok(out)
}

/// [`decode`], converted to a `String` (unpaired surrogates become U+FFFD).
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_to_string(
    dict: &DecodeTable,
    bytes: &[u8],
    limits: &DecodeLimits,
) -> Result<String, DecodeError> {
    decode(dict, bytes, limits).map(|units| units_to_string_lossy(&units))
}

/// Split `bytes` into wire tokens without resolving references.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidByte`] or [`DecodeError::TruncatedSequence`].
pub fn scan_tokens(bytes: &[u8]) -> Result<Vec<Token>, DecodeError> {
    let mut tokens = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        tokens.push(read_token(bytes, &mut i)?);
    }
    Ok(tokens)
}

fn read_token(bytes: &[u8], i: &mut usize) -> Result<Token, DecodeError> {
    let offset = *i;
    let lead = bytes[offset];
    if lead <= MAX_LITERAL {
        *i += 1;
        return Ok(Token::Literal(lead));
    }
    if lead != OP_DICT_REF && lead != OP_RAW_UNIT {
        return Err(DecodeError::InvalidByte { offset, byte: lead });
    }
    if offset + 2 >= bytes.len() {
        return Err(DecodeError::TruncatedSequence { offset });
    }
    let value = u16::from_be_bytes([bytes[offset + 1], bytes[offset + 2]]);
    *i += WIDE_TOKEN_LEN;
    Ok(if lead == OP_DICT_REF {
        Token::DictRef(value)
    } else {
        Token::RawUnit(value)
    })
}

/// Append `units`, failing before the buffer would exceed the bound.
fn push_checked(
    out: &mut Vec<u16>,
    units: &[u16],
    offset: usize,
    limits: &DecodeLimits,
) -> Result<(), DecodeError> {
    if out.len().saturating_add(units.len()) > limits.max_output_units {
        return Err(DecodeError::OutputLimit {
            offset,
            limit: limits.max_output_units,
        });
    }
    out.extend_from_slice(units);
    Ok(())
}
