//! Adjacency witness: advisory counts of consecutive dictionary references.
//!
//! Edges never affect decoding. They are checked structurally so that a
//! hostile pack cannot smuggle unbounded or nonsensical data past the
//! verifier under an advisory field.

use std::collections::BTreeMap;

use sealpack_kernel::codec::decode::{scan_tokens, DecodeError};
use sealpack_kernel::codec::wire::Token;

use crate::model::Edge;

/// Count every `(from, to)` pair of directly adjacent references in `bytes`.
///
/// Output is sorted by `(from, to)`.
///
/// # Errors
///
/// Returns [`DecodeError`] if `bytes` is not a well-formed token stream.
pub fn compute_edges(bytes: &[u8]) -> Result<Vec<Edge>, DecodeError> {
    let tokens = scan_tokens(bytes)?;
    let mut counts: BTreeMap<(u16, u16), u64> = BTreeMap::new();
    for pair in tokens.windows(2) {
        if let [Token::DictRef(from), Token::DictRef(to)] = pair {
            *counts.entry((*from, *to)).or_insert(0) += 1;
        }
    }
    Ok(counts
        .into_iter()
        .map(|((from, to), count)| Edge(from, to, count))
        .collect())
}

/// Structural violation of an edges witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgesViolation {
    /// Not an array.
    NotArray,
    /// Entry `index` is not a `[from, to, count]` triple of valid integers.
    BadEntry { index: usize, detail: String },
    /// More triples than the policy allows.
    TooMany { len: usize, limit: usize },
}

impl std::fmt::Display for EdgesViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotArray => write!(f, "edges must be an array"),
            Self::BadEntry { index, detail } => write!(f, "edges[{index}]: {detail}"),
            Self::TooMany { len, limit } => {
                write!(f, "edges has {len} entries, limit is {limit}")
            }
        }
    }
}

/// Validate an untrusted edges value against the dictionary size and a bound.
///
/// Entry shape is checked before the length bound.
///
/// # Errors
///
/// Returns the first [`EdgesViolation`].
pub fn validate_edges(
    value: &serde_json::Value,
    dict_len: usize,
    max_edges: usize,
) -> Result<(), EdgesViolation> {
    let entries = value.as_array().ok_or(EdgesViolation::NotArray)?;
    for (index, entry) in entries.iter().enumerate() {
        check_entry(entry, dict_len)
            .map_err(|detail| EdgesViolation::BadEntry { index, detail })?;
    }
    if entries.len() > max_edges {
        return Err(EdgesViolation::TooMany {
            len: entries.len(),
            limit: max_edges,
        });
    }
    Ok(())
}

fn check_entry(entry: &serde_json::Value, dict_len: usize) -> Result<(), String> {
    let triple = entry
        .as_array()
        .filter(|a| a.len() == 3)
        .ok_or_else(|| "expected [from, to, count]".to_string())?;
    for (slot, name) in triple[..2].iter().zip(["from", "to"]) {
        let index = slot
            .as_u64()
            .ok_or_else(|| format!("{name} is not a non-negative integer"))?;
        if usize::try_from(index).ok().filter(|i| *i < dict_len).is_none() {
            return Err(format!("{name}={index} outside dictionary of {dict_len}"));
        }
    }
    match triple[2].as_u64() {
        Some(c) if c >= 1 => Ok(()),
        _ => Err("count must be a positive integer".to_string()),
    }
}
