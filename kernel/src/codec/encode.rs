//! Greedy reference encoder.
//!
//! At each position the encoder picks, among all dictionary entries that are
//! a prefix of the remaining text, the one with the **lowest index**. That is
//! exactly what a naive linear scan over the dictionary does, and when the
//! dictionary is in canonical order (see [`sort_dictionary`]) it is the
//! longest match. The trie only makes the scan sub-quadratic; it never
//! changes which entry wins.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::wire::{Token, MAX_DICT_ENTRIES};
use crate::text::{cmp_utf16, to_units, utf16_len};

/// Error constructing an encoder dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// More entries than a 16-bit reference can address.
    DictionaryTooLarge { len: usize },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DictionaryTooLarge { len } => write!(
                f,
                "dictionary has {len} entries, limit is {MAX_DICT_ENTRIES}"
            ),
        }
    }
}

impl std::error::Error for EncodeError {}

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<u16, usize>,
    /// Lowest dictionary index whose entry ends at this node.
    entry: Option<u16>,
}

/// A dictionary indexed for greedy matching.
#[derive(Debug)]
pub struct EncodeDictionary {
    nodes: Vec<TrieNode>,
    entry_units: Vec<usize>,
}

impl EncodeDictionary {
    /// Index `entries` in their given order.
    ///
    /// Empty entries are kept (their indices stay valid) but never match.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::DictionaryTooLarge`] above 65535 entries.
    pub fn new(entries: &[String]) -> Result<Self, EncodeError> {
        if entries.len() > MAX_DICT_ENTRIES {
            return Err(EncodeError::DictionaryTooLarge { len: entries.len() });
        }
        let mut nodes = vec![TrieNode::default()];
        let mut entry_units = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let units = to_units(entry);
            entry_units.push(units.len());
            if units.is_empty() {
                continue;
            }
            let mut cursor = 0usize;
            for unit in units {
                cursor = if let Some(&next) = nodes[cursor].children.get(&unit) {
                    next
                } else {
                    nodes.push(TrieNode::default());
                    let next = nodes.len() - 1;
                    nodes[cursor].children.insert(unit, next);
                    next
                };
            }
            // Index fits: checked against MAX_DICT_ENTRIES above.
            let index = u16::try_from(index).map_err(|_| EncodeError::DictionaryTooLarge {
                len: entries.len(),
            })?;
            let slot = &mut nodes[cursor].entry;
            if slot.is_none() {
                *slot = Some(index);
            }
        }
        Ok(Self { nodes, entry_units })
    }

    /// Number of dictionary entries, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entry_units.len()
    }

    /// Whether the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_units.is_empty()
    }

    /// Lowest-index entry that is a prefix of `units`, with its length.
    fn best_match(&self, units: &[u16]) -> Option<(u16, usize)> {
        let mut cursor = 0usize;
        let mut best: Option<u16> = None;
        for unit in units {
            let Some(&next) = self.nodes[cursor].children.get(unit) else {
                break;
            };
            cursor = next;
            if let Some(index) = self.nodes[cursor].entry {
                best = Some(best.map_or(index, |b| b.min(index)));
            }
        }
        best.map(|index| (index, self.entry_units[usize::from(index)]))
    }
}

/// Per-call counters, reported for logging and compression accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Dictionary references emitted.
    pub dict_refs: usize,
    /// One-byte ASCII literals emitted.
    pub literals: usize,
    /// Three-byte raw code units emitted.
    pub raw_units: usize,
    /// UTF-16 code units consumed.
    pub input_units: usize,
}

/// Encode `text` against `dict`.
#[must_use]
pub fn encode(text: &str, dict: &EncodeDictionary) -> Vec<u8> {
    encode_with_stats(&to_units(text), dict).0
}

/// Encode raw code units against `dict`, returning bytes and counters.
///
/// Accepts arbitrary code units, including unpaired surrogates.
#[must_use]
pub fn encode_with_stats(units: &[u16], dict: &EncodeDictionary) -> (Vec<u8>, EncodeStats) {
    let mut out = Vec::with_capacity(units.len());
    let mut stats = EncodeStats {
        input_units: units.len(),
        ..EncodeStats::default()
    };
    let mut pos = 0usize;
    while pos < units.len() {
        if let Some((index, len)) = dict.best_match(&units[pos..]) {
            Token::DictRef(index).write_to(&mut out);
            stats.dict_refs += 1;
            pos += len;
            continue;
        }
        let token = Token::for_unit(units[pos]);
        match token {
            Token::Literal(_) => stats.literals += 1,
            _ => stats.raw_units += 1,
        }
        token.write_to(&mut out);
        pos += 1;
    }
    tracing::trace!(
        input_units = stats.input_units,
        output_bytes = out.len(),
        dict_refs = stats.dict_refs,
        "encoded lane"
    );
    (out, stats)
}

/// Canonical dictionary order: UTF-16 length descending, then code-unit
/// lexicographic ascending.
#[must_use]
pub fn sort_dictionary(mut entries: Vec<String>) -> Vec<String> {
    entries.sort_by(|a, b| canonical_entry_order(a, b));
    entries
}

/// Whether `entries` is already in canonical order.
#[must_use]
pub fn is_canonical_order(entries: &[String]) -> bool {
    entries
        .windows(2)
        .all(|w| canonical_entry_order(&w[0], &w[1]) != Ordering::Greater)
}

fn canonical_entry_order(a: &str, b: &str) -> Ordering {
    utf16_len(b)
        .cmp(&utf16_len(a))
        .then_with(|| cmp_utf16(a, b))
}
