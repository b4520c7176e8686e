//! Dictionary construction: a replaceable, non-normative strategy.
//!
//! Only the codec and verifier are normative. Any strategy is acceptable as
//! long as the golden vectors that pin its output still reproduce; the
//! sealer also accepts a caller-pinned dictionary directly.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use sealpack_kernel::codec::encode::sort_dictionary;
use sealpack_kernel::codec::wire::WIDE_TOKEN_LEN;
use sealpack_kernel::text::cmp_utf16;

/// One candidate token with its observed frequency and estimated savings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRank {
    pub token: String,
    pub frequency: usize,
    /// Bytes saved by referencing every occurrence instead of emitting it raw.
    pub savings: i64,
}

/// Pluggable dictionary builder.
pub trait DictionaryStrategy: Send + Sync {
    /// Rank candidate tokens of `text`, best first.
    fn rank(&self, text: &str) -> Vec<TokenRank>;

    /// Keep the best `max_entries` of `ranks` and return them in canonical order.
    fn select(&self, ranks: Vec<TokenRank>, max_entries: usize) -> Vec<String> {
        let chosen = ranks
            .into_iter()
            .take(max_entries)
            .map(|r| r.token)
            .collect();
        sort_dictionary(chosen)
    }

    /// Rank then select.
    fn build(&self, text: &str, max_entries: usize) -> Vec<String> {
        self.select(self.rank(text), max_entries)
    }
}

/// Identifier, whitespace, string-literal, number and punctuation scanner.
const TOKEN_PATTERN: &str = concat!(
    r#""(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'"#,
    r"|[A-Za-z_][A-Za-z0-9_]*",
    r"|[0-9]+",
    r"|[ \t]+",
    r"|\n+",
    r#"|[^\sA-Za-z0-9_"']+"#,
);

/// Default strategy: frequency times per-occurrence savings.
#[derive(Debug, Clone)]
pub struct FrequencyStrategy {
    pattern: Regex,
    min_frequency: usize,
}

impl FrequencyStrategy {
    /// # Errors
    ///
    /// Returns the regex compile error (never expected for the built-in pattern).
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(TOKEN_PATTERN)?,
            min_frequency: 2,
        })
    }

    /// Tokens seen fewer than `n` times are ignored.
    #[must_use]
    pub fn with_min_frequency(mut self, n: usize) -> Self {
        self.min_frequency = n.max(1);
        self
    }
}

/// Bytes needed to emit `token` without the dictionary.
fn raw_cost(token: &str) -> i64 {
    token
        .encode_utf16()
        .map(|u| if u < 0x80 { 1 } else { 3 })
        .sum()
}

impl DictionaryStrategy for FrequencyStrategy {
    fn rank(&self, text: &str) -> Vec<TokenRank> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for m in self.pattern.find_iter(text) {
            *counts.entry(m.as_str()).or_insert(0) += 1;
        }
        let reference_cost = i64::try_from(WIDE_TOKEN_LEN).unwrap_or(i64::MAX);
        let mut ranks: Vec<TokenRank> = counts
            .into_iter()
            .filter(|(_, freq)| *freq >= self.min_frequency)
            .filter_map(|(token, frequency)| {
                let per_use = raw_cost(token) - reference_cost;
                let savings = i64::try_from(frequency).ok()?.checked_mul(per_use)?;
                (savings > 0).then(|| TokenRank {
                    token: token.to_string(),
                    frequency,
                    savings,
                })
            })
            .collect();
        ranks.sort_by(|a, b| {
            b.savings
                .cmp(&a.savings)
                .then_with(|| cmp_utf16(&a.token, &b.token))
        });
        tracing::debug!(candidates = ranks.len(), "ranked dictionary tokens");
        ranks
    }
}
