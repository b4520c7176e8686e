//! Verification policy: the bounded configuration surface of the verifier.
//!
//! A policy parameterizes which packs are accepted; it never changes the
//! decode law. Two presets exist and are deliberately distinct:
//! [`Policy::default`] accepts unknown fields, [`Policy::strict`] forbids them.
//!
//! The JSON form uses camelCase option names (`requireRoundtrip`,
//! `maxDictEntries`, ...). Unknown option names are rejected.

use serde::Serialize;
use sealpack_kernel::codec::decode::DEFAULT_MAX_OUTPUT_UNITS;
use sealpack_kernel::codec::wire::MAX_DICT_ENTRIES;

use crate::error::{ErrorCode, Phase, VerifyError};
use crate::model::{ENCODING, MODE};

const DEFAULT_MAX_DICT_ENTRY_UNITS: usize = 1_048_576;
const DEFAULT_MAX_BLOCKS: usize = 1024;
const DEFAULT_MAX_BLOCK_B64_BYTES: usize = 67_108_864;
const DEFAULT_MAX_EDGES: usize = 65_536;

/// Immutable verification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Compare each decoded block against its recorded `source_hash`.
    pub require_roundtrip: bool,
    /// Require a proof object.
    pub require_proof: bool,
    /// Dictionary size bound (never above 65535).
    pub max_dict_entries: usize,
    /// Per-entry length bound, in UTF-16 code units.
    pub max_dict_entry_units: usize,
    pub max_blocks: usize,
    /// Bound on each block's `b64` string length.
    pub max_block_b64_bytes: usize,
    /// Decompression-bomb guard, in UTF-16 code units, across all blocks.
    pub max_output_units: usize,
    /// Bound on each block's edges witness length.
    pub max_edges: usize,
    pub allow_edges: bool,
    pub allow_unknown_pack_fields: bool,
    pub allow_unknown_block_fields: bool,
    pub allowed_modes: Vec<String>,
    pub allowed_encodings: Vec<String>,
    /// Must be `true`; diagnostic collection is not implemented.
    pub fail_on_first_error: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            require_roundtrip: true,
            require_proof: true,
            max_dict_entries: MAX_DICT_ENTRIES,
            max_dict_entry_units: DEFAULT_MAX_DICT_ENTRY_UNITS,
            max_blocks: DEFAULT_MAX_BLOCKS,
            max_block_b64_bytes: DEFAULT_MAX_BLOCK_B64_BYTES,
            max_output_units: DEFAULT_MAX_OUTPUT_UNITS,
            max_edges: DEFAULT_MAX_EDGES,
            allow_edges: true,
            allow_unknown_pack_fields: true,
            allow_unknown_block_fields: true,
            allowed_modes: vec![MODE.to_string()],
            allowed_encodings: vec![ENCODING.to_string()],
            fail_on_first_error: true,
        }
    }
}

/// Error loading a policy from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The configuration is not a JSON object.
    NotAnObject,
    /// An option name this implementation does not recognize.
    UnknownOption { key: String },
    /// A recognized option with a value of the wrong type.
    InvalidValue { key: String, expected: &'static str },
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "policy must be a JSON object"),
            Self::UnknownOption { key } => write!(f, "unknown policy option: {key}"),
            Self::InvalidValue { key, expected } => {
                write!(f, "policy option {key} must be {expected}")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

impl Policy {
    /// Strict profile: the defaults with unknown pack and block fields forbidden.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allow_unknown_pack_fields: false,
            allow_unknown_block_fields: false,
            ..Self::default()
        }
    }

    /// Effective dictionary size bound.
    #[must_use]
    pub fn dict_entry_limit(&self) -> usize {
        self.max_dict_entries.min(MAX_DICT_ENTRIES)
    }

    /// Build a policy from its JSON form, starting from the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] for unknown option names or mistyped values.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, PolicyError> {
        let obj = value.as_object().ok_or(PolicyError::NotAnObject)?;
        let mut policy = Self::default();
        for (key, v) in obj {
            match key.as_str() {
                "requireRoundtrip" => policy.require_roundtrip = bool_opt(key, v)?,
                "requireProof" => policy.require_proof = bool_opt(key, v)?,
                "maxDictEntries" => policy.max_dict_entries = usize_opt(key, v)?,
                "maxDictEntryUnits" => policy.max_dict_entry_units = usize_opt(key, v)?,
                "maxBlocks" => policy.max_blocks = usize_opt(key, v)?,
                "maxBlockB64Bytes" => policy.max_block_b64_bytes = usize_opt(key, v)?,
                "maxOutputUnits" => policy.max_output_units = usize_opt(key, v)?,
                "maxEdges" => policy.max_edges = usize_opt(key, v)?,
                "allowEdges" => policy.allow_edges = bool_opt(key, v)?,
                "allowUnknownPackFields" => policy.allow_unknown_pack_fields = bool_opt(key, v)?,
                "allowUnknownBlockFields" => {
                    policy.allow_unknown_block_fields = bool_opt(key, v)?;
                }
                "allowedModes" => policy.allowed_modes = strings_opt(key, v)?,
                "allowedEncodings" => policy.allowed_encodings = strings_opt(key, v)?,
                "failOnFirstError" => policy.fail_on_first_error = bool_opt(key, v)?,
                _ => return Err(PolicyError::UnknownOption { key: key.clone() }),
            }
        }
        Ok(policy)
    }

    /// Check the policy itself before any pack is read.
    ///
    /// # Errors
    ///
    /// Returns a `policy_*` [`VerifyError`] in phase `policy`.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if !self.fail_on_first_error {
            return Err(VerifyError::new(
                ErrorCode::PolicyDisabledFeature,
                Phase::Policy,
                "failOnFirstError=false (diagnostic collection) is not supported",
            ));
        }
        if self.allowed_modes.is_empty() || self.allowed_modes.iter().any(|m| m != MODE) {
            return Err(VerifyError::new(
                ErrorCode::PolicyUnknownEncoding,
                Phase::Policy,
                format!("allowedModes must only name {MODE:?}, got {:?}", self.allowed_modes),
            ));
        }
        if self.allowed_encodings.is_empty() || self.allowed_encodings.iter().any(|e| e != ENCODING)
        {
            return Err(VerifyError::new(
                ErrorCode::PolicyUnknownEncoding,
                Phase::Policy,
                format!(
                    "allowedEncodings must only name {ENCODING:?}, got {:?}",
                    self.allowed_encodings
                ),
            ));
        }
        if self.max_dict_entries > MAX_DICT_ENTRIES {
            return Err(VerifyError::new(
                ErrorCode::PolicyBudgetExhausted,
                Phase::Policy,
                format!(
                    "maxDictEntries {} exceeds the 16-bit ceiling {MAX_DICT_ENTRIES}",
                    self.max_dict_entries
                ),
            ));
        }
        let zero_bound = [
            ("maxDictEntryUnits", self.max_dict_entry_units),
            ("maxBlocks", self.max_blocks),
            ("maxBlockB64Bytes", self.max_block_b64_bytes),
            ("maxOutputUnits", self.max_output_units),
        ]
        .into_iter()
        .find(|(_, v)| *v == 0);
        if let Some((name, _)) = zero_bound {
            return Err(VerifyError::new(
                ErrorCode::PolicyBudgetExhausted,
                Phase::Policy,
                format!("{name} must be positive"),
            ));
        }
        Ok(())
    }
}

fn bool_opt(key: &str, v: &serde_json::Value) -> Result<bool, PolicyError> {
    v.as_bool().ok_or_else(|| PolicyError::InvalidValue {
        key: key.to_string(),
        expected: "a boolean",
    })
}

fn usize_opt(key: &str, v: &serde_json::Value) -> Result<usize, PolicyError> {
    v.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| PolicyError::InvalidValue {
            key: key.to_string(),
            expected: "a non-negative integer",
        })
}

fn strings_opt(key: &str, v: &serde_json::Value) -> Result<Vec<String>, PolicyError> {
    let invalid = || PolicyError::InvalidValue {
        key: key.to_string(),
        expected: "an array of strings",
    };
    v.as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|s| s.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}
