//! Verification error registry.
//!
//! Every failed verification produces exactly one [`VerifyError`]. Its
//! [`ErrorCode`] comes from a closed, versioned registry; this module is the
//! single authority for code strings. Adding a code is a single change here:
//! the enum, `as_str()`, `ALL` and `Display` all come from one macro
//! invocation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::ERROR_TYPE;

/// Version tag of the code registry. Bump on any addition or rename.
pub const ERROR_REGISTRY_VERSION: &str = "sealpack.errors.v1";

/// Declares `ErrorCode`, `as_str()`, `ALL`, `from_code()` and `Display` from one list.
macro_rules! define_error_codes {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $code:literal
        ),+ $(,)?
    ) => {
        /// Registry code of a verification failure.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ErrorCode {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl ErrorCode {
            /// The registry string (e.g. `"pack_sha_mismatch"`).
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            /// All codes in declaration order.
            pub const ALL: &[ErrorCode] = &[
                $( Self::$variant, )+
            ];

            /// Look up a code by its registry string.
            #[must_use]
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl core::fmt::Display for ErrorCode {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_error_codes! {
    // -----------------------------------------------------------------------
    // Pack
    // -----------------------------------------------------------------------
    PackMissing => "pack_missing",
    PackTypeInvalid => "pack_type_invalid",
    PackVersionUnsupported => "pack_version_unsupported",
    PackModeMismatch => "pack_mode_mismatch",
    PackEncodingMismatch => "pack_encoding_mismatch",
    PackCreatedUtcInvalid => "pack_created_utc_invalid",
    PackBlocksMissing => "pack_blocks_missing",
    PackProofMissing => "pack_proof_missing",
    PackShaMissing => "pack_sha_missing",
    PackShaMismatch => "pack_sha_mismatch",
    /// Unknown field under a policy that forbids it (pack or block level).
    PackFieldForbidden => "pack_field_forbidden",

    // -----------------------------------------------------------------------
    // Dictionary
    // -----------------------------------------------------------------------
    DictMissing => "dict_missing",
    DictTypeInvalid => "dict_type_invalid",
    DictVersionUnsupported => "dict_version_unsupported",
    DictShaMissing => "dict_sha_missing",
    DictShaMismatch => "dict_sha_mismatch",
    DictSizeExceedsLimit => "dict_size_exceeds_limit",
    DictEntryTypeInvalid => "dict_entry_type_invalid",
    DictEntryExceedsLimit => "dict_entry_exceeds_limit",

    // -----------------------------------------------------------------------
    // Block
    // -----------------------------------------------------------------------
    BlockTypeInvalid => "block_type_invalid",
    BlockModeMismatch => "block_mode_mismatch",
    BlockEncodingMismatch => "block_encoding_mismatch",
    BlockB64Missing => "block_b64_missing",
    BlockB64Invalid => "block_b64_invalid",
    BlockShaMissing => "block_sha_missing",
    BlockShaMismatch => "block_sha_mismatch",
    BlockSourceShaMissing => "block_source_sha_missing",
    BlockDictLinkMissing => "block_dict_link_missing",
    BlockDictLinkMismatch => "block_dict_link_mismatch",
    BlockLaneIdInvalid => "block_lane_id_invalid",
    BlockEdgesInvalid => "block_edges_invalid",
    BlockEdgesExceedsLimit => "block_edges_exceeds_limit",

    // -----------------------------------------------------------------------
    // Decode
    // -----------------------------------------------------------------------
    DecodeInvalidByte => "decode_invalid_byte",
    DecodeTruncatedSequence => "decode_truncated_sequence",
    DecodeDictIndexOob => "decode_dict_index_oob",
    DecodeDictEntryInvalid => "decode_dict_entry_invalid",
    DecodeOutputLimit => "decode_output_limit",
    DecodeInputLimit => "decode_input_limit",
    /// Host fault (worker panic); never produced by malformed input.
    DecodeInternal => "decode_internal",

    // -----------------------------------------------------------------------
    // Proof
    // -----------------------------------------------------------------------
    ProofTypeInvalid => "proof_type_invalid",
    ProofVersionUnsupported => "proof_version_unsupported",
    ProofWitnessMissing => "proof_witness_missing",
    ProofRoundtripShaMismatch => "proof_roundtrip_sha_mismatch",
    ProofSourceShaMismatch => "proof_source_sha_mismatch",
    ProofOkFalse => "proof_ok_false",

    // -----------------------------------------------------------------------
    // Canonicalization
    // -----------------------------------------------------------------------
    CanonInvalidJson => "canon_invalid_json",
    CanonHashFailed => "canon_hash_failed",

    // -----------------------------------------------------------------------
    // Policy
    // -----------------------------------------------------------------------
    PolicyRoundtripRequired => "policy_roundtrip_required",
    PolicyUnknownEncoding => "policy_unknown_encoding",
    PolicyDisabledFeature => "policy_disabled_feature",
    PolicyBudgetExhausted => "policy_budget_exhausted",
}

impl ErrorCode {
    /// Phase a code is reported in when no more specific phase applies.
    ///
    /// Several codes are reused across phases (`pack_mode_mismatch` in the
    /// dictionary phase, `block_sha_mismatch` in the proof phase), so the
    /// verifier always states the phase explicitly; this is the family default.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match *self {
            Self::PackShaMismatch
            | Self::DictShaMismatch
            | Self::BlockShaMismatch
            | Self::CanonInvalidJson
            | Self::CanonHashFailed => Phase::Hash,
            Self::BlockB64Invalid | Self::PolicyRoundtripRequired => Phase::Decode,
            code => {
                let name = code.as_str();
                if name.starts_with("pack_") {
                    Phase::Pack
                } else if name.starts_with("dict_") {
                    Phase::Dict
                } else if name.starts_with("block_") {
                    Phase::Block
                } else if name.starts_with("decode_") {
                    Phase::Decode
                } else if name.starts_with("proof_") {
                    Phase::Proof
                } else {
                    Phase::Policy
                }
            }
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_code(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code: {raw}")))
    }
}

/// Verification stage that produced an error, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Policy self-validation, before the pack is read.
    Policy,
    /// Top-level pack structure.
    Pack,
    /// Dictionary structure.
    Dict,
    /// Per-block structure.
    Block,
    /// Canonical hash recomputation.
    Hash,
    /// Base64 + bytecode decode + roundtrip.
    Decode,
    /// Proof witness.
    Proof,
}

impl Phase {
    /// Lowercase phase name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Pack => "pack",
            Self::Dict => "dict",
            Self::Block => "block",
            Self::Hash => "hash",
            Self::Decode => "decode",
            Self::Proof => "proof",
        }
    }
}

/// Severity. v1 has no recoverable class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Fatal,
}

/// Where in the pack the failing check looked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// JSON pointer into the pack (e.g. `/blocks/0/b64`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Index of the block being checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_index: Option<usize>,
    /// Byte offset within the decoded bytecode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<usize>,
}

/// The single structured outcome of a failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyError {
    #[serde(rename = "type")]
    pub kind: String,
    pub registry: String,
    pub code: ErrorCode,
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub location: Location,
}

impl VerifyError {
    #[must_use]
    pub fn new(code: ErrorCode, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            kind: ERROR_TYPE.to_string(),
            registry: ERROR_REGISTRY_VERSION.to_string(),
            code,
            phase,
            severity: Severity::Fatal,
            message: message.into(),
            location: Location::default(),
        }
    }

    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.location.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn at_block(mut self, index: usize) -> Self {
        self.location.block_index = Some(index);
        self
    }

    #[must_use]
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.location.byte_offset = Some(offset);
        self
    }
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.phase.as_str(), self.code, self.message)?;
        if let Some(path) = &self.location.path {
            write!(f, " at {path}")?;
        }
        Ok(())
    }
}

impl std::error::Error for VerifyError {}
