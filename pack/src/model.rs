//! Pack object model: dictionary, block, proof, pack.
//!
//! These are value objects. They are assembled once by the sealer and never
//! mutated afterwards; the verifier reads raw JSON instead of these structs so
//! it can report malformed input precisely.
//!
//! JSON shape:
//!
//! ```text
//! pack  {type, version, mode, encoding, created_utc?, dict, blocks[], proof, pack_hash}
//! dict  {type, version, mode, encoding, source_hash, dict[], dict_hash}
//! block {type, version, mode, encoding, lane_id?, source_hash, dict_hash, b64, block_hash, edges?}
//! proof {type, version, engine, source_hash, dict_hash, block_hash, roundtrip_hash, ok}
//! ```

use serde::{Deserialize, Serialize};
use sealpack_kernel::proof::canon::CanonError;
use sealpack_kernel::proof::hash::identity_hash;

/// Type tag of a pack.
pub const PACK_TYPE: &str = "sealpack.pack";
/// Type tag of a dictionary.
pub const DICT_TYPE: &str = "sealpack.dict";
/// Type tag of a block.
pub const BLOCK_TYPE: &str = "sealpack.block";
/// Type tag of a proof.
pub const PROOF_TYPE: &str = "sealpack.proof";
/// Type tag of a serialized verification error.
pub const ERROR_TYPE: &str = "sealpack.error";

/// The only supported format version.
pub const FORMAT_VERSION: u64 = 1;
/// The only supported mode: dictionary-reference bytecode.
pub const MODE: &str = "dict-bytecode";
/// The only supported encoding: UTF-16 units with 16-bit references.
pub const ENCODING: &str = "utf16-ref16";
/// Engine identity recorded in proofs.
pub const ENGINE: &str = "sealpack-engine/1";

/// Self-referential hash field names.
pub const PACK_HASH_FIELD: &str = "pack_hash";
pub const DICT_HASH_FIELD: &str = "dict_hash";
pub const BLOCK_HASH_FIELD: &str = "block_hash";

/// Longest accepted `lane_id`.
pub const MAX_LANE_ID_LEN: usize = 64;

/// Lane ids are 1 to 64 characters of `[A-Za-z0-9._-]`.
#[must_use]
pub fn is_valid_lane_id(id: &str) -> bool {
    (1..=MAX_LANE_ID_LEN).contains(&id.len())
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// `created_utc` must be an RFC 3339 timestamp in UTC, written with a `Z` suffix.
#[must_use]
pub fn is_valid_created_utc(ts: &str) -> bool {
    ts.ends_with('Z') && chrono::DateTime::parse_from_rfc3339(ts).is_ok()
}

/// Shared token dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u64,
    pub mode: String,
    pub encoding: String,
    /// Hash of the full normalized source text the dictionary was built from.
    pub source_hash: String,
    pub dict: Vec<String>,
    pub dict_hash: String,
}

/// Adjacency witness triple: reference `from` directly followed by `to`, `count` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge(pub u16, pub u16, pub u64);

/// One encoded lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u64,
    pub mode: String,
    pub encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane_id: Option<String>,
    /// Hash of this lane's text before encoding.
    pub source_hash: String,
    /// Linkage to the pack dictionary.
    pub dict_hash: String,
    pub b64: String,
    pub block_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<Edge>>,
}

/// Reversibility witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u64,
    pub engine: String,
    pub source_hash: String,
    pub dict_hash: String,
    /// The block hash for one lane, else the digest of all block hashes.
    pub block_hash: String,
    pub roundtrip_hash: String,
    pub ok: bool,
}

/// The sealed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u64,
    pub mode: String,
    pub encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_utc: Option<String>,
    pub dict: Dictionary,
    pub blocks: Vec<Block>,
    pub proof: Proof,
    pub pack_hash: String,
}

impl Pack {
    /// The pack as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError::InvalidJson`] if serialization fails.
    pub fn to_value(&self) -> Result<serde_json::Value, CanonError> {
        to_json(self)
    }

    /// Parse a pack from JSON. Does not verify anything.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError::InvalidJson`] if the shape does not match.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CanonError> {
        serde_json::from_value(value).map_err(|e| CanonError::InvalidJson {
            detail: e.to_string(),
        })
    }
}

/// Serialize any model object to a JSON value.
///
/// # Errors
///
/// Returns [`CanonError::InvalidJson`] if serialization fails.
pub fn to_json<T: Serialize>(item: &T) -> Result<serde_json::Value, CanonError> {
    serde_json::to_value(item).map_err(|e| CanonError::InvalidJson {
        detail: e.to_string(),
    })
}

/// Identity hash of a model object: canonical form minus `hash_field`.
///
/// # Errors
///
/// Propagates [`CanonError`] from serialization or canonicalization.
pub fn identity_of<T: Serialize>(item: &T, hash_field: &str) -> Result<String, CanonError> {
    identity_hash(&to_json(item)?, hash_field)
}
