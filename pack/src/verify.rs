//! Reference verifier: an ordered, fail-first state machine over pack JSON.
//!
//! The verifier reads the raw `serde_json::Value`, never the typed model, so
//! that every malformed shape maps to a precise registry code instead of a
//! generic parse failure. Phases run strictly in this order and the first
//! failing check anywhere is the only error reported:
//!
//! 1. policy: the policy validates itself
//! 2. pack: top-level structure, allow-lists, metadata, bounds
//! 3. dict: dictionary structure and size bounds
//! 4. block: per block, ascending index
//! 5. hash: pack, then dict, then every block identity hash
//! 6. decode: strict base64, the decode law, output bounds, roundtrip
//! 7. proof: witness shape and bindings
//!
//! Reordering any check changes which error a malformed pack produces, and
//! that outcome must match other implementations bit for bit.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use sealpack_kernel::codec::decode::{decode, DecodeError, DecodeLimits, DecodeTable};
use sealpack_kernel::proof::canon::canonical_json_bytes_without;
use sealpack_kernel::proof::hash::{HashProvider, Sha256Provider};
use sealpack_kernel::text::{units_to_string_lossy, utf16_len};

use crate::artifact::ArtifactKind;
use crate::edges::{validate_edges, EdgesViolation};
use crate::error::{ErrorCode, Phase, VerifyError};
use crate::model::{
    is_valid_created_utc, is_valid_lane_id, BLOCK_HASH_FIELD, BLOCK_TYPE, DICT_HASH_FIELD,
    DICT_TYPE, FORMAT_VERSION, PACK_HASH_FIELD, PACK_TYPE, PROOF_TYPE,
};
use crate::policy::Policy;
use crate::witness::blocks_digest;

const KNOWN_PACK_FIELDS: &[&str] = &[
    "type",
    "version",
    "mode",
    "encoding",
    "created_utc",
    "dict",
    "blocks",
    "proof",
    "pack_hash",
];

const KNOWN_BLOCK_FIELDS: &[&str] = &[
    "type",
    "version",
    "mode",
    "encoding",
    "lane_id",
    "source_hash",
    "dict_hash",
    "b64",
    "block_hash",
    "edges",
];

/// Proof fields that must be strings. `ok` must be a boolean.
const WITNESS_STRING_FIELDS: &[&str] = &[
    "engine",
    "source_hash",
    "dict_hash",
    "block_hash",
    "roundtrip_hash",
];

/// Summary of a pack that passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyOk {
    pub pack_hash: String,
    pub dict_hash: String,
    pub block_count: usize,
}

/// Outcome of one verification.
pub type VerifyResult = Result<VerifyOk, VerifyError>;

/// A verified pack together with its decoded lanes, in block order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPack {
    pub verified: VerifyOk,
    /// Decoded text per block. Unpaired surrogates are rendered as U+FFFD.
    pub lanes: Vec<String>,
}

/// Verify `pack` under `policy` with the default SHA-256 provider.
///
/// # Errors
///
/// Returns the first failing check as a [`VerifyError`]. A failed hash
/// self-test is `canon_hash_failed`.
pub fn verify(pack: &Value, policy: &Policy) -> VerifyResult {
    let provider = default_provider()?;
    verify_with_provider(pack, policy, &provider)
}

/// Verify `pack` with a caller-supplied hash primitive.
///
/// # Errors
///
/// Returns the first failing check as a [`VerifyError`].
pub fn verify_with_provider(
    pack: &Value,
    policy: &Policy,
    provider: &dyn HashProvider,
) -> VerifyResult {
    run(pack, policy, provider).map(|(ok, _)| ok)
}

/// Verify `pack`, then hand back its decoded lanes.
///
/// Decoding is only ever exposed for packs that verify.
///
/// # Errors
///
/// As [`verify`].
pub fn verify_and_decode(pack: &Value, policy: &Policy) -> Result<DecodedPack, VerifyError> {
    let provider = default_provider()?;
    let (verified, lanes) = run(pack, policy, &provider)?;
    Ok(DecodedPack {
        verified,
        lanes: lanes.iter().map(|u| units_to_string_lossy(u)).collect(),
    })
}

/// Parse and verify pack JSON text.
///
/// # Errors
///
/// Unparseable input is `canon_invalid_json` in phase `pack`; otherwise as
/// [`verify`].
pub fn verify_json_str(json: &str, policy: &Policy) -> VerifyResult {
    verify_json_slice(json.as_bytes(), policy)
}

/// Parse and verify raw pack bytes.
///
/// Bytes that are not UTF-8 are rejected as `canon_invalid_json`, never
/// repaired.
///
/// # Errors
///
/// As [`verify_json_str`].
pub fn verify_json_slice(bytes: &[u8], policy: &Policy) -> VerifyResult {
    policy.validate()?;
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        VerifyError::new(
            ErrorCode::CanonInvalidJson,
            Phase::Pack,
            format!("pack is not valid JSON: {e}"),
        )
    })?;
    verify(&value, policy)
}

/// Awaited form of [`verify`], run on the tokio blocking pool.
///
/// Outside a runtime the work happens inline. The outcome is identical to
/// the blocking form.
///
/// # Errors
///
/// As [`verify`], plus `decode_internal` if the blocking task panicked.
pub async fn verify_async(pack: Value, policy: Policy) -> VerifyResult {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle
            .spawn_blocking(move || verify(&pack, &policy))
            .await
            .map_err(|e| {
                VerifyError::new(
                    ErrorCode::DecodeInternal,
                    Phase::Decode,
                    format!("verification worker failed: {e}"),
                )
            })?,
        Err(_) => verify(&pack, &policy),
    }
}

/// Verify independent packs in parallel. Results are in input order.
#[must_use]
pub fn verify_batch(packs: &[Value], policy: &Policy) -> Vec<VerifyResult> {
    packs.par_iter().map(|pack| verify(pack, policy)).collect()
}

fn default_provider() -> Result<Sha256Provider, VerifyError> {
    Sha256Provider::new()
        .map_err(|e| VerifyError::new(ErrorCode::CanonHashFailed, Phase::Hash, e.to_string()))
}

fn run(
    pack: &Value,
    policy: &Policy,
    provider: &dyn HashProvider,
) -> Result<(VerifyOk, Vec<Vec<u16>>), VerifyError> {
    let result = Verifier { policy, provider }.run(pack);
    match &result {
        Ok((ok, _)) => tracing::info!(
            pack_hash = %ok.pack_hash,
            block_count = ok.block_count,
            "pack verified"
        ),
        Err(e) => tracing::warn!(
            code = %e.code,
            phase = e.phase.as_str(),
            block_index = ?e.location.block_index,
            "pack verification failed: {}",
            e.message
        ),
    }
    result
}

struct PackView<'p> {
    root: &'p Map<String, Value>,
    pack_hash: &'p str,
}

struct DictView<'p> {
    value: &'p Value,
    entries: &'p [Value],
    dict_hash: &'p str,
    source_hash: Option<&'p str>,
}

struct BlockView<'p> {
    value: &'p Value,
    b64: &'p str,
    block_hash: &'p str,
    source_hash: Option<&'p str>,
}

struct Verifier<'a> {
    policy: &'a Policy,
    provider: &'a dyn HashProvider,
}

impl Verifier<'_> {
    fn run(&self, pack: &Value) -> Result<(VerifyOk, Vec<Vec<u16>>), VerifyError> {
        self.policy.validate()?;

        tracing::debug!(phase = Phase::Pack.as_str(), "checking");
        let view = self.check_pack(pack)?;

        tracing::debug!(phase = Phase::Dict.as_str(), "checking");
        let dict = self.check_dict(view.root)?;

        tracing::debug!(phase = Phase::Block.as_str(), "checking");
        let blocks = view
            .root
            .get("blocks")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .enumerate()
            .map(|(index, block)| self.check_block(index, block, &dict))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(phase = Phase::Hash.as_str(), "checking");
        self.check_hashes(pack, &view, &dict, &blocks)?;

        tracing::debug!(phase = Phase::Decode.as_str(), "checking");
        let lanes = self.decode_blocks(&dict, &blocks)?;

        tracing::debug!(phase = Phase::Proof.as_str(), "checking");
        self.check_proof(view.root, &dict, &blocks, &lanes)?;

        Ok((
            VerifyOk {
                pack_hash: view.pack_hash.to_string(),
                dict_hash: dict.dict_hash.to_string(),
                block_count: blocks.len(),
            },
            lanes,
        ))
    }

    // -----------------------------------------------------------------------
    // Phase: pack
    // -----------------------------------------------------------------------

    fn check_pack<'p>(&self, pack: &'p Value) -> Result<PackView<'p>, VerifyError> {
        const P: Phase = Phase::Pack;
        let fail = |code, path: &str, msg: String| VerifyError::new(code, P, msg).at_path(path);

        let root = pack
            .as_object()
            .ok_or_else(|| VerifyError::new(ErrorCode::PackMissing, P, "pack is not a JSON object"))?;
        if !is_kind(root, ArtifactKind::Pack) {
            return Err(fail(
                ArtifactKind::Pack.type_invalid_code(),
                "/type",
                format!("pack type must be {PACK_TYPE:?}"),
            ));
        }
        if root.get("version").and_then(Value::as_u64) != Some(FORMAT_VERSION) {
            return Err(fail(
                ErrorCode::PackVersionUnsupported,
                "/version",
                format!("pack version must be {FORMAT_VERSION}"),
            ));
        }
        if !allowed(&self.policy.allowed_modes, root.get("mode")) {
            return Err(fail(
                ErrorCode::PackModeMismatch,
                "/mode",
                "pack mode is not allowed".to_string(),
            ));
        }
        if !allowed(&self.policy.allowed_encodings, root.get("encoding")) {
            return Err(fail(
                ErrorCode::PackEncodingMismatch,
                "/encoding",
                "pack encoding is not allowed".to_string(),
            ));
        }
        if let Some(ts) = root.get("created_utc") {
            if !ts.as_str().is_some_and(is_valid_created_utc) {
                return Err(fail(
                    ErrorCode::PackCreatedUtcInvalid,
                    "/created_utc",
                    format!("created_utc is not an RFC 3339 UTC timestamp: {ts}"),
                ));
            }
        }
        let blocks = root
            .get("blocks")
            .and_then(Value::as_array)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                fail(
                    ErrorCode::PackBlocksMissing,
                    "/blocks",
                    "blocks must be a non-empty array".to_string(),
                )
            })?;
        if self.policy.require_proof && !root.get("proof").is_some_and(|p| !p.is_null()) {
            return Err(fail(
                ErrorCode::PackProofMissing,
                "/proof",
                "policy requires a proof".to_string(),
            ));
        }
        let pack_hash = non_empty_str(root, PACK_HASH_FIELD).ok_or_else(|| {
            fail(
                ErrorCode::PackShaMissing,
                "/pack_hash",
                "pack_hash must be a non-empty string".to_string(),
            )
        })?;
        if !self.policy.allow_unknown_pack_fields {
            if let Some(key) = first_unknown(root, KNOWN_PACK_FIELDS) {
                return Err(fail(
                    ErrorCode::PackFieldForbidden,
                    &format!("/{key}"),
                    format!("unknown pack field {key:?}"),
                ));
            }
        }
        if blocks.len() > self.policy.max_blocks {
            return Err(fail(
                ErrorCode::PolicyBudgetExhausted,
                "/blocks",
                format!(
                    "{} blocks exceed maxBlocks {}",
                    blocks.len(),
                    self.policy.max_blocks
                ),
            ));
        }
        Ok(PackView { root, pack_hash })
    }

    // -----------------------------------------------------------------------
    // Phase: dict
    // -----------------------------------------------------------------------

    fn check_dict<'p>(&self, root: &'p Map<String, Value>) -> Result<DictView<'p>, VerifyError> {
        const P: Phase = Phase::Dict;
        let fail = |code, path: String, msg: String| VerifyError::new(code, P, msg).at_path(path);

        let value = root.get("dict").filter(|d| !d.is_null()).ok_or_else(|| {
            fail(
                ErrorCode::DictMissing,
                "/dict".to_string(),
                "pack has no dictionary".to_string(),
            )
        })?;
        let obj = value
            .as_object()
            .filter(|o| is_kind(o, ArtifactKind::Dict))
            .ok_or_else(|| {
                fail(
                    ArtifactKind::Dict.type_invalid_code(),
                    "/dict/type".to_string(),
                    format!("dictionary type must be {DICT_TYPE:?}"),
                )
            })?;
        let entries = obj.get("dict").and_then(Value::as_array).ok_or_else(|| {
            fail(
                ErrorCode::DictTypeInvalid,
                "/dict/dict".to_string(),
                "dictionary entries must be an array".to_string(),
            )
        })?;
        if obj.get("version").and_then(Value::as_u64) != Some(FORMAT_VERSION) {
            return Err(fail(
                ErrorCode::DictVersionUnsupported,
                "/dict/version".to_string(),
                format!("dictionary version must be {FORMAT_VERSION}"),
            ));
        }
        if !allowed(&self.policy.allowed_modes, obj.get("mode")) {
            return Err(fail(
                ErrorCode::PackModeMismatch,
                "/dict/mode".to_string(),
                "dictionary mode is not allowed".to_string(),
            ));
        }
        if !allowed(&self.policy.allowed_encodings, obj.get("encoding")) {
            return Err(fail(
                ErrorCode::PackEncodingMismatch,
                "/dict/encoding".to_string(),
                "dictionary encoding is not allowed".to_string(),
            ));
        }
        let dict_hash = non_empty_str(obj, DICT_HASH_FIELD).ok_or_else(|| {
            fail(
                ErrorCode::DictShaMissing,
                "/dict/dict_hash".to_string(),
                "dict_hash must be a non-empty string".to_string(),
            )
        })?;
        let limit = self.policy.dict_entry_limit();
        if entries.len() > limit {
            return Err(fail(
                ErrorCode::DictSizeExceedsLimit,
                "/dict/dict".to_string(),
                format!("{} entries exceed the limit of {limit}", entries.len()),
            ));
        }
        if let Some(i) = entries.iter().position(|e| !e.is_string()) {
            return Err(fail(
                ErrorCode::DictEntryTypeInvalid,
                format!("/dict/dict/{i}"),
                format!("dictionary entry {i} is not a string"),
            ));
        }
        let max_units = self.policy.max_dict_entry_units;
        if let Some(i) = entries
            .iter()
            .position(|e| e.as_str().map_or(0, utf16_len) > max_units)
        {
            return Err(fail(
                ErrorCode::DictEntryExceedsLimit,
                format!("/dict/dict/{i}"),
                format!("dictionary entry {i} exceeds {max_units} code units"),
            ));
        }
        Ok(DictView {
            value,
            entries,
            dict_hash,
            source_hash: str_field(obj, "source_hash"),
        })
    }

    // -----------------------------------------------------------------------
    // Phase: block
    // -----------------------------------------------------------------------

    fn check_block<'p>(
        &self,
        index: usize,
        value: &'p Value,
        dict: &DictView<'_>,
    ) -> Result<BlockView<'p>, VerifyError> {
        const P: Phase = Phase::Block;
        let fail = |code, field: &str, msg: String| {
            VerifyError::new(code, P, msg)
                .at_block(index)
                .at_path(format!("/blocks/{index}{field}"))
        };

        let obj = value
            .as_object()
            .filter(|o| is_kind(o, ArtifactKind::Block))
            .ok_or_else(|| {
                fail(
                    ArtifactKind::Block.type_invalid_code(),
                    "/type",
                    format!("block type must be {BLOCK_TYPE:?}"),
                )
            })?;
        if obj.get("version").and_then(Value::as_u64) != Some(FORMAT_VERSION) {
            return Err(fail(
                ErrorCode::BlockTypeInvalid,
                "/version",
                format!("block version must be {FORMAT_VERSION}"),
            ));
        }
        if !allowed(&self.policy.allowed_modes, obj.get("mode")) {
            return Err(fail(
                ErrorCode::BlockModeMismatch,
                "/mode",
                "block mode is not allowed".to_string(),
            ));
        }
        if !allowed(&self.policy.allowed_encodings, obj.get("encoding")) {
            return Err(fail(
                ErrorCode::BlockEncodingMismatch,
                "/encoding",
                "block encoding is not allowed".to_string(),
            ));
        }
        let b64 = str_field(obj, "b64").ok_or_else(|| {
            fail(
                ErrorCode::BlockB64Missing,
                "/b64",
                "b64 must be a string".to_string(),
            )
        })?;
        let block_hash = non_empty_str(obj, BLOCK_HASH_FIELD).ok_or_else(|| {
            fail(
                ErrorCode::BlockShaMissing,
                "/block_hash",
                "block_hash must be a non-empty string".to_string(),
            )
        })?;
        let source_hash = non_empty_str(obj, "source_hash");
        if self.policy.require_roundtrip && source_hash.is_none() {
            return Err(fail(
                ErrorCode::BlockSourceShaMissing,
                "/source_hash",
                "policy requires a source_hash for roundtrip".to_string(),
            ));
        }
        let link = non_empty_str(obj, DICT_HASH_FIELD).ok_or_else(|| {
            fail(
                ErrorCode::BlockDictLinkMissing,
                "/dict_hash",
                "block has no dictionary link".to_string(),
            )
        })?;
        if link != dict.dict_hash {
            return Err(fail(
                ErrorCode::BlockDictLinkMismatch,
                "/dict_hash",
                "block links to a different dictionary".to_string(),
            ));
        }
        if !self.policy.allow_unknown_block_fields {
            if let Some(key) = first_unknown(obj, KNOWN_BLOCK_FIELDS) {
                return Err(fail(
                    ErrorCode::PackFieldForbidden,
                    &format!("/{key}"),
                    format!("unknown block field {key:?}"),
                ));
            }
        }
        if let Some(id) = obj.get("lane_id") {
            if !id.as_str().is_some_and(is_valid_lane_id) {
                return Err(fail(
                    ErrorCode::BlockLaneIdInvalid,
                    "/lane_id",
                    format!("invalid lane_id {id}"),
                ));
            }
        }
        if let Some(edges) = obj.get("edges") {
            if !self.policy.allow_edges {
                return Err(fail(
                    ErrorCode::PolicyDisabledFeature,
                    "/edges",
                    "policy disallows edges".to_string(),
                ));
            }
            validate_edges(edges, dict.entries.len(), self.policy.max_edges).map_err(|v| {
                let code = match v {
                    EdgesViolation::TooMany { .. } => ErrorCode::BlockEdgesExceedsLimit,
                    EdgesViolation::NotArray | EdgesViolation::BadEntry { .. } => {
                        ErrorCode::BlockEdgesInvalid
                    }
                };
                fail(code, "/edges", v.to_string())
            })?;
        }
        Ok(BlockView {
            value,
            b64,
            block_hash,
            source_hash,
        })
    }

    // -----------------------------------------------------------------------
    // Phase: hash
    // -----------------------------------------------------------------------

    fn check_hashes(
        &self,
        pack: &Value,
        view: &PackView<'_>,
        dict: &DictView<'_>,
        blocks: &[BlockView<'_>],
    ) -> Result<(), VerifyError> {
        const P: Phase = Phase::Hash;

        if self.identity(pack, PACK_HASH_FIELD)? != view.pack_hash {
            return Err(VerifyError::new(
                ErrorCode::PackShaMismatch,
                P,
                "recomputed pack hash does not match pack_hash",
            )
            .at_path("/pack_hash"));
        }
        if self.identity(dict.value, DICT_HASH_FIELD)? != dict.dict_hash {
            return Err(VerifyError::new(
                ErrorCode::DictShaMismatch,
                P,
                "recomputed dictionary hash does not match dict_hash",
            )
            .at_path("/dict/dict_hash"));
        }
        for (index, block) in blocks.iter().enumerate() {
            if self.identity(block.value, BLOCK_HASH_FIELD)? != block.block_hash {
                return Err(VerifyError::new(
                    ErrorCode::BlockShaMismatch,
                    P,
                    "recomputed block hash does not match block_hash",
                )
                .at_block(index)
                .at_path(format!("/blocks/{index}/block_hash")));
            }
        }
        Ok(())
    }

    fn identity(&self, value: &Value, hash_field: &str) -> Result<String, VerifyError> {
        let bytes = canonical_json_bytes_without(value, hash_field).map_err(|e| {
            VerifyError::new(ErrorCode::CanonInvalidJson, Phase::Hash, e.to_string())
        })?;
        Ok(self.provider.sha256_hex(&bytes))
    }

    // -----------------------------------------------------------------------
    // Phase: decode
    // -----------------------------------------------------------------------

    fn decode_blocks(
        &self,
        dict: &DictView<'_>,
        blocks: &[BlockView<'_>],
    ) -> Result<Vec<Vec<u16>>, VerifyError> {
        const P: Phase = Phase::Decode;
        let table = DecodeTable::from_json(dict.entries);
        // Each block is bounded on its own.
        let limits = DecodeLimits {
            max_output_units: self.policy.max_output_units,
        };
        let mut lanes = Vec::with_capacity(blocks.len());

        for (index, block) in blocks.iter().enumerate() {
            let fail = |code, field: &str, msg: String| {
                VerifyError::new(code, P, msg)
                    .at_block(index)
                    .at_path(format!("/blocks/{index}{field}"))
            };
            if block.b64.len() > self.policy.max_block_b64_bytes {
                return Err(fail(
                    ErrorCode::DecodeInputLimit,
                    "/b64",
                    format!(
                        "b64 length {} exceeds maxBlockB64Bytes {}",
                        block.b64.len(),
                        self.policy.max_block_b64_bytes
                    ),
                ));
            }
            let bytes = STANDARD
                .decode(block.b64)
                .map_err(|e| fail(ErrorCode::BlockB64Invalid, "/b64", format!("invalid base64: {e}")))?;
            let units = decode(&table, &bytes, &limits).map_err(|e| {
                fail(decode_error_code(&e), "/b64", e.to_string()).at_offset(e.offset())
            })?;

            if self.policy.require_roundtrip {
                let got = self.units_hash(&units);
                if Some(got.as_str()) != block.source_hash {
                    return Err(fail(
                        ErrorCode::PolicyRoundtripRequired,
                        "/source_hash",
                        "decoded text does not hash to source_hash".to_string(),
                    ));
                }
            }
            tracing::debug!(block = index, output_units = units.len(), "decoded block");
            lanes.push(units);
        }
        Ok(lanes)
    }

    fn units_hash(&self, units: &[u16]) -> String {
        self.provider
            .sha256_hex(units_to_string_lossy(units).as_bytes())
    }

    // -----------------------------------------------------------------------
    // Phase: proof
    // -----------------------------------------------------------------------

    fn check_proof(
        &self,
        root: &Map<String, Value>,
        dict: &DictView<'_>,
        blocks: &[BlockView<'_>],
        lanes: &[Vec<u16>],
    ) -> Result<(), VerifyError> {
        const P: Phase = Phase::Proof;
        let fail = |code, field: &str, msg: String| {
            VerifyError::new(code, P, msg).at_path(format!("/proof{field}"))
        };

        // Absent is only reachable when the policy does not require a proof.
        let Some(proof) = root.get("proof").filter(|p| !p.is_null()) else {
            return Ok(());
        };
        let obj = proof
            .as_object()
            .filter(|o| is_kind(o, ArtifactKind::Proof))
            .ok_or_else(|| {
                fail(
                    ArtifactKind::Proof.type_invalid_code(),
                    "/type",
                    format!("proof type must be {PROOF_TYPE:?}"),
                )
            })?;
        if obj.get("version").and_then(Value::as_u64) != Some(FORMAT_VERSION) {
            return Err(fail(
                ErrorCode::ProofVersionUnsupported,
                "/version",
                format!("proof version must be {FORMAT_VERSION}"),
            ));
        }
        if let Some(missing) = WITNESS_STRING_FIELDS
            .iter()
            .find(|f| str_field(obj, f).is_none())
        {
            return Err(fail(
                ErrorCode::ProofWitnessMissing,
                &format!("/{missing}"),
                format!("proof.{missing} must be a string"),
            ));
        }
        let ok = obj.get("ok").and_then(Value::as_bool).ok_or_else(|| {
            fail(
                ErrorCode::ProofWitnessMissing,
                "/ok",
                "proof.ok must be a boolean".to_string(),
            )
        })?;
        let witness = |name: &str| str_field(obj, name).unwrap_or_default();

        let roundtrip = self.units_hash(&lanes.concat());
        if witness("roundtrip_hash") != roundtrip {
            return Err(fail(
                ErrorCode::ProofRoundtripShaMismatch,
                "/roundtrip_hash",
                "roundtrip_hash does not match the decoded pack".to_string(),
            ));
        }
        let source = witness("source_hash");
        if Some(source) != dict.source_hash || source != roundtrip {
            return Err(fail(
                ErrorCode::ProofSourceShaMismatch,
                "/source_hash",
                "source_hash does not match the dictionary source or the decoded pack".to_string(),
            ));
        }
        if witness("dict_hash") != dict.dict_hash {
            return Err(fail(
                ErrorCode::BlockDictLinkMismatch,
                "/dict_hash",
                "proof is bound to a different dictionary".to_string(),
            ));
        }
        if witness("block_hash") != self.blocks_digest(blocks)? {
            return Err(fail(
                ErrorCode::BlockShaMismatch,
                "/block_hash",
                "proof is bound to different blocks".to_string(),
            ));
        }
        if !ok {
            return Err(fail(
                ErrorCode::ProofOkFalse,
                "/ok",
                "proof records a failed roundtrip".to_string(),
            ));
        }
        Ok(())
    }

    fn blocks_digest(&self, blocks: &[BlockView<'_>]) -> Result<String, VerifyError> {
        let hashes: Vec<&str> = blocks.iter().map(|b| b.block_hash).collect();
        blocks_digest(self.provider, &hashes).map_err(|e| {
            VerifyError::new(ErrorCode::CanonInvalidJson, Phase::Proof, e.to_string())
        })
    }
}

fn decode_error_code(e: &DecodeError) -> ErrorCode {
    match e {
        DecodeError::InvalidByte { .. } => ErrorCode::DecodeInvalidByte,
        DecodeError::TruncatedSequence { .. } => ErrorCode::DecodeTruncatedSequence,
        DecodeError::DictIndexOob { .. } => ErrorCode::DecodeDictIndexOob,
        DecodeError::DictEntryInvalid { .. } => ErrorCode::DecodeDictEntryInvalid,
        DecodeError::OutputLimit { .. } => ErrorCode::DecodeOutputLimit,
    }
}

/// Whether `obj` carries exactly the `type` tag of `kind`.
fn is_kind(obj: &Map<String, Value>, kind: ArtifactKind) -> bool {
    str_field(obj, "type").and_then(ArtifactKind::from_type_tag) == Some(kind)
}

fn str_field<'p>(obj: &'p Map<String, Value>, key: &str) -> Option<&'p str> {
    obj.get(key).and_then(Value::as_str)
}

fn non_empty_str<'p>(obj: &'p Map<String, Value>, key: &str) -> Option<&'p str> {
    str_field(obj, key).filter(|s| !s.is_empty())
}

fn allowed(list: &[String], value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|v| list.iter().any(|a| a == v))
}

/// First key (in sorted order) that is not in `known`.
fn first_unknown<'p>(obj: &'p Map<String, Value>, known: &[&str]) -> Option<&'p str> {
    let mut unknown: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|k| !known.contains(k))
        .collect();
    unknown.sort_unstable();
    unknown.first().copied()
}
