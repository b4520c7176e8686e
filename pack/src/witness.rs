//! Proof emitter: the reversibility witness bound into every pack.

use sealpack_kernel::proof::canon::{canonical_json_bytes, CanonError};
use sealpack_kernel::proof::hash::HashProvider;
use sealpack_kernel::text::units_to_string_lossy;

use crate::model::{Proof, ENGINE, FORMAT_VERSION, PROOF_TYPE};

/// The value `proof.block_hash` commits to.
///
/// For a single block this is that block's hash. For several it is the hash
/// of the canonical JSON array of block hashes, in block order. The sealer
/// and the verifier both compute it here.
///
/// # Errors
///
/// Propagates [`CanonError`] from canonicalization.
pub fn blocks_digest<S: AsRef<str>>(
    provider: &dyn HashProvider,
    block_hashes: &[S],
) -> Result<String, CanonError> {
    if let [only] = block_hashes {
        return Ok(only.as_ref().to_string());
    }
    let array = serde_json::Value::Array(
        block_hashes
            .iter()
            .map(|h| serde_json::Value::String(h.as_ref().to_string()))
            .collect(),
    );
    Ok(provider.sha256_hex(&canonical_json_bytes(&array)?))
}

/// Build the proof for a sealed pack.
///
/// `roundtrip_units` is the concatenated decoder output of every block. The
/// witness is `ok` exactly when its hash equals `source_hash`.
///
/// # Errors
///
/// Propagates [`CanonError`] from [`blocks_digest`].
pub fn build_proof<S: AsRef<str>>(
    provider: &dyn HashProvider,
    source_hash: &str,
    dict_hash: &str,
    block_hashes: &[S],
    roundtrip_units: &[u16],
) -> Result<Proof, CanonError> {
    let roundtrip_hash = provider.sha256_hex(units_to_string_lossy(roundtrip_units).as_bytes());
    Ok(Proof {
        kind: PROOF_TYPE.to_string(),
        version: FORMAT_VERSION,
        engine: ENGINE.to_string(),
        source_hash: source_hash.to_string(),
        dict_hash: dict_hash.to_string(),
        block_hash: blocks_digest(provider, block_hashes)?,
        ok: roundtrip_hash == source_hash,
        roundtrip_hash,
    })
}
