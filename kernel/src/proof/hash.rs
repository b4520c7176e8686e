//! Content hashing: SHA-256 rendered as 64 lowercase hex characters.
//!
//! **Exactly one place defines hashing.** Every digest in a pack is
//! `sha256_hex(bytes)` over either canonical JSON bytes or UTF-8 text.
//! There is no algorithm prefix and no domain separator: the identity rule
//! must reproduce byte-for-byte in implementations outside Rust.
//!
//! Two paths exist, a blocking one ([`sha256_hex`]) and an awaited one
//! ([`sha256_hex_async`]). They must agree bit-for-bit; the lock tests
//! assert it.

use std::sync::OnceLock;

use sha2::{Digest, Sha256};

use super::canon::{canonical_json_bytes, canonical_json_bytes_without, CanonError};
use crate::text::units_to_string_lossy;

/// Known-answer vector: SHA-256 of `"abc"` (FIPS 180-2, appendix B.1).
const SELF_TEST_INPUT: &[u8] = b"abc";
const SELF_TEST_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

/// Capability seam for the digest primitive.
///
/// The verifier and the pack sealer take a provider so hosts can swap in an
/// accelerated or audited primitive. Whatever is plugged in must produce the
/// same hex as [`Sha256Provider`] for every input.
pub trait HashProvider: Send + Sync {
    /// Lowercase hex SHA-256 of `data`.
    fn sha256_hex(&self, data: &[u8]) -> String;
}

/// The default provider, backed by the `sha2` crate.
///
/// Only [`Sha256Provider::new`] builds one, so every instance has passed the
/// self-test.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Sha256Provider;

impl Sha256Provider {
    /// Construct a provider after the process-wide known-answer self-test.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError::HashFailed`] if the primitive does not reproduce
    /// the FIPS test vector. This is a fatal initialization error; callers
    /// must not fall back to anything else.
    pub fn new() -> Result<Self, CanonError> {
        self_test()?;
        Ok(Self)
    }
}

impl HashProvider for Sha256Provider {
    fn sha256_hex(&self, data: &[u8]) -> String {
        sha256_hex(data)
    }
}

/// Run the known-answer test once per process and cache the outcome.
///
/// # Errors
///
/// Returns [`CanonError::HashFailed`] on a digest mismatch.
pub fn self_test() -> Result<(), CanonError> {
    static OUTCOME: OnceLock<Result<(), CanonError>> = OnceLock::new();
    OUTCOME
        .get_or_init(|| {
            let got = sha256_hex(SELF_TEST_INPUT);
            if got == SELF_TEST_DIGEST {
                Ok(())
            } else {
                tracing::error!(got = %got, "sha256 self-test failed");
                Err(CanonError::HashFailed {
                    detail: format!("self-test digest mismatch: {got}"),
                })
            }
        })
        .clone()
}

/// SHA-256 of `data` as 64 lowercase hex characters.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(raw_sha256(data))
}

/// SHA-256 of `data` as raw 32 bytes.
#[must_use]
pub fn raw_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Awaited form of [`sha256_hex`].
///
/// Inside a tokio runtime the digest runs on the blocking pool; outside one
/// it is computed inline. Either way the output equals [`sha256_hex`].
///
/// # Errors
///
/// Returns [`CanonError::HashFailed`] if the blocking worker panicked or was
/// cancelled.
pub async fn sha256_hex_async(data: Vec<u8>) -> Result<String, CanonError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle
            .spawn_blocking(move || sha256_hex(&data))
            .await
            .map_err(|e| CanonError::HashFailed {
                detail: e.to_string(),
            }),
        Err(_) => Ok(sha256_hex(&data)),
    }
}

/// Hash of UTF-8 text. Used for `source_hash`.
#[must_use]
pub fn text_sha256(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

/// Hash of UTF-16 code units after UTF-8 conversion.
///
/// Unpaired surrogates become U+FFFD, matching a well-formed text encoder.
/// Used for `roundtrip_hash` over decoder output.
#[must_use]
pub fn units_sha256(units: &[u16]) -> String {
    text_sha256(&units_to_string_lossy(units))
}

/// Hash of the canonical JSON form of `value`.
///
/// # Errors
///
/// Propagates [`CanonError`] from canonicalization.
pub fn canonical_sha256(value: &serde_json::Value) -> Result<String, CanonError> {
    Ok(sha256_hex(&canonical_json_bytes(value)?))
}

/// Hash of the canonical JSON form of `value` minus its own hash field.
///
/// `identity_hash(pack, "pack_hash")` is the pack identity.
///
/// # Errors
///
/// Propagates [`CanonError`] from canonicalization.
pub fn identity_hash(value: &serde_json::Value, hash_field: &str) -> Result<String, CanonError> {
    Ok(sha256_hex(&canonical_json_bytes_without(value, hash_field)?))
}
