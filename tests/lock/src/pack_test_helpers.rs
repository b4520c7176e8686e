//! Helpers for sealing packs and mutating them without tripping the wrong check.
//!
//! A negative test usually wants one specific failure. Editing a field of a
//! sealed pack also breaks every identity hash above it, and the hash phase
//! would then fire first. [`reseal`] recomputes `dict_hash`, every
//! `block_hash` and `pack_hash` bottom-up so only the intended defect remains.
//! Block-to-dictionary links and proof fields are left as they are.

use sealpack_kernel::proof::hash::identity_hash;
use sealpack_pack::model::{BLOCK_HASH_FIELD, DICT_HASH_FIELD, PACK_HASH_FIELD};
use sealpack_pack::seal::{Lane, PackBuilder};

/// Text with repeated identifiers, punctuation and a non-ASCII tail.
pub const SAMPLE_TEXT: &str = "fn main() {\n    let total = count + count;\n    println!(\"{total}\");\n}\n// résumé ✓\n";

/// Seal `text` as one lane with the default builder.
///
/// # Panics
///
/// Panics if sealing fails. Test-only.
pub fn seal_value(text: &str) -> serde_json::Value {
    let pack = PackBuilder::new().unwrap().seal(text).unwrap();
    pack.to_value().unwrap()
}

/// Seal `lanes` against a pinned dictionary.
///
/// # Panics
///
/// Panics if sealing fails. Test-only.
pub fn seal_pinned(lanes: &[Lane], dictionary: &[&str]) -> serde_json::Value {
    let dictionary = dictionary.iter().map(ToString::to_string).collect();
    let pack = PackBuilder::new()
        .unwrap()
        .seal_with_dictionary(lanes, dictionary)
        .unwrap();
    pack.to_value().unwrap()
}

/// Recompute every identity hash of `pack` in place.
///
/// # Panics
///
/// Panics if the pack lacks the objects being rehashed. Test-only.
pub fn reseal(pack: &mut serde_json::Value) {
    if pack["dict"].is_object() {
        let dict_hash = identity_hash(&pack["dict"], DICT_HASH_FIELD).unwrap();
        pack["dict"][DICT_HASH_FIELD] = serde_json::json!(dict_hash);
    }
    if let Some(blocks) = pack["blocks"].as_array_mut() {
        for block in blocks.iter_mut().filter(|b| b.is_object()) {
            let block_hash = identity_hash(block, BLOCK_HASH_FIELD).unwrap();
            block[BLOCK_HASH_FIELD] = serde_json::json!(block_hash);
        }
    }
    let pack_hash = identity_hash(pack, PACK_HASH_FIELD).unwrap();
    pack[PACK_HASH_FIELD] = serde_json::json!(pack_hash);
}

/// Apply `modify`, then [`reseal`].
pub fn mutate_and_reseal(
    pack: &serde_json::Value,
    modify: impl FnOnce(&mut serde_json::Value),
) -> serde_json::Value {
    let mut pack = pack.clone();
    modify(&mut pack);
    reseal(&mut pack);
    pack
}

/// Independent SHA-256 oracle, not routed through the kernel.
#[must_use]
pub fn oracle_sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealpack_pack::policy::Policy;
    use sealpack_pack::verify::verify;

    #[test]
    fn reseal_keeps_a_clean_pack_valid() {
        let pack = seal_value(SAMPLE_TEXT);
        let resealed = mutate_and_reseal(&pack, |_| {});
        assert_eq!(resealed, pack);
        verify(&resealed, &Policy::default()).unwrap();
    }

    #[test]
    fn oracle_matches_fips_vector() {
        assert_eq!(
            oracle_sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
