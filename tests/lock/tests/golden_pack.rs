//! Golden pinned-dictionary packs.
//!
//! These identities are the cross-implementation contract: any conformant
//! encoder sealing the same lanes against the same dictionary must produce
//! exactly these hashes. Regenerate only on a format version bump (see
//! `golden_pack_generator`).

use lock_tests::pack_test_helpers::{oracle_sha256_hex, seal_pinned};
use sealpack_kernel::proof::canon::canonical_json_bytes_without;
use sealpack_pack::policy::Policy;
use sealpack_pack::seal::Lane;
use sealpack_pack::verify::verify;

const HELLO_WORLD_SOURCE: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
const HELLO_WORLD_B64: &str = "gAAAIIAAAQ==";
const HELLO_WORLD_DICT_HASH: &str = "bc4aef8e8f6b704072756efbf367e81b2bc18b6b3908336cabac342fee4c4d49";
const HELLO_WORLD_BLOCK_HASH: &str = "2f9b11a7b6d3600fecad5bfe670e8563495978dfcedaf402f81bc7fa36b0b63a";
const HELLO_WORLD_PACK_HASH: &str = "9010780fa8120af2ca44a1d5aa6edb280ee11d7c3993f7d8794918dcfe4c6c72";

const TWO_LANE_BLOCKS_DIGEST: &str = "98104a867ea28ff0b2b2b33718813c25f3012940e6a247b2b88a359645d73452";
const TWO_LANE_PACK_HASH: &str = "6a88be644dadf2233ca8e7a4936403f5ed1ce2d76c6cdd1dcd19b53607220227";

#[test]
fn hello_world_golden_pack() {
    let pack = seal_pinned(&[Lane::new("hello world")], &["hello", "world"]);

    assert_eq!(pack["dict"]["source_hash"], HELLO_WORLD_SOURCE);
    assert_eq!(pack["blocks"][0]["b64"], HELLO_WORLD_B64);
    assert_eq!(pack["dict"]["dict_hash"], HELLO_WORLD_DICT_HASH);
    assert_eq!(pack["blocks"][0]["block_hash"], HELLO_WORLD_BLOCK_HASH);
    assert_eq!(pack["proof"]["block_hash"], HELLO_WORLD_BLOCK_HASH);
    assert_eq!(pack["proof"]["roundtrip_hash"], HELLO_WORLD_SOURCE);
    assert_eq!(pack["proof"]["ok"], true);
    assert_eq!(pack["pack_hash"], HELLO_WORLD_PACK_HASH);

    let ok = verify(&pack, &Policy::strict()).unwrap();
    assert_eq!(ok.pack_hash, HELLO_WORLD_PACK_HASH);
    assert_eq!(ok.dict_hash, HELLO_WORLD_DICT_HASH);
}

#[test]
fn two_lane_golden_pack() {
    let pack = seal_pinned(
        &[
            Lane::with_id("lane-0", "hello world\n"),
            Lane::with_id("lane-1", "world hello\n"),
        ],
        &["hello", "world"],
    );
    assert_eq!(pack["proof"]["block_hash"], TWO_LANE_BLOCKS_DIGEST);
    assert_eq!(pack["pack_hash"], TWO_LANE_PACK_HASH);
    verify(&pack, &Policy::strict()).unwrap();
}

#[test]
fn golden_identity_matches_independent_oracle() {
    let pack = seal_pinned(&[Lane::new("hello world")], &["hello", "world"]);
    let preimage = canonical_json_bytes_without(&pack, "pack_hash").unwrap();
    assert_eq!(oracle_sha256_hex(&preimage), HELLO_WORLD_PACK_HASH);
    assert_eq!(oracle_sha256_hex(b"hello world"), HELLO_WORLD_SOURCE);

    let text = String::from_utf8(preimage).unwrap();
    assert!(text.starts_with("{\"blocks\":[{\"b64\":\"gAAAIIAAAQ==\""));
    assert!(!text.contains(' '), "canonical form has no whitespace");
}
