//! Pack verification through the public entry points.
//!
//! Proves:
//! 1. A replaced `pack_hash` is reported as `pack_sha_mismatch` and nothing else
//! 2. Earlier phases win over later ones when a pack has several defects
//! 3. Default and strict profiles differ only on unknown fields
//! 4. Multi-lane packs verify, decode per lane and bind every block in the proof
//! 5. The 65535-entry dictionary boundary

use lock_tests::pack_test_helpers::{mutate_and_reseal, seal_pinned, seal_value, SAMPLE_TEXT};
use sealpack_kernel::text::normalize_newlines;
use sealpack_pack::error::{ErrorCode, Phase};
use sealpack_pack::policy::Policy;
use sealpack_pack::seal::{split_lanes, Lane, PackBuilder};
use sealpack_pack::verify::{verify, verify_and_decode, verify_batch, verify_json_str};
use serde_json::json;

fn code_of(pack: &serde_json::Value, policy: &Policy) -> (ErrorCode, Phase) {
    let err = verify(pack, policy).unwrap_err();
    (err.code, err.phase)
}

// ---------------------------------------------------------------------------
// Scenario F
// ---------------------------------------------------------------------------

#[test]
fn scenario_f_replaced_pack_hash() {
    let mut pack = seal_value(SAMPLE_TEXT);
    pack["pack_hash"] = json!("not-a-real-hash");
    let err = verify(&pack, &Policy::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::PackShaMismatch);
    assert_eq!(err.phase, Phase::Hash);
    assert_eq!(err.location.path.as_deref(), Some("/pack_hash"));
}

#[test]
fn clean_pack_verifies_under_both_profiles() {
    let pack = seal_value(SAMPLE_TEXT);
    let ok = verify(&pack, &Policy::default()).unwrap();
    assert_eq!(ok, verify(&pack, &Policy::strict()).unwrap());
    assert_eq!(ok.pack_hash, pack["pack_hash"].as_str().unwrap());
    assert_eq!(ok.block_count, 1);
}

// ---------------------------------------------------------------------------
// Phase ordering
// ---------------------------------------------------------------------------

#[test]
fn structural_defect_beats_hash_mismatch() {
    let mut pack = seal_value(SAMPLE_TEXT);
    pack["pack_hash"] = json!("bogus");
    pack["blocks"][0]["mode"] = json!("zstd");
    assert_eq!(
        code_of(&pack, &Policy::default()),
        (ErrorCode::BlockModeMismatch, Phase::Block)
    );
}

#[test]
fn dictionary_defect_beats_block_defect() {
    let mut pack = seal_value(SAMPLE_TEXT);
    pack["blocks"][0]["b64"] = json!(null);
    pack["dict"]["version"] = json!(2);
    assert_eq!(
        code_of(&pack, &Policy::default()),
        (ErrorCode::DictVersionUnsupported, Phase::Dict)
    );
}

#[test]
fn earlier_block_wins() {
    let pack = seal_pinned(
        &[Lane::new("hello\n"), Lane::new("world\n")],
        &["hello", "world"],
    );
    let pack = mutate_and_reseal(&pack, |p| {
        p["blocks"][1]["lane_id"] = json!("bad id!");
        p["blocks"][0]["lane_id"] = json!("");
    });
    let err = verify(&pack, &Policy::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::BlockLaneIdInvalid);
    assert_eq!(err.location.block_index, Some(0));
}

#[test]
fn decode_failure_after_hashes_pass() {
    let pack = seal_value(SAMPLE_TEXT);
    // 0x80 0x00 0x05 references a slot far past a tiny dictionary.
    let pack = mutate_and_reseal(&pack, |p| {
        p["dict"]["dict"] = json!(["x"]);
        p["blocks"][0]["b64"] = json!("gAAF");
    });
    // Relink after the dictionary hash moved.
    let pack = mutate_and_reseal(&pack, |p| {
        let dict_hash = p["dict"]["dict_hash"].clone();
        p["blocks"][0]["dict_hash"] = dict_hash;
    });
    let err = verify(&pack, &Policy::default()).unwrap_err();
    assert_eq!((err.code, err.phase), (ErrorCode::DecodeDictIndexOob, Phase::Decode));
    assert_eq!(err.location.byte_offset, Some(0));
}

#[test]
fn unparseable_text_is_canon_invalid_json() {
    let err = verify_json_str("{\"type\":", &Policy::default()).unwrap_err();
    assert_eq!((err.code, err.phase), (ErrorCode::CanonInvalidJson, Phase::Pack));
}

// ---------------------------------------------------------------------------
// Strict vs default
// ---------------------------------------------------------------------------

#[test]
fn unknown_pack_field_only_fails_strict() {
    let pack = mutate_and_reseal(&seal_value(SAMPLE_TEXT), |p| {
        p["comment"] = json!("added by a downstream tool");
    });
    verify(&pack, &Policy::default()).unwrap();
    let err = verify(&pack, &Policy::strict()).unwrap_err();
    assert_eq!((err.code, err.phase), (ErrorCode::PackFieldForbidden, Phase::Pack));
    assert_eq!(err.location.path.as_deref(), Some("/comment"));
}

#[test]
fn unknown_block_field_only_fails_strict() {
    let pack = mutate_and_reseal(&seal_value(SAMPLE_TEXT), |p| {
        p["blocks"][0]["origin"] = json!("lane import");
    });
    verify(&pack, &Policy::default()).unwrap();
    let err = verify(&pack, &Policy::strict()).unwrap_err();
    assert_eq!((err.code, err.phase), (ErrorCode::PackFieldForbidden, Phase::Block));
    assert_eq!(err.location.block_index, Some(0));
}

#[test]
fn strict_is_not_the_default() {
    assert_ne!(Policy::default(), Policy::strict());
    assert!(Policy::default().allow_unknown_pack_fields);
    assert!(!Policy::strict().allow_unknown_block_fields);
}

// ---------------------------------------------------------------------------
// Multi-lane
// ---------------------------------------------------------------------------

#[test]
fn multi_lane_pack_decodes_each_lane() {
    let lanes = split_lanes(SAMPLE_TEXT, 3);
    let pack = PackBuilder::new()
        .unwrap()
        .with_edges(true)
        .seal_lanes(&lanes)
        .unwrap();
    assert_eq!(pack.blocks.len(), 3);
    assert!(pack.blocks.iter().all(|b| b.dict_hash == pack.dict.dict_hash));

    let value = pack.to_value().unwrap();
    let decoded = verify_and_decode(&value, &Policy::strict()).unwrap();
    assert_eq!(decoded.verified.block_count, 3);
    for (lane, text) in lanes.iter().zip(&decoded.lanes) {
        assert_eq!(&lane.text, text);
    }
    assert_eq!(decoded.lanes.concat(), normalize_newlines(SAMPLE_TEXT));
}

#[test]
fn reordered_lanes_break_the_proof_binding() {
    let pack = seal_pinned(
        &[Lane::with_id("a", "hello\n"), Lane::with_id("b", "hello\n")],
        &["hello"],
    );
    let swapped = mutate_and_reseal(&pack, |p| {
        let blocks = p["blocks"].as_array_mut().unwrap();
        blocks.swap(0, 1);
    });
    // Identical lane text, so the roundtrip and source hashes still line up.
    let err = verify(&swapped, &Policy::default()).unwrap_err();
    assert_eq!((err.code, err.phase), (ErrorCode::BlockShaMismatch, Phase::Proof));
}

#[test]
fn output_limit_is_per_block_not_per_pack() {
    let pack = seal_pinned(&[Lane::new("abcd"), Lane::new("efgh")], &[]);
    let fits_each = Policy {
        max_output_units: 4,
        ..Policy::default()
    };
    let ok = verify(&pack, &fits_each).unwrap();
    assert_eq!(ok.block_count, 2);

    let too_small = Policy {
        max_output_units: 3,
        ..Policy::default()
    };
    let err = verify(&pack, &too_small).unwrap_err();
    assert_eq!(err.code, ErrorCode::DecodeOutputLimit);
    assert_eq!(err.location.block_index, Some(0));
}

#[test]
fn batch_results_follow_input_order() {
    let good = seal_value("alpha alpha beta\n");
    let mut bad = seal_value("gamma gamma delta\n");
    bad["pack_hash"] = json!("0000");
    let results = verify_batch(&[good.clone(), bad, good], &Policy::default());
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().code, ErrorCode::PackShaMismatch);
    assert!(results[2].is_ok());
}

// ---------------------------------------------------------------------------
// Boundary
// ---------------------------------------------------------------------------

#[test]
fn dictionary_of_65535_entries_is_accepted_and_65536_rejected() {
    let entries: Vec<String> = (0..65_535).map(|i| format!("k{i:05}")).collect();
    let pack = PackBuilder::new()
        .unwrap()
        .seal_with_dictionary(&[Lane::new("k00000 k65534 ~\n")], entries)
        .unwrap()
        .to_value()
        .unwrap();
    let ok = verify(&pack, &Policy::default()).unwrap();
    assert_eq!(ok.block_count, 1);

    let over = mutate_and_reseal(&pack, |p| {
        p["dict"]["dict"].as_array_mut().unwrap().push(json!("extra"));
    });
    let err = verify(&over, &Policy::default()).unwrap_err();
    assert_eq!((err.code, err.phase), (ErrorCode::DictSizeExceedsLimit, Phase::Dict));
}
