//! Binary that seals a fixed corpus, writes it to a temp file, reads it back,
//! verifies it, and prints deterministic output lines for cross-process
//! comparison.
//!
//! Usage: `pack_fixture`
//! Output: one `key=value` per line:
//!   `pack_hash`=...
//!   `dict_hash`=...
//!   `dict_entries`=N
//!   `lanes_pack_hash`=... (three lanes with edges)
//!   `lanes_block_count`=3
//!   `verify`=ok
//!   `roundtrip`=ok

use lock_tests::pack_test_helpers::SAMPLE_TEXT;
use sealpack_kernel::text::normalize_newlines;
use sealpack_pack::pack_file::{read_pack_file, verify_pack_file, write_pack_file};
use sealpack_pack::policy::Policy;
use sealpack_pack::seal::{split_lanes, PackBuilder};
use sealpack_pack::verify::verify_and_decode;

fn main() {
    let builder = PackBuilder::new().expect("builder self-test failed");
    let single = builder.seal(SAMPLE_TEXT).expect("seal failed");

    let lanes = split_lanes(SAMPLE_TEXT, 3);
    let laned = PackBuilder::new()
        .expect("builder self-test failed")
        .with_edges(true)
        .created_utc("2024-01-01T00:00:00Z")
        .seal_lanes(&lanes)
        .expect("seal_lanes failed");

    let dir = std::env::temp_dir().join(format!("sealpack_pack_fixture_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("pack.json");
    write_pack_file(&path, &laned).expect("write_pack_file failed");
    let verified = verify_pack_file(&path, &Policy::strict()).expect("verify_pack_file failed");
    let loaded = read_pack_file(&path).expect("read_pack_file failed");
    let _ = std::fs::remove_dir_all(&dir);

    let decoded = verify_and_decode(&loaded, &Policy::default()).expect("verify_and_decode failed");
    let roundtrip = if decoded.lanes.concat() == normalize_newlines(SAMPLE_TEXT)
        && verified.pack_hash == laned.pack_hash
    {
        "ok"
    } else {
        "MISMATCH"
    };

    println!("pack_hash={}", single.pack_hash);
    println!("dict_hash={}", single.dict.dict_hash);
    println!("dict_entries={}", single.dict.dict.len());
    println!("lanes_pack_hash={}", laned.pack_hash);
    println!("lanes_block_count={}", verified.block_count);
    println!("verify=ok");
    println!("roundtrip={roundtrip}");
}
