//! Print the golden pinned-dictionary packs as canonical JSON, one per line.
//!
//! Regenerate the constants in `tests/golden_pack.rs` from this output only
//! when the format version changes.
//!
//! Usage: `golden_pack_generator`

use sealpack_kernel::proof::canon::canonical_json_bytes;
use sealpack_pack::seal::{Lane, PackBuilder};

fn main() {
    let builder = PackBuilder::new().expect("builder self-test failed");
    let dictionary = vec!["hello".to_string(), "world".to_string()];

    let single = builder
        .seal_with_dictionary(&[Lane::new("hello world")], dictionary.clone())
        .expect("seal failed");
    let lanes = [
        Lane::with_id("lane-0", "hello world\n"),
        Lane::with_id("lane-1", "world hello\n"),
    ];
    let double = builder
        .seal_with_dictionary(&lanes, dictionary)
        .expect("seal failed");

    for pack in [single, double] {
        let value = pack.to_value().expect("to_value failed");
        let bytes = canonical_json_bytes(&value).expect("canonicalize failed");
        println!("{}", String::from_utf8(bytes).expect("canonical JSON is UTF-8"));
    }
}
