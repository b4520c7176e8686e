//! Property tests over the codec, the canonical form and pack identity.
//!
//! Proves:
//! 1. Inverse law: `decode(D, encode(D, S)) == S` for arbitrary text and dictionaries
//! 2. Sealing is deterministic and every sealed pack verifies
//! 3. Canonical bytes ignore key order and are a fixed point of reparse
//! 4. Flipping any single byte of a pack's canonical form changes its identity

use proptest::prelude::*;
use sealpack_kernel::codec::decode::{decode, DecodeLimits, DecodeTable};
use sealpack_kernel::codec::encode::{encode, sort_dictionary, EncodeDictionary};
use sealpack_kernel::proof::canon::{canonical_json_bytes, canonical_json_bytes_without, canonicalize_json_slice};
use sealpack_kernel::proof::hash::sha256_hex;
use sealpack_kernel::text::to_units;
use sealpack_pack::policy::Policy;
use sealpack_pack::seal::{split_lanes, PackBuilder};
use sealpack_pack::verify::verify_and_decode;
use serde_json::{Map, Value};

fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-c ]{0,40}",
        "[a-z\\n\\t {}();]{0,80}",
        any::<String>(),
        "(\\PC|\u{e9}|\u{1F600}){0,20}",
    ]
}

fn dict_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-c ]{0,4}|\\PC{1,3}", 0..12)
}

fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<String>().prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z\u{e9}]{0,4}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Rebuild every object with its keys inserted in reverse order.
fn reverse_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map.iter().rev() {
                out.insert(k.clone(), reverse_keys(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(reverse_keys).collect()),
        other => other.clone(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn inverse_law_any_dictionary_order(text in text_strategy(), dict in dict_strategy()) {
        let enc = EncodeDictionary::new(&dict).unwrap();
        let bytes = encode(&text, &enc);
        let units = decode(&DecodeTable::from_strings(&dict), &bytes, &DecodeLimits::default()).unwrap();
        prop_assert_eq!(units, to_units(&text));
    }

    #[test]
    fn inverse_law_canonical_dictionary(text in text_strategy(), dict in dict_strategy()) {
        let dict = sort_dictionary(dict);
        let enc = EncodeDictionary::new(&dict).unwrap();
        let first = encode(&text, &enc);
        prop_assert_eq!(&first, &encode(&text, &enc));
        let units = decode(&DecodeTable::from_strings(&dict), &first, &DecodeLimits::default()).unwrap();
        prop_assert_eq!(units, to_units(&text));
    }

    #[test]
    fn key_order_invariance(value in json_strategy()) {
        let a = canonical_json_bytes(&value).unwrap();
        let b = canonical_json_bytes(&reverse_keys(&value)).unwrap();
        prop_assert_eq!(&a, &b);
    }

    #[test]
    fn canonicalization_idempotent(value in json_strategy()) {
        let once = canonical_json_bytes(&value).unwrap();
        let twice = canonicalize_json_slice(&once).unwrap();
        prop_assert_eq!(once, twice);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn sealed_packs_verify_and_reproduce(text in text_strategy(), lanes in 1usize..4) {
        let lanes = split_lanes(&text, lanes);
        let a = PackBuilder::new().unwrap().seal_lanes(&lanes).unwrap();
        let b = PackBuilder::new().unwrap().seal_lanes(&lanes).unwrap();
        prop_assert_eq!(&a, &b);

        let decoded = verify_and_decode(&a.to_value().unwrap(), &Policy::strict()).unwrap();
        prop_assert_eq!(decoded.verified.pack_hash, a.pack_hash);
        let expected: String = lanes.iter().map(|l| l.text.as_str()).collect();
        prop_assert_eq!(decoded.lanes.concat(), expected.replace("\r\n", "\n").replace('\r', "\n"));
    }

    #[test]
    fn single_byte_flip_changes_identity(text in "[a-z ]{1,60}", pos in any::<prop::sample::Index>(), flip in 1u8..=255) {
        let pack = PackBuilder::new().unwrap().seal(&text).unwrap();
        let value = pack.to_value().unwrap();
        let mut preimage = canonical_json_bytes_without(&value, "pack_hash").unwrap();
        prop_assert_eq!(sha256_hex(&preimage), pack.pack_hash.clone());
        let i = pos.index(preimage.len());
        preimage[i] ^= flip;
        prop_assert_ne!(sha256_hex(&preimage), pack.pack_hash);
    }
}
