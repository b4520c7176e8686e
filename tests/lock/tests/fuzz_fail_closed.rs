//! Fail-closed fuzzing of the decoder and the verifier.
//!
//! Proves:
//! 1. Decoding arbitrary bytes against a fixed dictionary never panics and
//!    either succeeds within the output bound or returns a typed error
//! 2. Any successful decode re-encodes to a stream that decodes identically
//! 3. Verifying packs with random byte-level damage never panics and always
//!    yields a registry code

use lock_tests::pack_test_helpers::{mutate_and_reseal, seal_value, SAMPLE_TEXT};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use proptest::prelude::*;
use sealpack_kernel::codec::decode::{decode, DecodeError, DecodeLimits, DecodeTable};
use sealpack_kernel::codec::encode::{encode_with_stats, EncodeDictionary};
use sealpack_pack::error::ErrorCode;
use sealpack_pack::policy::Policy;
use sealpack_pack::verify::{verify, verify_json_str};

const FUZZ_DICT: &[&str] = &["function", "return", "const", " = ", "\n", "\u{e9}t\u{e9}"];
const FUZZ_LIMIT: usize = 4096;

fn fuzz_dict() -> Vec<String> {
    FUZZ_DICT.iter().map(ToString::to_string).collect()
}

/// Byte streams biased toward opcode bytes and short, truncated tails.
fn bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    let byte = prop_oneof![
        4 => 0u8..=0x7F,
        2 => Just(0x80u8),
        2 => Just(0x81u8),
        1 => 0x82u8..=0xFF,
        1 => 0u8..=8,
    ];
    prop::collection::vec(byte, 0..96)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2500))]

    #[test]
    fn decode_is_total_on_random_bytes(bytes in bytes_strategy()) {
        let dict = fuzz_dict();
        let table = DecodeTable::from_strings(&dict);
        let limits = DecodeLimits { max_output_units: FUZZ_LIMIT };
        match decode(&table, &bytes, &limits) {
            Ok(units) => {
                prop_assert!(units.len() <= FUZZ_LIMIT);
                // Successful output survives a fresh encode/decode cycle.
                let enc = EncodeDictionary::new(&dict).unwrap();
                let (again, _) = encode_with_stats(&units, &enc);
                prop_assert_eq!(decode(&table, &again, &limits).unwrap(), units);
            }
            Err(e) => {
                prop_assert!(e.offset() < bytes.len());
                if let DecodeError::DictIndexOob { dict_len, index, .. } = e {
                    prop_assert_eq!(dict_len, dict.len());
                    prop_assert!(usize::from(index) >= dict_len);
                }
            }
        }
    }

    #[test]
    fn decode_fully_random_bytes(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let table = DecodeTable::from_strings(&fuzz_dict());
        let limits = DecodeLimits { max_output_units: 64 };
        if let Ok(units) = decode(&table, &bytes, &limits) {
            prop_assert!(units.len() <= 64);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn verify_never_panics_on_damaged_pack_text(pos in any::<prop::sample::Index>(), byte in any::<u8>()) {
        let pack = seal_value(SAMPLE_TEXT);
        let mut text = serde_json::to_vec(&pack).unwrap();
        let i = pos.index(text.len());
        text[i] = byte;
        let text = String::from_utf8_lossy(&text);
        if let Err(e) = verify_json_str(&text, &Policy::default()) {
            prop_assert_eq!(ErrorCode::from_code(e.code.as_str()), Some(e.code));
            prop_assert_eq!(e.kind.as_str(), "sealpack.error");
            prop_assert!(!e.message.is_empty());
        }
    }

    #[test]
    fn verify_never_panics_on_resealed_random_blocks(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let pack = seal_value(SAMPLE_TEXT);
        let damaged = mutate_and_reseal(&pack, |p| {
            p["blocks"][0]["b64"] = serde_json::json!(STANDARD.encode(&bytes));
        });
        let result = verify(&damaged, &Policy::default());
        if bytes.is_empty() {
            prop_assert!(result.is_err());
        }
        if let Err(e) = result {
            prop_assert!(e.code.as_str().starts_with("decode_") || e.code == ErrorCode::PolicyRoundtripRequired);
        }
    }
}
