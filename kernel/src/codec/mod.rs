//! Bytecode codec: the three-token wire alphabet and its encode/decode pair.
//!
//! ```text
//! 0x00..=0x7F        raw ASCII code unit            1 byte
//! 0x80 hi lo         dictionary reference (u16 BE)  3 bytes
//! 0x81 hi lo         raw UTF-16 code unit (u16 BE)  3 bytes
//! 0x82..=0xFF        invalid                        decode error
//! ```
//!
//! `decode` is the normative contract. `encode` is any function whose output
//! `decode` maps back to the input; this one is the greedy reference.

pub mod decode;
pub mod encode;
pub mod wire;
