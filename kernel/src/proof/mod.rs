//! Proof primitives: canonical serialization and content hashing.
//!
//! Every identity hash in a pack (`dict_hash`, `block_hash`, `pack_hash`)
//! and every roundtrip witness is derived through these two modules.

pub mod canon;
pub mod hash;
