//! Sealpack Kernel: the deterministic core of the sealpack format.
//!
//! # API Surface
//!
//! - [`proof::canon::canonical_json_bytes`] -- the single canonical serializer
//! - [`proof::hash`] -- SHA-256 hex digests, sync and async paths
//! - [`codec::encode::encode`] -- text + dictionary into bytecode
//! - [`codec::decode::decode`] -- bytecode back into text (normative inverse)
//!
//! # Module Dependency Direction
//!
//! `text` ← `codec`, `proof`
//!
//! One-way only. `codec` and `proof` do not depend on each other.
//! Nothing here performs I/O or knows about pack JSON artifacts.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod proof;
pub mod text;
