//! Sealpack Pack: the artifact layer over the kernel codec.
//!
//! A pack is sealed bottom-up (dictionary → blocks → proof → pack hash) by
//! [`seal::PackBuilder`] and checked by [`verify::verify`], which re-derives
//! every hash and re-runs the decoder from nothing but the pack JSON and a
//! [`policy::Policy`].
//!
//! The pack layer does NOT implement codec or hashing logic; it delegates to
//! `sealpack_kernel`.
//!
//! # Crate dependency graph
//!
//! ```text
//! sealpack_kernel  ←  sealpack_pack  ←  sealpack_cli
//! (canon, codec)      (model, verify)    (binary)
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod artifact;
pub mod dictionary;
pub mod edges;
pub mod error;
pub mod model;
pub mod pack_file;
pub mod policy;
pub mod seal;
pub mod verify;
pub mod witness;
