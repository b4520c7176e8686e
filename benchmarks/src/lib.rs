//! Shared corpora and fixtures for the sealpack benchmark suites.
//!
//! Corpora are generated, not loaded, so every machine benchmarks identical
//! inputs.

use sealpack_pack::model::Pack;
use sealpack_pack::seal::{split_lanes, PackBuilder};

const SOURCE_LINES: &[&str] = &[
    "export function render(node, props) {",
    "    const children = node.children.map((child) => render(child, props));",
    "    return { type: node.type, props, children };",
    "}",
    "// caf\u{e9} \u{2014} r\u{e9}sum\u{e9} \u{2713}",
    "const total = items.reduce((sum, item) => sum + item.price, 0);",
];

/// Source-like text of roughly `target_bytes` bytes, ending in a newline.
#[must_use]
pub fn source_corpus(target_bytes: usize) -> String {
    let mut out = String::with_capacity(target_bytes + 128);
    let mut i = 0usize;
    while out.len() < target_bytes {
        out.push_str(SOURCE_LINES[i % SOURCE_LINES.len()]);
        out.push_str(&format!(" // line {i}\n"));
        i += 1;
    }
    out
}

/// A sealed pack over [`source_corpus`], split into `lanes` lanes.
///
/// # Panics
///
/// Panics if sealing fails. Benchmark setup only.
#[must_use]
pub fn sealed_pack(target_bytes: usize, lanes: usize) -> Pack {
    let text = source_corpus(target_bytes);
    PackBuilder::new()
        .and_then(|b| b.seal_lanes(&split_lanes(&text, lanes)))
        .unwrap_or_else(|e| panic!("benchmark pack failed to seal: {e}"))
}

/// [`sealed_pack`] as the JSON value the verifier consumes.
///
/// # Panics
///
/// As [`sealed_pack`].
#[must_use]
pub fn sealed_value(target_bytes: usize, lanes: usize) -> serde_json::Value {
    sealed_pack(target_bytes, lanes)
        .to_value()
        .unwrap_or_else(|e| panic!("benchmark pack failed to serialize: {e}"))
}
