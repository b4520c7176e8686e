//! Pack sealing: text in, sealed [`Pack`] out.
//!
//! Assembly is strictly bottom-up:
//!
//! 1. normalize newlines in every lane
//! 2. build the dictionary over the concatenated lanes
//! 3. encode each lane, wrap it in base64, hash the block
//! 4. decode every block back and compare (a real roundtrip, not an assumption)
//! 5. emit the proof, then hash the whole pack
//!
//! Nothing here reads the clock or the environment. `created_utc` is only
//! present when the caller sets it, so sealing the same input twice yields
//! the same `pack_hash`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sealpack_kernel::codec::decode::{decode, DecodeLimits, DecodeTable};
use sealpack_kernel::codec::encode::{encode_with_stats, EncodeDictionary, EncodeError};
use sealpack_kernel::codec::wire::MAX_DICT_ENTRIES;
use sealpack_kernel::proof::canon::CanonError;
use sealpack_kernel::proof::hash::{text_sha256, Sha256Provider};
use sealpack_kernel::text::{normalize_newlines, to_units};

use crate::dictionary::{DictionaryStrategy, FrequencyStrategy};
use crate::edges::compute_edges;
use crate::model::{
    identity_of, is_valid_created_utc, is_valid_lane_id, Block, Dictionary, Pack, BLOCK_HASH_FIELD,
    BLOCK_TYPE, DICT_HASH_FIELD, DICT_TYPE, ENCODING, FORMAT_VERSION, MODE, PACK_HASH_FIELD,
    PACK_TYPE,
};
use crate::witness::build_proof;

/// One lane of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    /// Advisory identifier, carried into the block as `lane_id`.
    pub lane_id: Option<String>,
    pub text: String,
}

impl Lane {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            lane_id: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_id(lane_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            lane_id: Some(lane_id.into()),
            text: text.into(),
        }
    }
}

/// Error sealing a pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No lanes were supplied.
    NoLanes,
    /// The dictionary has more entries than a 16-bit reference can address.
    DictionaryTooLarge { len: usize },
    /// The default tokenizer could not be constructed.
    Tokenizer { detail: String },
    /// `created_utc` is not an RFC 3339 UTC timestamp.
    InvalidTimestamp { value: String },
    /// A lane id falls outside `[A-Za-z0-9._-]{1,64}`.
    InvalidLaneId { lane_id: String },
    /// Canonicalization or the hash self-test failed.
    Canon { detail: String },
    /// Decoding a freshly encoded block failed.
    Roundtrip { lane: usize, detail: String },
    /// A freshly encoded block decoded to different text.
    RoundtripMismatch { lane: usize },
    /// The blocking worker of [`seal_pack_async`] died.
    Worker { detail: String },
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLanes => write!(f, "no lanes to seal"),
            Self::DictionaryTooLarge { len } => write!(
                f,
                "dictionary has {len} entries, limit is {MAX_DICT_ENTRIES}"
            ),
            Self::Tokenizer { detail } => write!(f, "tokenizer error: {detail}"),
            Self::InvalidTimestamp { value } => {
                write!(f, "created_utc is not an RFC 3339 UTC timestamp: {value}")
            }
            Self::InvalidLaneId { lane_id } => write!(f, "invalid lane id: {lane_id:?}"),
            Self::Canon { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::Roundtrip { lane, detail } => {
                write!(f, "lane {lane} failed to decode after encoding: {detail}")
            }
            Self::RoundtripMismatch { lane } => {
                write!(f, "lane {lane} did not decode back to its source")
            }
            Self::Worker { detail } => write!(f, "sealing worker failed: {detail}"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<CanonError> for BuildError {
    fn from(e: CanonError) -> Self {
        Self::Canon {
            detail: e.to_string(),
        }
    }
}

impl From<EncodeError> for BuildError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::DictionaryTooLarge { len } => Self::DictionaryTooLarge { len },
        }
    }
}

/// Configured pack sealer.
pub struct PackBuilder {
    strategy: Box<dyn DictionaryStrategy>,
    provider: Sha256Provider,
    max_dict_entries: usize,
    edges: bool,
    created_utc: Option<String>,
}

impl std::fmt::Debug for PackBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackBuilder")
            .field("max_dict_entries", &self.max_dict_entries)
            .field("edges", &self.edges)
            .field("created_utc", &self.created_utc)
            .finish_non_exhaustive()
    }
}

impl PackBuilder {
    /// A builder with the default frequency strategy and no metadata.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Canon`] if the hash self-test fails, or
    /// [`BuildError::Tokenizer`] if the default strategy cannot be built.
    pub fn new() -> Result<Self, BuildError> {
        let provider = Sha256Provider::new()?;
        let strategy = FrequencyStrategy::new().map_err(|e| BuildError::Tokenizer {
            detail: e.to_string(),
        })?;
        Ok(Self {
            strategy: Box::new(strategy),
            provider,
            max_dict_entries: MAX_DICT_ENTRIES,
            edges: false,
            created_utc: None,
        })
    }

    /// Replace the dictionary strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl DictionaryStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Cap the built dictionary (never above 65535).
    #[must_use]
    pub fn max_dict_entries(mut self, n: usize) -> Self {
        self.max_dict_entries = n.min(MAX_DICT_ENTRIES);
        self
    }

    /// Attach an adjacency witness to every block.
    #[must_use]
    pub fn with_edges(mut self, enabled: bool) -> Self {
        self.edges = enabled;
        self
    }

    /// Record a creation timestamp. Validated when sealing.
    #[must_use]
    pub fn created_utc(mut self, ts: impl Into<String>) -> Self {
        self.created_utc = Some(ts.into());
        self
    }

    /// Seal `text` as a single lane.
    ///
    /// # Errors
    ///
    /// See [`PackBuilder::seal_lanes`].
    pub fn seal(&self, text: &str) -> Result<Pack, BuildError> {
        self.seal_lanes(&[Lane::new(text)])
    }

    /// Seal several lanes over one shared dictionary built by the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] on invalid metadata, an oversized dictionary,
    /// or a failed roundtrip.
    pub fn seal_lanes(&self, lanes: &[Lane]) -> Result<Pack, BuildError> {
        let lanes = normalize_lanes(lanes)?;
        let full: String = lanes.iter().map(|l| l.text.as_str()).collect();
        let entries = self.strategy.build(&full, self.max_dict_entries);
        self.assemble(&lanes, &full, entries)
    }

    /// Seal lanes against a caller-pinned dictionary, used in the order given.
    ///
    /// # Errors
    ///
    /// As [`PackBuilder::seal_lanes`].
    pub fn seal_with_dictionary(
        &self,
        lanes: &[Lane],
        dictionary: Vec<String>,
    ) -> Result<Pack, BuildError> {
        let lanes = normalize_lanes(lanes)?;
        let full: String = lanes.iter().map(|l| l.text.as_str()).collect();
        self.assemble(&lanes, &full, dictionary)
    }

    fn assemble(&self, lanes: &[Lane], full: &str, entries: Vec<String>) -> Result<Pack, BuildError> {
        if let Some(ts) = &self.created_utc {
            if !is_valid_created_utc(ts) {
                return Err(BuildError::InvalidTimestamp { value: ts.clone() });
            }
        }
        let encoder = EncodeDictionary::new(&entries)?;
        let table = DecodeTable::from_strings(&entries);

        let mut dict = Dictionary {
            kind: DICT_TYPE.to_string(),
            version: FORMAT_VERSION,
            mode: MODE.to_string(),
            encoding: ENCODING.to_string(),
            source_hash: text_sha256(full),
            dict: entries,
            dict_hash: String::new(),
        };
        dict.dict_hash = identity_of(&dict, DICT_HASH_FIELD)?;

        let mut blocks = Vec::with_capacity(lanes.len());
        let mut roundtrip: Vec<u16> = Vec::new();
        for (index, lane) in lanes.iter().enumerate() {
            let units = to_units(&lane.text);
            let (bytes, stats) = encode_with_stats(&units, &encoder);
            let edges = if self.edges {
                let found = compute_edges(&bytes).map_err(|e| BuildError::Roundtrip {
                    lane: index,
                    detail: e.to_string(),
                })?;
                Some(found)
            } else {
                None
            };
            let b64 = STANDARD.encode(&bytes);

            let decoded = STANDARD
                .decode(&b64)
                .map_err(|e| e.to_string())
                .and_then(|raw| {
                    decode(&table, &raw, &DecodeLimits::default()).map_err(|e| e.to_string())
                })
                .map_err(|detail| BuildError::Roundtrip {
                    lane: index,
                    detail,
                })?;
            if decoded != units {
                return Err(BuildError::RoundtripMismatch { lane: index });
            }
            roundtrip.extend_from_slice(&decoded);

            let mut block = Block {
                kind: BLOCK_TYPE.to_string(),
                version: FORMAT_VERSION,
                mode: MODE.to_string(),
                encoding: ENCODING.to_string(),
                lane_id: lane.lane_id.clone(),
                source_hash: text_sha256(&lane.text),
                dict_hash: dict.dict_hash.clone(),
                b64,
                block_hash: String::new(),
                edges,
            };
            block.block_hash = identity_of(&block, BLOCK_HASH_FIELD)?;
            tracing::debug!(
                lane = index,
                input_units = stats.input_units,
                output_bytes = bytes.len(),
                dict_refs = stats.dict_refs,
                "encoded lane"
            );
            blocks.push(block);
        }

        let block_hashes: Vec<&str> = blocks.iter().map(|b| b.block_hash.as_str()).collect();
        let proof = build_proof(
            &self.provider,
            &dict.source_hash,
            &dict.dict_hash,
            &block_hashes,
            &roundtrip,
        )?;
        if !proof.ok {
            return Err(BuildError::RoundtripMismatch { lane: 0 });
        }

        let mut pack = Pack {
            kind: PACK_TYPE.to_string(),
            version: FORMAT_VERSION,
            mode: MODE.to_string(),
            encoding: ENCODING.to_string(),
            created_utc: self.created_utc.clone(),
            dict,
            blocks,
            proof,
            pack_hash: String::new(),
        };
        pack.pack_hash = identity_of(&pack, PACK_HASH_FIELD)?;
        tracing::info!(
            pack_hash = %pack.pack_hash,
            blocks = pack.blocks.len(),
            dict_entries = pack.dict.dict.len(),
            "sealed pack"
        );
        Ok(pack)
    }
}

fn normalize_lanes(lanes: &[Lane]) -> Result<Vec<Lane>, BuildError> {
    if lanes.is_empty() {
        return Err(BuildError::NoLanes);
    }
    lanes
        .iter()
        .map(|lane| {
            if let Some(id) = &lane.lane_id {
                if !is_valid_lane_id(id) {
                    return Err(BuildError::InvalidLaneId {
                        lane_id: id.clone(),
                    });
                }
            }
            Ok(Lane {
                lane_id: lane.lane_id.clone(),
                text: normalize_newlines(&lane.text),
            })
        })
        .collect()
}

/// Cut `text` into at most `n` contiguous lanes on line boundaries.
///
/// Lines are distributed as evenly as possible, earlier lanes taking the
/// remainder. Concatenating the lane texts reproduces `text` exactly. Lanes
/// are named `lane-0`, `lane-1`, ...
#[must_use]
pub fn split_lanes(text: &str, n: usize) -> Vec<Lane> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let count = n.clamp(1, lines.len().max(1));
    let base = lines.len() / count;
    let extra = lines.len() % count;
    let mut lanes = Vec::with_capacity(count);
    let mut start = 0usize;
    for index in 0..count {
        let take = base + usize::from(index < extra);
        let chunk: String = lines[start..start + take].concat();
        start += take;
        lanes.push(Lane::with_id(format!("lane-{index}"), chunk));
    }
    lanes
}

/// Awaited form of [`PackBuilder::seal_lanes`], run on the tokio blocking pool.
///
/// Outside a runtime the work happens inline. The output is identical to the
/// blocking form.
///
/// # Errors
///
/// As [`PackBuilder::seal_lanes`], plus [`BuildError::Worker`] if the
/// blocking task panicked.
pub async fn seal_pack_async(builder: PackBuilder, lanes: Vec<Lane>) -> Result<Pack, BuildError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle
            .spawn_blocking(move || builder.seal_lanes(&lanes))
            .await
            .map_err(|e| BuildError::Worker {
                detail: e.to_string(),
            })?,
        Err(_) => builder.seal_lanes(&lanes),
    }
}
