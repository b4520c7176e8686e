//! Closed sum type over every artifact kind, dispatched on the `type` tag.

use crate::error::{ErrorCode, VerifyError};
use crate::model::{
    Block, Dictionary, Pack, Proof, BLOCK_TYPE, DICT_TYPE, ERROR_TYPE, PACK_TYPE, PROOF_TYPE,
};

/// Artifact kinds, one per `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Pack,
    Dict,
    Block,
    Proof,
    Error,
}

impl ArtifactKind {
    /// All kinds in declaration order.
    pub const ALL: &[ArtifactKind] = &[
        Self::Pack,
        Self::Dict,
        Self::Block,
        Self::Proof,
        Self::Error,
    ];

    /// The `type` tag string.
    #[must_use]
    pub const fn type_tag(self) -> &'static str {
        match self {
            Self::Pack => PACK_TYPE,
            Self::Dict => DICT_TYPE,
            Self::Block => BLOCK_TYPE,
            Self::Proof => PROOF_TYPE,
            Self::Error => ERROR_TYPE,
        }
    }

    /// Kind for a `type` tag, if it is one of ours.
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.type_tag() == tag)
    }

    /// Kind of a JSON value, read from its `type` field.
    #[must_use]
    pub fn of(value: &serde_json::Value) -> Option<Self> {
        value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .and_then(Self::from_type_tag)
    }

    /// Error code reported when a slot expecting this kind holds something else.
    #[must_use]
    pub const fn type_invalid_code(self) -> ErrorCode {
        match self {
            Self::Pack => ErrorCode::PackTypeInvalid,
            Self::Dict => ErrorCode::DictTypeInvalid,
            Self::Block => ErrorCode::BlockTypeInvalid,
            Self::Proof => ErrorCode::ProofTypeInvalid,
            // Error records are never nested inside a pack.
            Self::Error => ErrorCode::CanonInvalidJson,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// A parsed artifact of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Pack(Box<Pack>),
    Dict(Dictionary),
    Block(Block),
    Proof(Proof),
    Error(VerifyError),
}

/// Error parsing an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    /// The `type` field is missing or not a sealpack tag.
    UnknownType { found: Option<String> },
    /// The tag is known but the body does not match its shape.
    Shape { kind: ArtifactKind, detail: String },
}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType { found: Some(t) } => write!(f, "unknown artifact type: {t}"),
            Self::UnknownType { found: None } => write!(f, "artifact has no type tag"),
            Self::Shape { kind, detail } => write!(f, "malformed {kind}: {detail}"),
        }
    }
}

impl std::error::Error for ArtifactError {}

impl Artifact {
    /// Parse `value` into the variant named by its `type` tag.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] for an unknown tag or a shape mismatch.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ArtifactError> {
        let Some(kind) = ArtifactKind::of(&value) else {
            return Err(ArtifactError::UnknownType {
                found: value.get("type").map(ToString::to_string),
            });
        };
        let shape = |e: serde_json::Error| ArtifactError::Shape {
            kind,
            detail: e.to_string(),
        };
        Ok(match kind {
            ArtifactKind::Pack => Self::Pack(Box::new(serde_json::from_value(value).map_err(shape)?)),
            ArtifactKind::Dict => Self::Dict(serde_json::from_value(value).map_err(shape)?),
            ArtifactKind::Block => Self::Block(serde_json::from_value(value).map_err(shape)?),
            ArtifactKind::Proof => Self::Proof(serde_json::from_value(value).map_err(shape)?),
            ArtifactKind::Error => Self::Error(serde_json::from_value(value).map_err(shape)?),
        })
    }

    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Pack(_) => ArtifactKind::Pack,
            Self::Dict(_) => ArtifactKind::Dict,
            Self::Block(_) => ArtifactKind::Block,
            Self::Proof(_) => ArtifactKind::Proof,
            Self::Error(_) => ArtifactKind::Error,
        }
    }

    /// The artifact's own identity hash field, where it has one.
    #[must_use]
    pub fn declared_hash(&self) -> Option<&str> {
        match self {
            Self::Pack(p) => Some(&p.pack_hash),
            Self::Dict(d) => Some(&d.dict_hash),
            Self::Block(b) => Some(&b.block_hash),
            Self::Proof(_) | Self::Error(_) => None,
        }
    }
}
