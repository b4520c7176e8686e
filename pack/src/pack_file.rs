//! Pack file persistence: write/read/verify a pack as a JSON file.
//!
//! The file holds one pack as pretty-printed JSON. Formatting is irrelevant
//! to identity: every hash is recomputed over canonical bytes, never over the
//! file contents. The file path is never part of any hash surface.

use std::io::Write as _;
use std::path::Path;

use crate::error::VerifyError;
use crate::model::Pack;
use crate::policy::{Policy, PolicyError};
use crate::verify::{verify_json_slice, VerifyOk};

/// Error reading or writing a pack or policy file.
#[derive(Debug)]
pub enum PackFileError {
    /// I/O error.
    Io { detail: String },
    /// The file is not JSON.
    Parse { detail: String },
    /// The pack could not be serialized.
    Serialize { detail: String },
    /// A policy file names unknown options or mistyped values.
    Policy(PolicyError),
}

impl std::fmt::Display for PackFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::Parse { detail } => write!(f, "JSON parse error: {detail}"),
            Self::Serialize { detail } => write!(f, "serialization error: {detail}"),
            Self::Policy(e) => write!(f, "policy error: {e}"),
        }
    }
}

impl std::error::Error for PackFileError {}

/// Error verifying a pack file.
#[derive(Debug)]
pub enum PackFileVerifyError {
    /// The file could not be read.
    Read(PackFileError),
    /// The pack failed verification.
    Verify(VerifyError),
}

impl std::fmt::Display for PackFileVerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "read error: {e}"),
            Self::Verify(e) => write!(f, "verify error: {e}"),
        }
    }
}

impl std::error::Error for PackFileVerifyError {}

/// Write `pack` to `path` as pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`PackFileError`] on serialization or I/O failure.
pub fn write_pack_file(path: &Path, pack: &Pack) -> Result<(), PackFileError> {
    let mut bytes = serde_json::to_vec_pretty(pack).map_err(|e| PackFileError::Serialize {
        detail: e.to_string(),
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

/// Read the raw JSON of a pack file without verifying it.
///
/// # Errors
///
/// Returns [`PackFileError`] on I/O failure or unparseable JSON.
pub fn read_pack_file(path: &Path) -> Result<serde_json::Value, PackFileError> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes).map_err(|e| PackFileError::Parse {
        detail: format!("{}: {e}", path.display()),
    })
}

/// Read and verify a pack file.
///
/// Unparseable or non-UTF-8 contents are a verification failure
/// (`canon_invalid_json`), not a read error: only I/O problems are
/// [`PackFileVerifyError::Read`].
///
/// # Errors
///
/// Returns [`PackFileVerifyError`] on read or verification failure.
pub fn verify_pack_file(path: &Path, policy: &Policy) -> Result<VerifyOk, PackFileVerifyError> {
    let bytes = read_bytes(path).map_err(PackFileVerifyError::Read)?;
    verify_json_slice(&bytes, policy).map_err(PackFileVerifyError::Verify)
}

/// Load a policy from a JSON file of camelCase options.
///
/// # Errors
///
/// Returns [`PackFileError`] on I/O failure, unparseable JSON, or an invalid
/// option.
pub fn read_policy_file(path: &Path) -> Result<Policy, PackFileError> {
    let bytes = read_bytes(path)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| PackFileError::Parse {
            detail: format!("{}: {e}", path.display()),
        })?;
    Policy::from_json_value(&value).map_err(PackFileError::Policy)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn read_bytes(path: &Path) -> Result<Vec<u8>, PackFileError> {
    std::fs::read(path).map_err(|e| PackFileError::Io {
        detail: format!("read {}: {e}", path.display()),
    })
}

/// Stage `content` next to `path`, flush it, then move it into place.
///
/// A reader never sees a half-written pack: it finds the old file or the new
/// one. The staging file is removed if the move fails.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), PackFileError> {
    let io = |what: &str, p: &Path, e: std::io::Error| PackFileError::Io {
        detail: format!("{what} {}: {e}", p.display()),
    };
    let name = path.file_name().ok_or_else(|| PackFileError::Io {
        detail: format!("{} does not name a file", path.display()),
    })?;
    let mut staged_name = std::ffi::OsString::from(".");
    staged_name.push(name);
    staged_name.push(".partial");
    let staged = path.with_file_name(staged_name);

    let mut file = std::fs::File::create(&staged).map_err(|e| io("create", &staged, e))?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| io("write", &staged, e))?;
    drop(file);

    if let Err(e) = std::fs::rename(&staged, path) {
        let _ = std::fs::remove_file(&staged);
        return Err(io("replace", path, e));
    }
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote pack file");
    Ok(())
}
