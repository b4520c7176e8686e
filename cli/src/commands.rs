//! Subcommand bodies. Each writes its results to `out` and reports how the
//! process should exit.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use sealpack_kernel::text::normalize_newlines;
use sealpack_pack::artifact::Artifact;
use sealpack_pack::error::{ErrorCode, Phase, VerifyError};
use sealpack_pack::pack_file::{
    read_pack_file, read_policy_file, verify_pack_file, write_pack_file, PackFileError,
    PackFileVerifyError,
};
use sealpack_pack::policy::Policy;
use sealpack_pack::seal::{split_lanes, BuildError, PackBuilder};
use sealpack_pack::verify::verify_and_decode;

use crate::{DecodeArgs, EncodeArgs, InspectArgs, VerifyArgs};

/// How a command that ran to completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// At least one pack failed verification.
    Failed,
    /// At least one input could not be read.
    Unreadable,
}

impl Status {
    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::Unreadable => 2,
        }
    }
}

/// A command that stopped early.
#[derive(Debug)]
pub enum CliError {
    /// Bad arguments or unusable input.
    Usage { detail: String },
    Io { detail: String },
    /// Verification failed; reported as the structured error object.
    Verify(VerifyError),
    /// Sealing failed after the input was accepted.
    Seal(BuildError),
}

impl CliError {
    pub fn code(&self) -> u8 {
        match self {
            Self::Usage { .. } | Self::Io { .. } => 2,
            Self::Verify(_) | Self::Seal(_) => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Verification failures go to `out` as JSON; everything else to stderr.
    pub fn report(&self, out: &mut dyn Write) {
        match self {
            Self::Verify(e) => {
                tracing::warn!(code = %e.code, phase = e.phase.as_str(), "verification failed");
                write_error_json(out, e);
            }
            Self::Usage { detail } => eprintln!("error: {detail}"),
            Self::Io { detail } => eprintln!("I/O error: {detail}"),
            Self::Seal(e) => eprintln!("seal failed: {e}"),
        }
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::InvalidTimestamp { .. }
            | BuildError::InvalidLaneId { .. }
            | BuildError::DictionaryTooLarge { .. } => Self::Usage {
                detail: e.to_string(),
            },
            other => Self::Seal(other),
        }
    }
}

impl From<PackFileError> for CliError {
    fn from(e: PackFileError) -> Self {
        match e {
            PackFileError::Io { detail } => Self::Io { detail },
            PackFileError::Parse { .. } | PackFileError::Policy(_) => Self::Usage {
                detail: e.to_string(),
            },
            PackFileError::Serialize { detail } => Self::Io { detail },
        }
    }
}

pub fn encode(args: &EncodeArgs, out: &mut dyn Write) -> Result<Status, CliError> {
    let bytes = std::fs::read(&args.input).map_err(|e| CliError::Io {
        detail: format!("read {}: {e}", args.input.display()),
    })?;
    let text = String::from_utf8(bytes).map_err(|e| CliError::Usage {
        detail: format!("{} is not UTF-8: {e}", args.input.display()),
    })?;
    let text = normalize_newlines(&text);
    let lanes = split_lanes(&text, args.lanes as usize);

    let mut builder = PackBuilder::new()?.with_edges(args.edges);
    if let Some(n) = args.max_dict_entries {
        builder = builder.max_dict_entries(n as usize);
    }
    if let Some(ts) = &args.created_utc {
        builder = builder.created_utc(ts.clone());
    }
    let pack = builder.seal_lanes(&lanes)?;
    write_pack_file(&args.output, &pack)?;

    tracing::info!(
        output = %args.output.display(),
        blocks = pack.blocks.len(),
        dict_entries = pack.dict.dict.len(),
        "sealed pack"
    );
    write_line(out, &pack.pack_hash)?;
    Ok(Status::Success)
}

pub fn decode(args: &DecodeArgs, out: &mut dyn Write) -> Result<Status, CliError> {
    let value = read_pack_file(&args.pack).map_err(|e| match e {
        PackFileError::Parse { detail } => CliError::Verify(VerifyError::new(
            ErrorCode::CanonInvalidJson,
            Phase::Pack,
            format!("pack is not valid JSON: {detail}"),
        )),
        other => other.into(),
    })?;
    let decoded = verify_and_decode(&value, &Policy::default()).map_err(CliError::Verify)?;

    let text = match args.lane {
        Some(index) => decoded.lanes.get(index).cloned().ok_or_else(|| CliError::Usage {
            detail: format!("lane {index} out of range, pack has {}", decoded.lanes.len()),
        })?,
        None => decoded.lanes.concat(),
    };

    match &args.output {
        Some(path) => std::fs::write(path, text.as_bytes()).map_err(|e| CliError::Io {
            detail: format!("write {}: {e}", path.display()),
        })?,
        None => out.write_all(text.as_bytes()).map_err(stdout_error)?,
    }
    Ok(Status::Success)
}

pub fn verify(args: &VerifyArgs, out: &mut dyn Write) -> Result<Status, CliError> {
    let policy = match (&args.policy, args.strict) {
        (Some(path), _) => read_policy_file(path)?,
        (None, true) => Policy::strict(),
        (None, false) => Policy::default(),
    };

    let mut status = Status::Success;
    for path in &args.packs {
        match verify_pack_file(path, &policy) {
            Ok(ok) => {
                if args.json {
                    let line = serde_json::to_string(&ok).map_err(|e| CliError::Io {
                        detail: e.to_string(),
                    })?;
                    write_line(out, &line)?;
                } else {
                    write_line(
                        out,
                        &format!("{}: ok {} ({} blocks)", path.display(), ok.pack_hash, ok.block_count),
                    )?;
                }
            }
            Err(PackFileVerifyError::Verify(e)) => {
                tracing::warn!(path = %path.display(), code = %e.code, phase = e.phase.as_str(), "verification failed");
                if !args.json {
                    eprintln!("{}: FAILED {} ({})", path.display(), e.code, e.message);
                }
                write_error_json(out, &e);
                if status == Status::Success {
                    status = Status::Failed;
                }
            }
            Err(PackFileVerifyError::Read(e)) => {
                eprintln!("{}: {e}", path.display());
                status = Status::Unreadable;
            }
        }
    }
    Ok(status)
}

pub fn inspect(args: &InspectArgs, out: &mut dyn Write) -> Result<Status, CliError> {
    let value = read_pack_file(&args.file)?;
    let artifact = Artifact::from_value(value).map_err(|e| CliError::Usage {
        detail: format!("{}: {e}", args.file.display()),
    })?;

    let mut lines = vec![format!("kind: {}", artifact.kind())];
    if let Some(hash) = artifact.declared_hash() {
        lines.push(format!("hash: {hash}"));
    }
    match &artifact {
        Artifact::Pack(p) => {
            lines.push(format!("dict_hash: {}", p.dict.dict_hash));
            lines.push(format!("dict_entries: {}", p.dict.dict.len()));
            lines.push(format!("blocks: {}", p.blocks.len()));
            lines.push(format!("source_hash: {}", p.proof.source_hash));
            lines.push(format!("proof_ok: {}", p.proof.ok));
            if let Some(ts) = &p.created_utc {
                lines.push(format!("created_utc: {ts}"));
            }
        }
        Artifact::Dict(d) => {
            lines.push(format!("source_hash: {}", d.source_hash));
            lines.push(format!("dict_entries: {}", d.dict.len()));
        }
        Artifact::Block(b) => {
            lines.push(format!("source_hash: {}", b.source_hash));
            lines.push(format!("dict_hash: {}", b.dict_hash));
            if let Some(id) = &b.lane_id {
                lines.push(format!("lane_id: {id}"));
            }
        }
        Artifact::Proof(p) => {
            lines.push(format!("source_hash: {}", p.source_hash));
            lines.push(format!("roundtrip_hash: {}", p.roundtrip_hash));
            lines.push(format!("block_hash: {}", p.block_hash));
            lines.push(format!("ok: {}", p.ok));
        }
        Artifact::Error(e) => {
            lines.push(format!("code: {}", e.code));
            lines.push(format!("phase: {}", e.phase.as_str()));
        }
    }
    lines.push("verified: no".to_string());
    for line in &lines {
        write_line(out, line)?;
    }
    Ok(Status::Success)
}

fn write_line(out: &mut dyn Write, line: &str) -> Result<(), CliError> {
    writeln!(out, "{line}").map_err(stdout_error)
}

fn write_error_json(out: &mut dyn Write, error: &VerifyError) {
    match serde_json::to_string(error) {
        Ok(json) => {
            if let Err(e) = writeln!(out, "{json}") {
                eprintln!("failed to write error report: {e}");
            }
        }
        Err(e) => eprintln!("failed to serialize error report: {e}"),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn stdout_error(e: std::io::Error) -> CliError {
    CliError::Io {
        detail: format!("write output: {e}"),
    }
}
