//! `sealpack`: seal text into packs, verify them, and decode them back.
//!
//! Exit codes: 0 success, 1 verification or decode failure, 2 usage or I/O
//! error. Logs go to stderr (filter from `SEALPACK_LOG`, default `warn`) so
//! stdout carries only results.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sealpack",
    version,
    about = "Deterministic, verifiable dictionary-bytecode text packs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal a UTF-8 text file into a pack.
    Encode(EncodeArgs),
    /// Verify a pack, then write its decoded text.
    Decode(DecodeArgs),
    /// Verify one or more packs.
    Verify(VerifyArgs),
    /// Print the kind and hashes of any sealpack artifact.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Input text file.
    pub input: PathBuf,
    /// Output pack file.
    #[arg(short, long)]
    pub output: PathBuf,
    /// Split the input into up to N lanes on line boundaries.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub lanes: u32,
    /// Attach an adjacency witness to every block.
    #[arg(long)]
    pub edges: bool,
    /// Cap the dictionary size.
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=65_535))]
    pub max_dict_entries: Option<u32>,
    /// RFC 3339 UTC creation timestamp, e.g. 2024-01-01T00:00:00Z.
    #[arg(long)]
    pub created_utc: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Pack file.
    pub pack: PathBuf,
    /// Write decoded text here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Decode only the block at this index.
    #[arg(long)]
    pub lane: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Pack files.
    #[arg(required = true)]
    pub packs: Vec<PathBuf>,
    /// Policy file of camelCase options.
    #[arg(long, conflicts_with = "strict")]
    pub policy: Option<PathBuf>,
    /// Use the strict preset (unknown pack and block fields forbidden).
    #[arg(long)]
    pub strict: bool,
    /// Print one JSON result object per pack.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Artifact JSON file.
    pub file: PathBuf,
}

fn main() -> ExitCode {
    logging::init_tracing();
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();

    let result = match &cli.command {
        Commands::Encode(args) => commands::encode(args, &mut stdout),
        Commands::Decode(args) => commands::decode(args, &mut stdout),
        Commands::Verify(args) => commands::verify(args, &mut stdout),
        Commands::Inspect(args) => commands::inspect(args, &mut stdout),
    };

    match result {
        Ok(status) => status.exit_code(),
        Err(e) => {
            e.report(&mut stdout);
            e.exit_code()
        }
    }
}
