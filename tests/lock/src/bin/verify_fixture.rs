//! Binary that verifies the pack JSON file named on the command line and
//! prints the outcome as one JSON line: the `VerifyOk` summary or the
//! structured error object.
//!
//! Usage: `verify_fixture <pack.json> [--strict]`
//! Exit code: 0 on success, 1 on verification failure, 2 on usage error.

use std::process::ExitCode;

use sealpack_pack::pack_file::{verify_pack_file, PackFileVerifyError};
use sealpack_pack::policy::Policy;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first() else {
        eprintln!("usage: verify_fixture <pack.json> [--strict]");
        return ExitCode::from(2);
    };
    let policy = if args.iter().any(|a| a == "--strict") {
        Policy::strict()
    } else {
        Policy::default()
    };

    match verify_pack_file(std::path::Path::new(path), &policy) {
        Ok(ok) => {
            println!("{}", serde_json::to_string(&ok).expect("serialize VerifyOk"));
            ExitCode::SUCCESS
        }
        Err(PackFileVerifyError::Verify(e)) => {
            println!("{}", serde_json::to_string(&e).expect("serialize VerifyError"));
            ExitCode::from(1)
        }
        Err(PackFileVerifyError::Read(e)) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}
