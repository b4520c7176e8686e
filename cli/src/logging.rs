//! Tracing setup for the `sealpack` binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `SEALPACK_LOG=sealpack_pack=debug`.
pub const LOG_ENV: &str = "SEALPACK_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install a stderr subscriber filtered by [`LOG_ENV`].
///
/// Falls back to `warn` when the variable is unset or unparseable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // A second install (e.g. from tests) is not an error worth surfacing.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .try_init();
}
