//! Tracing initialization for the command line.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding per-crate log levels.
pub const LOG_ENV: &str = "UNREANCHOR_LOG";

const DEFAULT_FILTER: &str = "un_core=info,un_cli=info";

/// Install the stderr subscriber. Reads `UNREANCHOR_LOG`
/// (e.g. `UNREANCHOR_LOG=un_core=debug`), falling back to info for both
/// crates. Stdout stays reserved for the printed report.
///
/// Idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
