//! # un_cli - File I/O and command line for `un_core`
//!
//! Reads measurement tables (CSV) and configurations (YAML), writes the
//! validation report (JSON), decision table and CT1 results (CSV), builds
//! credentials from the environment and generates synthetic data.

pub mod auth;
pub mod commands;
pub mod io;
pub mod logging;
pub mod synth;

use std::path::PathBuf;

pub use auth::AuthSettings;
pub use commands::{run_ct1_check, run_dispatched, run_validation, RunReport};

/// Cache directory name under `$HOME`.
pub const CACHE_DIR_NAME: &str = ".unreanchor_cache";

/// `$HOME/.unreanchor_cache`, or a relative directory when `HOME` is unset.
pub fn default_cache_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}
