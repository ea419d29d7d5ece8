//! unreanchor CLI
//!
//! Conformance battery over a measurement CSV, CT1 against an anchor,
//! cached downloads and synthetic data.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "unreanchor")]
#[command(about = "UN-Algebra retro-validation and anchor conformance checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory for cached remote payloads [default: ~/.unreanchor_cache]
    #[arg(long, global = true, env = "UNREANCHOR_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Connect/read/write timeout for remote fetches
    #[arg(long, global = true, default_value_t = 30_000)]
    timeout_ms: u64,

    #[command(flatten)]
    auth: AuthArgs,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct AuthArgs {
    /// Domain that receives the API key
    #[arg(
        long = "api-domain",
        global = true,
        env = "AYBLLC_API_DOMAIN",
        default_value = un_cli::auth::DEFAULT_API_DOMAIN
    )]
    domain: String,

    /// API key for the configured domain
    #[arg(long = "api-key", global = true, env = "AYBLLC_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// bearer | x-api-key | header:<Name> | query[:<param>]
    #[arg(
        long = "api-auth-style",
        global = true,
        env = "AYBLLC_API_AUTH_STYLE",
        default_value = "bearer"
    )]
    style: String,

    /// Header used by `header:` when it names none
    #[arg(
        long = "api-header-name",
        global = true,
        env = "AYBLLC_API_HEADER_NAME",
        default_value = "X-API-Key"
    )]
    header_name: String,

    /// Query parameter used by `query` when it names none
    #[arg(
        long = "api-query-name",
        global = true,
        env = "AYBLLC_API_QUERY_NAME",
        default_value = "api_key"
    )]
    query_name: String,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run the conformance battery (or CT1 for a reported-values table)
    Run {
        /// Input CSV
        #[arg(long)]
        data: PathBuf,

        /// YAML configuration
        #[arg(long)]
        config: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Anchor address, required for reported-values tables
        #[arg(long)]
        anchor: Option<String>,
    },

    /// Check reported values against an anchor
    Ct1 {
        /// CSV with label, H0, uncertainty_U and optional frame
        #[arg(long)]
        data: PathBuf,

        /// file:, path, http(s)://, doi: or zenodo: address
        #[arg(long)]
        anchor: String,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Download a URL into the cache and print the cached path
    Fetch {
        #[arg(long)]
        url: String,
    },

    /// Write a deterministic synthetic measurement CSV
    Synth {
        /// Output CSV path
        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = un_cli::synth::DEFAULT_ROWS)]
        rows: usize,

        #[arg(long, default_value_t = un_cli::synth::DEFAULT_SEED)]
        seed: u64,
    },
}

#[cfg(feature = "cli")]
impl AuthArgs {
    fn settings(&self) -> un_cli::AuthSettings {
        un_cli::AuthSettings {
            domain: self.domain.clone(),
            key: self.key.clone(),
            style: self.style.clone(),
            header_name: self.header_name.clone(),
            query_name: self.query_name.clone(),
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    un_cli::logging::init_tracing();
    let cli = Cli::parse();

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(un_cli::default_cache_dir);
    let mut resolver = un_core::AnchorResolver::with_timeout(
        cache_dir,
        std::time::Duration::from_millis(cli.timeout_ms),
    );
    if let Some(auth) = cli.auth.settings().to_config() {
        resolver = resolver.with_auth(auth);
    }

    match cli.command {
        Commands::Run { data, config, out, anchor } => {
            let report =
                un_cli::run_dispatched(&data, &config, &out, anchor.as_deref(), &resolver)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Ct1 { data, anchor, out } => {
            let table = un_cli::io::read_table(&data)?;
            let summary = un_cli::run_ct1_check(&table, &resolver, &anchor, &out)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Fetch { url } => {
            let path = resolver.fetch_to_cache(&url)?;
            println!("{}", path.display());
        }

        Commands::Synth { out, rows, seed } => {
            let table = un_cli::synth::generate(rows, seed)?;
            un_cli::io::write_table(&out, &table)?;
            tracing::info!(rows, seed, out = %out.display(), "synthetic table written");
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("unreanchor CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
