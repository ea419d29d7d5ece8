//! File-level pipelines behind each subcommand.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use un_core::anchor::Fetcher;
use un_core::ct1::Ct1Summary;
use un_core::{
    run_all, run_ct1, sniff, AnchorResolver, Config, DatasetKind, Table, ValidationReport,
};

use crate::io::{ensure_dir, load_config, read_table, write_json, write_records, write_table};

pub const REPORT_FILE: &str = "report.json";
pub const DECISIONS_FILE: &str = "decisions.csv";
pub const CT1_SUMMARY_FILE: &str = "ct1_summary.json";
pub const CT1_RESULTS_FILE: &str = "ct1_results.csv";

/// What a `run` invocation produced, printed as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RunReport {
    Validation(ValidationReport),
    Ct1(Ct1Summary),
}

/// Run the battery and write `report.json` plus `decisions.csv`.
///
/// `decisions.csv` is skipped when UN-T2 itself could not run.
pub fn run_validation(table: &Table, config: &Config, out_dir: &Path) -> Result<ValidationReport> {
    ensure_dir(out_dir)?;
    let output = run_all(table, config);

    write_json(&out_dir.join(REPORT_FILE), &output.report)?;
    match &output.decisions {
        Some(decisions) => write_table(&out_dir.join(DECISIONS_FILE), decisions)?,
        None => tracing::warn!("UN-T2 failed; {} not written", DECISIONS_FILE),
    }
    tracing::info!(out = %out_dir.display(), rows = table.len(), "validation report written");
    Ok(output.report)
}

/// Resolve the anchor, run CT1 and write `ct1_summary.json` plus
/// `ct1_results.csv`.
pub fn run_ct1_check<F: Fetcher>(
    table: &Table,
    resolver: &AnchorResolver<F>,
    address: &str,
    out_dir: &Path,
) -> Result<Ct1Summary> {
    let outcome = run_ct1(table, resolver, address)
        .with_context(|| format!("CT1 check against anchor '{address}' failed"))?;

    ensure_dir(out_dir)?;
    write_json(&out_dir.join(CT1_SUMMARY_FILE), &outcome.summary)?;
    write_records(&out_dir.join(CT1_RESULTS_FILE), &outcome.rows)?;
    tracing::info!(
        anchor = address,
        holds = outcome.summary.counts.holds,
        fails = outcome.summary.counts.fails,
        "CT1 results written"
    );
    Ok(outcome.summary)
}

/// Sniff the table schema and run the matching pipeline.
pub fn run_dispatched<F: Fetcher>(
    data: &Path,
    config_path: &Path,
    out_dir: &Path,
    anchor: Option<&str>,
    resolver: &AnchorResolver<F>,
) -> Result<RunReport> {
    let table = read_table(data)?;
    let config = load_config(config_path)?;

    match sniff(table.headers(), &config.columns) {
        DatasetKind::GenericMetrology => {
            Ok(RunReport::Validation(run_validation(&table, &config, out_dir)?))
        }
        DatasetKind::CosmologyAnchorCheck => {
            let Some(anchor) = anchor else {
                bail!("{} is a reported-values table; pass --anchor to run CT1", data.display());
            };
            Ok(RunReport::Ct1(run_ct1_check(&table, resolver, anchor, out_dir)?))
        }
        DatasetKind::Unrecognized { missing } => bail!(
            "{}: unrecognized table, missing columns: {}",
            data.display(),
            missing.join(", ")
        ),
    }
}
