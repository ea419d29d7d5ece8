//! UN-T2 guard-band classification and UN-T5 edge-of-spec behaviour.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::columns::LogicalField;
use crate::config::Config;
use crate::error::ValidationError;
use crate::guard_band::{decide_record, Decision};
use crate::limits::{compute_spec_limits, compute_uncertainty_u};
use crate::table::Table;

use super::rate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardBandSummary {
    pub n: usize,
    pub share: BTreeMap<Decision, f64>,
    pub counts: BTreeMap<Decision, usize>,
    pub agreement_with_archival: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeOfSpec {
    pub n_edge: usize,
    pub indeterminate_rate: Option<f64>,
}

/// UN-T2: classify every record and compare with the archival decision.
///
/// Returns the summary and the per-record decisions in input row order.
pub fn guard_band_classification(
    table: &Table,
    config: &Config,
) -> Result<(GuardBandSummary, Vec<Decision>), ValidationError> {
    let cols = &config.columns;
    let measured = cols.numeric(table, LogicalField::Measured);
    let limits = compute_spec_limits(table, config);
    let u = compute_uncertainty_u(table, config)?;
    let gamma = config.params.gamma;

    let decisions: Vec<Decision> = (0..table.len())
        .map(|row| decide_record(measured[row], limits[row], u[row], gamma))
        .collect();

    let n = decisions.len();
    let mut counts: BTreeMap<Decision, usize> = Decision::ALL.iter().map(|d| (*d, 0)).collect();
    for d in &decisions {
        *counts.entry(*d).or_insert(0) += 1;
    }
    let share = counts
        .iter()
        .map(|(d, c)| (*d, rate(*c, n).unwrap_or(0.0)))
        .collect();

    let accepted = cols.resolve(table, LogicalField::Accepted);
    let agreement_with_archival = if accepted.is_present() {
        let archival = table.numeric(accepted);
        let mut determinate = 0;
        let mut agree = 0;
        for (d, gold) in decisions.iter().zip(archival) {
            if !d.is_determinate() {
                continue;
            }
            determinate += 1;
            if archival_decision(gold) == Some(*d) {
                agree += 1;
            }
        }
        rate(agree, determinate)
    } else {
        None
    };

    tracing::debug!(n, ?counts, ?agreement_with_archival, "UN-T2 guard-band classification");
    Ok((GuardBandSummary { n, share, counts, agreement_with_archival }, decisions))
}

/// Archival `1` accepted, `0` rejected; anything else carries no decision.
fn archival_decision(value: Option<f64>) -> Option<Decision> {
    match value {
        Some(v) if v == 1.0 => Some(Decision::Conform),
        Some(v) if v == 0.0 => Some(Decision::Nonconform),
        _ => None,
    }
}

/// UN-T5: indeterminate share among records within `edge_delta` of a limit.
pub fn edge_of_spec(table: &Table, config: &Config) -> Result<EdgeOfSpec, ValidationError> {
    let measured = config.columns.numeric(table, LogicalField::Measured);
    let limits = compute_spec_limits(table, config);
    let delta = config.params.edge_delta;

    let near: Vec<usize> = (0..table.len())
        .filter(|&row| match (measured[row], limits[row]) {
            (Some(m), Some(l)) => (m - l.lsl).abs() <= delta || (l.usl - m).abs() <= delta,
            _ => false,
        })
        .collect();
    if near.is_empty() {
        return Ok(EdgeOfSpec { n_edge: 0, indeterminate_rate: None });
    }

    let u = compute_uncertainty_u(table, config)?;
    let gamma = config.params.gamma;
    let indeterminate = near
        .iter()
        .filter(|&&row| {
            decide_record(measured[row], limits[row], u[row], gamma) == Decision::Indeterminate
        })
        .count();

    tracing::debug!(n_edge = near.len(), indeterminate, "UN-T5 edge of spec");
    Ok(EdgeOfSpec { n_edge: near.len(), indeterminate_rate: rate(indeterminate, near.len()) })
}
