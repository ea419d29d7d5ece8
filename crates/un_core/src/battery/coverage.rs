//! UN-T1 inequality coverage and UN-T6 interval coverage.
//!
//! Both are restricted to records carrying a reference (`true_value`).

use serde::{Deserialize, Serialize};

use crate::columns::LogicalField;
use crate::config::Config;
use crate::error::ValidationError;
use crate::limits::{compute_tolerance, compute_uncertainty_u};
use crate::table::Table;

use super::rate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InequalityCoverage {
    pub n: usize,
    pub coverage_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalCoverage {
    pub n: usize,
    pub coverage: Option<f64>,
}

/// UN-T1: share of referenced records with `|measured - true| <= tol + U`.
pub fn inequality_coverage(
    table: &Table,
    config: &Config,
) -> Result<InequalityCoverage, ValidationError> {
    let cols = &config.columns;
    let measured = cols.numeric(table, LogicalField::Measured);
    let truth = cols.numeric(table, LogicalField::TrueValue);
    let tol = compute_tolerance(table, config);
    let u = compute_uncertainty_u(table, config)?;

    let mut n = 0;
    let mut covered = 0;
    for row in 0..table.len() {
        let Some(t) = truth[row] else { continue };
        n += 1;
        if let (Some(m), Some(tol), Some(u)) = (measured[row], tol[row], u[row]) {
            if (m - t).abs() <= tol + u {
                covered += 1;
            }
        }
    }

    tracing::debug!(n, covered, "UN-T1 inequality coverage");
    Ok(InequalityCoverage { n, coverage_rate: rate(covered, n) })
}

/// UN-T6: share of referenced records whose true value lies in `[m - U, m + U]`.
pub fn interval_coverage(
    table: &Table,
    config: &Config,
) -> Result<IntervalCoverage, ValidationError> {
    let cols = &config.columns;
    let measured = cols.numeric(table, LogicalField::Measured);
    let truth = cols.numeric(table, LogicalField::TrueValue);
    let u = compute_uncertainty_u(table, config)?;

    let mut n = 0;
    let mut covered = 0;
    for row in 0..table.len() {
        let Some(t) = truth[row] else { continue };
        n += 1;
        if let (Some(m), Some(u)) = (measured[row], u[row]) {
            if t >= m - u && t <= m + u {
                covered += 1;
            }
        }
    }

    tracing::debug!(n, covered, "UN-T6 interval coverage");
    Ok(IntervalCoverage { n, coverage: rate(covered, n) })
}
