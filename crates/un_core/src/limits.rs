//! Specification limits and expanded uncertainty per record.

use crate::columns::LogicalField;
use crate::config::Config;
use crate::error::ValidationError;
use crate::table::Table;

/// Derived limits for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecLimits {
    pub lsl: f64,
    pub usl: f64,
    pub tol: f64,
}

impl SpecLimits {
    /// Tolerances are magnitudes: their sign is dropped.
    pub fn new(nominal: f64, tol_lower: f64, tol_upper: f64) -> Self {
        let (lo, hi) = (tol_lower.abs(), tol_upper.abs());
        Self { lsl: nominal - lo, usl: nominal + hi, tol: lo.max(hi) }
    }
}

/// Limits for every row; `None` where nominal or either tolerance is missing.
pub fn compute_spec_limits(table: &Table, config: &Config) -> Vec<Option<SpecLimits>> {
    let cols = &config.columns;
    let nominal = cols.numeric(table, LogicalField::Nominal);
    let tol_lower = cols.numeric(table, LogicalField::TolLower);
    let tol_upper = cols.numeric(table, LogicalField::TolUpper);

    nominal
        .into_iter()
        .zip(tol_lower)
        .zip(tol_upper)
        .map(|((n, lo), hi)| Some(SpecLimits::new(n?, lo?, hi?)))
        .collect()
}

/// `max(|tol_lower|, |tol_upper|)` per row, independent of the nominal value.
pub fn compute_tolerance(table: &Table, config: &Config) -> Vec<Option<f64>> {
    let cols = &config.columns;
    cols.numeric(table, LogicalField::TolLower)
        .into_iter()
        .zip(cols.numeric(table, LogicalField::TolUpper))
        .map(|(lo, hi)| Some(lo?.abs().max(hi?.abs())))
        .collect()
}

/// Expanded uncertainty `U` per row.
///
/// Uses the configured `uncertainty_U` column when it exists in the table,
/// otherwise `sigma * coverage_k`. Fails when neither is available.
pub fn compute_uncertainty_u(
    table: &Table,
    config: &Config,
) -> Result<Vec<Option<f64>>, ValidationError> {
    let cols = &config.columns;
    let direct = cols.resolve(table, LogicalField::UncertaintyU);
    if direct.is_present() {
        return Ok(table.numeric(direct));
    }

    let sigma = cols.resolve(table, LogicalField::Sigma);
    if sigma.is_present() {
        let k = config.params.coverage_k;
        return Ok(table.numeric(sigma).into_iter().map(|s| s.map(|s| s * k)).collect());
    }

    Err(ValidationError::NoUncertaintySource {
        sigma: cols.get(LogicalField::Sigma).unwrap_or("sigma").to_string(),
    })
}
