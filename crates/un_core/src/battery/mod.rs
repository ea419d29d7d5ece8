//! Conformance test battery (UN-T1 .. UN-T6)
//!
//! Each test reads the whole table under one configuration and returns a
//! small summary. Tests are independent: [`run_all`] evaluates them in
//! parallel and a configuration error in one test is recorded under that
//! test's key without suppressing the others.

pub mod coverage;
pub mod drift;
pub mod guard;
pub mod instruments;

use serde::{Deserialize, Serialize};

use crate::columns::LogicalField;
use crate::config::Config;
use crate::error::ValidationError;
use crate::guard_band::Decision;
use crate::table::{format_number, Table};

pub use coverage::{inequality_coverage, interval_coverage, InequalityCoverage, IntervalCoverage};
pub use drift::{temporal_drift, TemporalDrift};
pub use guard::{edge_of_spec, guard_band_classification, EdgeOfSpec, GuardBandSummary};
pub use instruments::{cross_instrument, CrossInstrument};

/// Column added to the table when the uncertainty is derived from `sigma`.
pub const DERIVED_UNCERTAINTY_COLUMN: &str = "uncertainty_U";

/// Column appended to the decision artifact.
pub const DECISION_COLUMN: &str = "decision";

/// `hits / n`, or `None` when there is nothing to divide.
pub(crate) fn rate(hits: usize, n: usize) -> Option<f64> {
    (n > 0).then(|| hits as f64 / n as f64)
}

/// Outcome of one test: its summary, or the error that stopped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestOutcome<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> TestOutcome<T> {
    pub fn ok(&self) -> Option<&T> {
        match self {
            TestOutcome::Ok(v) => Some(v),
            TestOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestOutcome::Failed { .. })
    }
}

impl<T> From<Result<T, ValidationError>> for TestOutcome<T> {
    fn from(result: Result<T, ValidationError>) -> Self {
        match result {
            Ok(v) => TestOutcome::Ok(v),
            Err(e) => TestOutcome::Failed { error: e.to_string() },
        }
    }
}

/// The validation report, keyed `UN-T1` .. `UN-T6`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(rename = "UN-T1")]
    pub t1: TestOutcome<InequalityCoverage>,
    #[serde(rename = "UN-T2")]
    pub t2: TestOutcome<GuardBandSummary>,
    #[serde(rename = "UN-T3")]
    pub t3: TestOutcome<CrossInstrument>,
    #[serde(rename = "UN-T4")]
    pub t4: TestOutcome<TemporalDrift>,
    #[serde(rename = "UN-T5")]
    pub t5: TestOutcome<EdgeOfSpec>,
    #[serde(rename = "UN-T6")]
    pub t6: TestOutcome<IntervalCoverage>,
}

impl ValidationReport {
    /// Ids of tests that failed with a configuration error.
    pub fn failed_tests(&self) -> Vec<&'static str> {
        let flags = [
            ("UN-T1", self.t1.is_failed()),
            ("UN-T2", self.t2.is_failed()),
            ("UN-T3", self.t3.is_failed()),
            ("UN-T4", self.t4.is_failed()),
            ("UN-T5", self.t5.is_failed()),
            ("UN-T6", self.t6.is_failed()),
        ];
        flags.iter().filter(|(_, failed)| *failed).map(|(id, _)| *id).collect()
    }
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: ValidationReport,
    /// Input columns (plus any derived uncertainty) and a `decision` column.
    /// `None` when UN-T2 could not run.
    pub decisions: Option<Table>,
}

/// Add a derived `uncertainty_U` column (`sigma * coverage_k`) when the table
/// has none and a sigma column exists.
pub fn materialize_uncertainty(table: &Table, config: &Config) -> Table {
    if table.has_column(DERIVED_UNCERTAINTY_COLUMN) {
        return table.clone();
    }
    let sigma = config.columns.resolve(table, LogicalField::Sigma);
    if !sigma.is_present() {
        return table.clone();
    }
    let k = config.params.coverage_k;
    let cells = table
        .numeric(sigma)
        .into_iter()
        .map(|s| format_number(s.map(|s| s * k)))
        .collect();
    tracing::debug!(coverage_k = k, "derived uncertainty_U from sigma");
    table.clone().with_column(DERIVED_UNCERTAINTY_COLUMN, cells)
}

/// Run UN-T1 .. UN-T6 over one table and configuration.
pub fn run_all(table: &Table, config: &Config) -> RunOutput {
    let table = materialize_uncertainty(table, config);
    let table = &table;

    let ((t1, t2), ((t3, t4), (t5, t6))) = rayon::join(
        || {
            rayon::join(
                || inequality_coverage(table, config),
                || guard_band_classification(table, config),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || cross_instrument(table, config),
                        || temporal_drift(table, config),
                    )
                },
                || {
                    rayon::join(
                        || edge_of_spec(table, config),
                        || interval_coverage(table, config),
                    )
                },
            )
        },
    );

    let (t2, decisions) = match t2 {
        Ok((summary, decisions)) => {
            (TestOutcome::Ok(summary), Some(decision_table(table, &decisions)))
        }
        Err(e) => (TestOutcome::Failed { error: e.to_string() }, None),
    };

    let report = ValidationReport {
        t1: t1.into(),
        t2,
        t3: t3.into(),
        t4: t4.into(),
        t5: t5.into(),
        t6: t6.into(),
    };
    for id in report.failed_tests() {
        tracing::warn!(test = id, "conformance test failed");
    }
    RunOutput { report, decisions }
}

fn decision_table(table: &Table, decisions: &[Decision]) -> Table {
    let cells = decisions.iter().map(|d| d.as_str().to_string()).collect();
    table.clone().with_column(DECISION_COLUMN, cells)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::columns::ColumnMap;
    use crate::config::Config;
    use crate::table::Table;

    pub fn config() -> Config {
        Config { columns: ColumnMap::identity(), ..Config::default() }
    }

    pub fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{config, table};
    use super::*;

    fn spec_example() -> Table {
        table(
            &[
                "part_id",
                "nominal",
                "tol_lower",
                "tol_upper",
                "measured",
                "true_value",
                "uncertainty_U",
                "instrument_id",
                "accepted",
            ],
            &[
                &["1", "10", "0.05", "0.05", "10.01", "10.00", "0.01", "A", "1"],
                &["1", "10", "0.05", "0.05", "9.99", "10.00", "0.01", "B", "1"],
                &["2", "10", "0.05", "0.05", "10.06", "", "0.01", "A", "0"],
            ],
        )
    }

    #[test]
    fn test_run_all_spec_example() {
        let out = run_all(&spec_example(), &config());
        let t1 = out.report.t1.ok().unwrap();
        assert_eq!(t1.n, 2);
        assert_eq!(t1.coverage_rate, Some(1.0));

        let decisions = out.decisions.unwrap();
        assert_eq!(decisions.headers().last().map(String::as_str), Some(DECISION_COLUMN));
        let col = decisions.column(Some(DECISION_COLUMN));
        assert_eq!(decisions.text(col), vec![Some("conform"), Some("conform"), Some("nonconform")]);

        let t3 = out.report.t3.ok().unwrap();
        assert_eq!(t3.n_pairs, 1);
        assert_eq!(t3.exceed_rate, Some(0.0));
        assert!(out.report.failed_tests().is_empty());
    }

    #[test]
    fn test_report_keys() {
        let out = run_all(&spec_example(), &config());
        let json = serde_json::to_value(&out.report).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["UN-T1", "UN-T2", "UN-T3", "UN-T4", "UN-T5", "UN-T6"]);
        assert_eq!(json["UN-T4"]["delta_mean"], serde_json::Value::Null);
        assert_eq!(json["UN-T2"]["counts"]["nonconform"], 1);
    }

    #[test]
    fn test_sigma_is_materialized() {
        let t = table(
            &["nominal", "tol_lower", "tol_upper", "measured", "sigma"],
            &[&["10", "0.05", "0.05", "10.0", "0.005"]],
        );
        let out = run_all(&t, &config());
        let decisions = out.decisions.unwrap();
        assert!(decisions.has_column(DERIVED_UNCERTAINTY_COLUMN));
        let u = decisions.numeric(decisions.column(Some(DERIVED_UNCERTAINTY_COLUMN)));
        assert!((u[0].unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_config_error_isolated_to_affected_tests() {
        let mut cfg = config();
        cfg.params.calibration_cut = Some("2024-01-02".into());
        let t = table(
            &["nominal", "tol_lower", "tol_upper", "measured", "timestamp"],
            &[&["10", "1", "1", "10.0", "2024-01-01"], &["10", "1", "1", "10.4", "2024-01-03"]],
        );
        let out = run_all(&t, &cfg);
        assert_eq!(out.report.failed_tests(), vec!["UN-T1", "UN-T2", "UN-T6"]);
        assert!(out.decisions.is_none());
        let t4 = out.report.t4.ok().unwrap();
        assert!((t4.delta_mean.unwrap() - 0.4).abs() < 1e-9);
        assert_eq!(out.report.t5.ok().unwrap().n_edge, 0);

        let json = serde_json::to_value(&out.report).unwrap();
        assert!(json["UN-T1"]["error"].as_str().unwrap().contains("no uncertainty source"));
    }
}
