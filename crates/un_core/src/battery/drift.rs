//! UN-T4 temporal drift around a calibration cut.

use serde::{Deserialize, Serialize};

use crate::columns::LogicalField;
use crate::config::Config;
use crate::error::ValidationError;
use crate::table::{parse_instant, Table};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalDrift {
    pub before_n: usize,
    pub after_n: usize,
    pub delta_mean: Option<f64>,
}

impl TemporalDrift {
    fn empty() -> Self {
        Self { before_n: 0, after_n: 0, delta_mean: None }
    }
}

#[derive(Default)]
struct Side {
    n: usize,
    sum: f64,
    known: usize,
}

impl Side {
    fn push(&mut self, measured: Option<f64>) {
        self.n += 1;
        if let Some(m) = measured {
            self.sum += m;
            self.known += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.known > 0).then(|| self.sum / self.known as f64)
    }
}

/// UN-T4: `mean(after) - mean(before)` of measured values, split at the cut.
///
/// Before is strictly earlier than the cut, after is at or later. Rows whose
/// timestamp is blank or unparsable fall on neither side.
pub fn temporal_drift(table: &Table, config: &Config) -> Result<TemporalDrift, ValidationError> {
    let Some(cut) = config.params.calibration_instant()? else {
        return Ok(TemporalDrift::empty());
    };
    let cols = &config.columns;
    let ts_col = cols.resolve(table, LogicalField::Timestamp);
    if !ts_col.is_present() {
        return Ok(TemporalDrift::empty());
    }

    let measured = cols.numeric(table, LogicalField::Measured);
    let mut before = Side::default();
    let mut after = Side::default();
    let mut unparsable = 0usize;
    for (row, raw) in table.text(ts_col).into_iter().enumerate() {
        match raw.and_then(parse_instant) {
            Some(ts) if ts < cut => before.push(measured[row]),
            Some(_) => after.push(measured[row]),
            None => unparsable += 1,
        }
    }
    if unparsable > 0 {
        tracing::warn!(unparsable, "UN-T4 skipped rows without a parsable timestamp");
    }

    let delta_mean = match (before.mean(), after.mean()) {
        (Some(b), Some(a)) => Some(a - b),
        _ => None,
    };
    tracing::debug!(before_n = before.n, after_n = after.n, ?delta_mean, "UN-T4 temporal drift");
    Ok(TemporalDrift { before_n: before.n, after_n: after.n, delta_mean })
}
