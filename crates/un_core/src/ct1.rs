//! CT1: reported values against a resolved anchor
//!
//! For each reported value the check holds when
//! `|value - anchor.value| <= U + anchor.u + T(frame)`, where `T` is the
//! anchor's inter-frame correction for the row's frame (or its `default`).
//! There is no indeterminate band; a row either holds or fails.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::anchor::{AnchorRecord, AnchorResolver, Fetcher};
use crate::error::Ct1Error;
use crate::table::{parse_number, Table};

pub const LABEL_COLUMN: &str = "label";
pub const VALUE_COLUMN: &str = "H0";
pub const UNCERTAINTY_COLUMN: &str = "uncertainty_U";
pub const FRAME_COLUMN: &str = "frame";

/// Columns a reported-values table must carry; `frame` is optional.
pub const REQUIRED_COLUMNS: [&str; 3] = [LABEL_COLUMN, VALUE_COLUMN, UNCERTAINTY_COLUMN];

#[derive(Debug, Clone, PartialEq)]
pub struct ReportedValue {
    pub label: String,
    pub value: f64,
    pub uncertainty_u: f64,
    /// Empty when the row names no frame.
    pub frame: String,
}

/// Per-row result, column names as written to `ct1_results.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ct1Row {
    pub label: String,
    pub frame: String,
    pub anchor_id: String,
    pub diff: f64,
    pub rhs: f64,
    /// `diff - rhs`; non-positive when the row holds.
    pub gap: f64,
    pub holds: bool,
    #[serde(rename = "T_used")]
    pub t_used: f64,
    #[serde(rename = "H0")]
    pub h0: f64,
    #[serde(rename = "U")]
    pub u: f64,
    pub anchor_value: f64,
    #[serde(rename = "anchor_U")]
    pub anchor_u: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSummary {
    pub anchor_id: Option<String>,
    pub quantity: Option<String>,
    pub value: f64,
    pub u: f64,
    pub units: Option<String>,
    pub frame: Option<String>,
}

impl From<&AnchorRecord> for AnchorSummary {
    fn from(anchor: &AnchorRecord) -> Self {
        Self {
            anchor_id: anchor.anchor_id.clone(),
            quantity: anchor.quantity.clone(),
            value: anchor.value,
            u: anchor.u,
            units: anchor.units.clone(),
            frame: anchor.frame.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ct1Counts {
    pub n: usize,
    pub holds: usize,
    pub fails: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ct1Summary {
    pub anchor: AnchorSummary,
    pub counts: Ct1Counts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ct1Outcome {
    pub summary: Ct1Summary,
    pub rows: Vec<Ct1Row>,
}

/// Read reported values from a table with `label`, `H0`, `uncertainty_U`
/// and optionally `frame` columns.
pub fn reported_values_from_table(table: &Table) -> Result<Vec<ReportedValue>, Ct1Error> {
    for column in REQUIRED_COLUMNS {
        if !table.has_column(column) {
            return Err(Ct1Error::MissingColumn { column });
        }
    }
    let label = table.column(Some(LABEL_COLUMN));
    let value = table.column(Some(VALUE_COLUMN));
    let uncertainty = table.column(Some(UNCERTAINTY_COLUMN));
    let frame = table.column(Some(FRAME_COLUMN));

    let number = |row: usize, column: &'static str, col| -> Result<f64, Ct1Error> {
        let cell = table.cell(row, col).unwrap_or_default();
        parse_number(cell).ok_or_else(|| Ct1Error::InvalidNumber {
            row: row + 1,
            column,
            value: cell.to_string(),
        })
    };

    (0..table.len())
        .map(|row| {
            Ok(ReportedValue {
                label: table.cell(row, label).unwrap_or_default().to_string(),
                value: number(row, VALUE_COLUMN, value)?,
                uncertainty_u: number(row, UNCERTAINTY_COLUMN, uncertainty)?,
                frame: table.cell(row, frame).unwrap_or_default().to_string(),
            })
        })
        .collect()
}

pub fn evaluate_row(reported: &ReportedValue, anchor: &AnchorRecord) -> Ct1Row {
    let t_used = anchor.correction_for(&reported.frame);
    let diff = (reported.value - anchor.value).abs();
    let rhs = reported.uncertainty_u + anchor.u + t_used;
    Ct1Row {
        label: reported.label.clone(),
        frame: reported.frame.clone(),
        anchor_id: anchor.id().to_string(),
        diff,
        rhs,
        gap: diff - rhs,
        holds: diff <= rhs,
        t_used,
        h0: reported.value,
        u: reported.uncertainty_u,
        anchor_value: anchor.value,
        anchor_u: anchor.u,
    }
}

/// Evaluate every reported value against one anchor. Row order is preserved.
pub fn check_against_anchor(values: &[ReportedValue], anchor: &AnchorRecord) -> Ct1Outcome {
    let rows: Vec<Ct1Row> = values.par_iter().map(|v| evaluate_row(v, anchor)).collect();
    let holds = rows.iter().filter(|r| r.holds).count();
    let counts = Ct1Counts { n: rows.len(), holds, fails: rows.len() - holds };
    tracing::debug!(n = counts.n, holds = counts.holds, fails = counts.fails, "CT1 evaluated");
    Ct1Outcome { summary: Ct1Summary { anchor: anchor.into(), counts }, rows }
}

/// Resolve `address` and run CT1 over a reported-values table.
pub fn run_ct1<F: Fetcher>(
    table: &Table,
    resolver: &AnchorResolver<F>,
    address: &str,
) -> Result<Ct1Outcome, Ct1Error> {
    let values = reported_values_from_table(table)?;
    let anchor = resolver.resolve(address)?;
    Ok(check_against_anchor(&values, &anchor))
}
