//! Logical field → column resolution.

use serde::{Deserialize, Serialize};

use crate::table::{ColumnRef, Table};

/// Logical measurement fields a configuration can map to table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    Nominal,
    TolLower,
    TolUpper,
    Measured,
    TrueValue,
    UncertaintyU,
    Sigma,
    InstrumentId,
    PartId,
    Timestamp,
    Accepted,
}

impl LogicalField {
    pub const ALL: [LogicalField; 11] = [
        LogicalField::Nominal,
        LogicalField::TolLower,
        LogicalField::TolUpper,
        LogicalField::Measured,
        LogicalField::TrueValue,
        LogicalField::UncertaintyU,
        LogicalField::Sigma,
        LogicalField::InstrumentId,
        LogicalField::PartId,
        LogicalField::Timestamp,
        LogicalField::Accepted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalField::Nominal => "nominal",
            LogicalField::TolLower => "tol_lower",
            LogicalField::TolUpper => "tol_upper",
            LogicalField::Measured => "measured",
            LogicalField::TrueValue => "true_value",
            LogicalField::UncertaintyU => "uncertainty_U",
            LogicalField::Sigma => "sigma",
            LogicalField::InstrumentId => "instrument_id",
            LogicalField::PartId => "part_id",
            LogicalField::Timestamp => "timestamp",
            LogicalField::Accepted => "accepted",
        }
    }
}

fn default_sigma() -> Option<String> {
    Some("sigma".to_string())
}

/// The `columns` mapping of a configuration. Every entry may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default)]
    pub nominal: Option<String>,
    #[serde(default)]
    pub tol_lower: Option<String>,
    #[serde(default)]
    pub tol_upper: Option<String>,
    #[serde(default)]
    pub measured: Option<String>,
    #[serde(default)]
    pub true_value: Option<String>,
    #[serde(default, rename = "uncertainty_U")]
    pub uncertainty_u: Option<String>,
    #[serde(default = "default_sigma")]
    pub sigma: Option<String>,
    #[serde(default)]
    pub instrument_id: Option<String>,
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub accepted: Option<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            nominal: None,
            tol_lower: None,
            tol_upper: None,
            measured: None,
            true_value: None,
            uncertainty_u: None,
            sigma: default_sigma(),
            instrument_id: None,
            part_id: None,
            timestamp: None,
            accepted: None,
        }
    }
}

impl ColumnMap {
    /// Map every logical field to the column of the same name.
    pub fn identity() -> Self {
        let mut map = Self::default();
        for field in LogicalField::ALL {
            *map.slot_mut(field) = Some(field.as_str().to_string());
        }
        map
    }

    pub fn get(&self, field: LogicalField) -> Option<&str> {
        match field {
            LogicalField::Nominal => self.nominal.as_deref(),
            LogicalField::TolLower => self.tol_lower.as_deref(),
            LogicalField::TolUpper => self.tol_upper.as_deref(),
            LogicalField::Measured => self.measured.as_deref(),
            LogicalField::TrueValue => self.true_value.as_deref(),
            LogicalField::UncertaintyU => self.uncertainty_u.as_deref(),
            LogicalField::Sigma => self.sigma.as_deref(),
            LogicalField::InstrumentId => self.instrument_id.as_deref(),
            LogicalField::PartId => self.part_id.as_deref(),
            LogicalField::Timestamp => self.timestamp.as_deref(),
            LogicalField::Accepted => self.accepted.as_deref(),
        }
        .filter(|name| !name.is_empty())
    }

    fn slot_mut(&mut self, field: LogicalField) -> &mut Option<String> {
        match field {
            LogicalField::Nominal => &mut self.nominal,
            LogicalField::TolLower => &mut self.tol_lower,
            LogicalField::TolUpper => &mut self.tol_upper,
            LogicalField::Measured => &mut self.measured,
            LogicalField::TrueValue => &mut self.true_value,
            LogicalField::UncertaintyU => &mut self.uncertainty_u,
            LogicalField::Sigma => &mut self.sigma,
            LogicalField::InstrumentId => &mut self.instrument_id,
            LogicalField::PartId => &mut self.part_id,
            LogicalField::Timestamp => &mut self.timestamp,
            LogicalField::Accepted => &mut self.accepted,
        }
    }

    /// Resolve a field against a table. Unmapped or missing columns are `Absent`.
    pub fn resolve(&self, table: &Table, field: LogicalField) -> ColumnRef {
        table.column(self.get(field))
    }

    /// Numeric column for `field`; all-missing when unresolved.
    pub fn numeric(&self, table: &Table, field: LogicalField) -> Vec<Option<f64>> {
        table.numeric(self.resolve(table, field))
    }

    /// Text column for `field`; all-missing when unresolved.
    pub fn text<'t>(&self, table: &'t Table, field: LogicalField) -> Vec<Option<&'t str>> {
        table.text(self.resolve(table, field))
    }
}
