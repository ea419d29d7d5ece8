//! Schema sniffing: decide which pipeline a table belongs to from its headers.

use crate::columns::{ColumnMap, LogicalField};
use crate::ct1::REQUIRED_COLUMNS;

/// Logical fields a generic metrology table must resolve.
pub const METROLOGY_FIELDS: [LogicalField; 4] = [
    LogicalField::Measured,
    LogicalField::Nominal,
    LogicalField::TolLower,
    LogicalField::TolUpper,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetKind {
    GenericMetrology,
    CosmologyAnchorCheck,
    /// Neither schema matched; lists the metrology columns that were missing.
    Unrecognized { missing: Vec<String> },
}

/// Classify a table by its header row. Metrology wins when both match.
pub fn sniff(headers: &[String], columns: &ColumnMap) -> DatasetKind {
    let has = |name: &str| headers.iter().any(|h| h == name);

    let missing: Vec<String> = METROLOGY_FIELDS
        .iter()
        .filter(|field| !columns.get(**field).is_some_and(|name| has(name)))
        .map(|field| columns.get(*field).unwrap_or(field.as_str()).to_string())
        .collect();
    if missing.is_empty() {
        return DatasetKind::GenericMetrology;
    }
    if REQUIRED_COLUMNS.iter().all(|c| has(c)) {
        return DatasetKind::CosmologyAnchorCheck;
    }
    DatasetKind::Unrecognized { missing }
}
