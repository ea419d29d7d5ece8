//! String-cell measurement table
//!
//! Cells are kept exactly as read so the decision artifact can echo every
//! input column. Typed access goes through [`ColumnRef`]: a column that is
//! not present reads as all-missing instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Handle to a column, or the marker for "no such column".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef {
    Present(usize),
    Absent,
}

impl ColumnRef {
    pub fn is_present(&self) -> bool {
        matches!(self, ColumnRef::Present(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Build a table; short rows are padded with blanks, long rows truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self::new(headers);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row, padding short rows with blanks. Cells past the last
    /// header are dropped with a warning.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.len() > self.headers.len() {
            tracing::warn!(
                row = self.rows.len() + 1,
                dropped = row.len() - self.headers.len(),
                "row is wider than the header; extra cells dropped"
            );
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Look up a column by name. `None` (unmapped) and unknown names are `Absent`.
    pub fn column(&self, name: Option<&str>) -> ColumnRef {
        name.and_then(|n| self.headers.iter().position(|h| h == n))
            .map_or(ColumnRef::Absent, ColumnRef::Present)
    }

    /// Non-blank cell text, or `None` when blank or the column is absent.
    pub fn cell(&self, row: usize, column: ColumnRef) -> Option<&str> {
        let ColumnRef::Present(idx) = column else {
            return None;
        };
        let value = self.rows.get(row)?.get(idx)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    pub fn text(&self, column: ColumnRef) -> Vec<Option<&str>> {
        (0..self.len()).map(|row| self.cell(row, column)).collect()
    }

    /// Numeric view of a column; blank and unparsable cells are missing.
    pub fn numeric(&self, column: ColumnRef) -> Vec<Option<f64>> {
        (0..self.len()).map(|row| self.cell(row, column).and_then(parse_number)).collect()
    }

    /// Append `name` as a new column, or overwrite it if it already exists.
    pub fn with_column(mut self, name: &str, cells: Vec<String>) -> Self {
        debug_assert_eq!(cells.len(), self.rows.len());
        match self.headers.iter().position(|h| h == name) {
            Some(idx) => {
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => {
                self.headers.push(name.to_string());
                let mut cells = cells.into_iter();
                for row in &mut self.rows {
                    row.push(cells.next().unwrap_or_default());
                }
            }
        }
        self
    }
}

/// Coerce a cell to a number. NaN reads as missing.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parse an instant, normalised to naive UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`
/// and bare dates (midnight).
pub fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    const FORMATS: [&str; 4] =
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a number the way it is written back into the table.
pub fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec!["1.5".into(), "x".into()], vec!["".into()], vec!["nan".into(), " y ".into()]],
        )
    }

    #[test]
    fn test_absent_column_reads_missing() {
        let t = sample();
        let col = t.column(Some("zzz"));
        assert_eq!(col, ColumnRef::Absent);
        assert_eq!(t.numeric(col), vec![None, None, None]);
        assert_eq!(t.column(None), ColumnRef::Absent);
    }

    #[test]
    fn test_numeric_coercion() {
        let t = sample();
        assert_eq!(t.numeric(t.column(Some("a"))), vec![Some(1.5), None, None]);
        assert_eq!(t.text(t.column(Some("b"))), vec![Some("x"), None, Some("y")]);
    }

    #[test]
    fn test_with_column_appends_and_replaces() {
        let t = sample().with_column("c", vec!["1".into(), "2".into(), "3".into()]);
        assert_eq!(t.headers(), &["a", "b", "c"]);
        assert_eq!(t.rows()[1], vec!["", "", "2"]);

        let t = t.with_column("a", vec!["9".into(), "9".into(), "9".into()]);
        assert_eq!(t.headers().len(), 3);
        assert_eq!(t.numeric(t.column(Some("a"))), vec![Some(9.0); 3]);
    }

    #[test]
    fn test_parse_instant_formats() {
        let midnight = parse_instant("2024-03-01").unwrap();
        assert_eq!(parse_instant("2024-03-01T00:00:00").unwrap(), midnight);
        assert_eq!(parse_instant("2024-03-01 00:00:00").unwrap(), midnight);
        assert_eq!(parse_instant("2024-03-01T02:00:00+02:00").unwrap(), midnight);
        assert!(parse_instant("2024-01-01T12:30:00.250").is_some());
        assert!(parse_instant("yesterday").is_none());
        assert!(parse_instant("  ").is_none());
    }
}
