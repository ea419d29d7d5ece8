//! CSV / YAML / JSON file plumbing around `un_core`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use un_core::{Config, Table};

/// Read a CSV file with a header row into a string-cell table.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut table = Table::new(headers);

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("Failed to parse CSV row {} of {}", line + 2, path.display())
        })?;
        table.push_row(record.iter().map(str::to_string).collect());
    }
    tracing::debug!(
        rows = table.len(),
        columns = table.headers().len(),
        path = %path.display(),
        "read table"
    );
    Ok(table)
}

pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

/// Write serializable rows as CSV, header taken from the field names.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

pub fn load_config(path: &Path) -> Result<Config> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    Config::from_yaml_str(&yaml).with_context(|| format!("Invalid config file: {}", path.display()))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory: {}", path.display()))
}
