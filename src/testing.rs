//! Fixtures for tests of the drive-statistics job.
//!
//! [`DailyRowBuilder`] assembles snapshot rows fluently and
//! [`write_daily_csv`] lays them out as a snapshot file with the standard
//! header, so unit and integration tests share one input format.

use crate::hdd::record::{NormalizedRecord, RawRecord, RowOrigin, SourcedRecord};
use anyhow::{Context, Result};
use chrono::Weekday;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Header of a snapshot file, with one extra column that must be ignored.
pub const SNAPSHOT_HEADER: [&str; 6] = [
    "date",
    "serial_number",
    "model",
    "capacity_bytes",
    "failure",
    "smart_9_raw",
];

/// A normalized Monday row.
pub fn normalized(serial: &str, model: &str, capacity_gb: i64, failure: u8) -> NormalizedRecord {
    normalized_on(Some(Weekday::Mon), serial, model, capacity_gb, failure)
}

pub fn normalized_on(
    weekday: Option<Weekday>,
    serial: &str,
    model: &str,
    capacity_gb: i64,
    failure: u8,
) -> NormalizedRecord {
    NormalizedRecord {
        serial_number: serial.to_string(),
        model: model.to_string(),
        capacity_gb,
        weekday,
        failure,
    }
}

/// A raw row; empty strings become missing cells.
pub fn raw(date: &str, serial: &str, model: &str, capacity_bytes: &str, failure: &str) -> RawRecord {
    let cell = |s: &str| (!s.is_empty()).then(|| s.to_string());
    RawRecord {
        date: cell(date),
        serial_number: cell(serial),
        model: cell(model),
        capacity_bytes: cell(capacity_bytes),
        failure: cell(failure),
    }
}

/// Attach an origin (`file`, rows numbered from 1) to raw rows.
pub fn sourced(file: &str, rows: Vec<RawRecord>) -> Vec<SourcedRecord> {
    let file: Arc<str> = Arc::from(file);
    rows.into_iter()
        .zip(1u64..)
        .map(|(raw, row)| SourcedRecord {
            origin: RowOrigin {
                file: Arc::clone(&file),
                row,
            },
            raw: Ok(raw),
        })
        .collect()
}

/// Fluent builder of snapshot rows, as the five text cells of the file.
#[derive(Clone, Debug, Default)]
pub struct DailyRowBuilder {
    rows: Vec<[String; 5]>,
}

impl DailyRowBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one device-day. Cells are written verbatim; pass `""` for a
    /// missing cell.
    #[must_use]
    pub fn row(mut self, date: &str, serial: &str, model: &str, capacity_bytes: &str, failure: &str) -> Self {
        self.rows.push([date, serial, model, capacity_bytes, failure].map(String::from));
        self
    }

    /// Add the same device on each of `dates`, failing on none of them.
    #[must_use]
    pub fn healthy_days(mut self, dates: &[&str], serial: &str, model: &str, capacity_bytes: &str) -> Self {
        for date in dates {
            self = self.row(date, serial, model, capacity_bytes, "0");
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<[String; 5]> {
        self.rows
    }
}

/// Write `rows` as `<dir>/<name>` under [`SNAPSHOT_HEADER`]. The extra
/// column is filled with a constant.
///
/// # Errors
/// File creation or write failures.
pub fn write_daily_csv(dir: &Path, name: &str, rows: &[[String; 5]]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut w = csv::Writer::from_path(&path).with_context(|| format!("create {}", path.display()))?;
    w.write_record(SNAPSHOT_HEADER)?;
    for r in rows {
        w.write_record(r.iter().map(String::as_str).chain(["42"]))?;
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(path)
}

/// A scratch directory holding one snapshot file per `(name, rows)` entry.
/// The directory is removed when the returned handle drops.
///
/// # Errors
/// Directory or file creation failures.
pub fn snapshot_dir(files: &[(&str, Vec<[String; 5]>)]) -> Result<TempDir> {
    let dir = tempfile::tempdir().context("create scratch directory")?;
    for (name, rows) in files {
        write_daily_csv(dir.path(), name, rows)?;
    }
    Ok(dir)
}

/// The three-row example: SN1 healthy on Monday and failing on Tuesday,
/// SN2 healthy on Monday, all `ModelA` at 1 TB.
pub fn example_rows() -> Vec<[String; 5]> {
    DailyRowBuilder::new()
        .row("2021-01-04", "SN1", "ModelA", "1000000000000", "0")
        .row("2021-01-05", "SN1", "ModelA", "1000000000000", "1")
        .row("2021-01-04", "SN2", "ModelA", "1000000000000", "0")
        .build()
}
