//! Row types flowing through the drive-statistics pipeline.

use crate::error::ParseError;
use chrono::Weekday;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One device on one day, as found in a snapshot file. Every field is kept
/// as text; empty cells are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub date: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub capacity_bytes: Option<String>,
    pub failure: Option<String>,
}

impl RawRecord {
    /// Snapshot columns read into a record, in field order.
    pub const COLUMNS: [&'static str; 5] = ["date", "serial_number", "model", "capacity_bytes", "failure"];

    /// Build from cells ordered as [`RawRecord::COLUMNS`].
    pub fn from_cells(cells: Vec<Option<String>>) -> Self {
        let mut cells = cells.into_iter();
        let mut next = || cells.next().flatten();
        Self {
            date: next(),
            serial_number: next(),
            model: next(),
            capacity_bytes: next(),
            failure: next(),
        }
    }
}

/// Where a raw row came from: file and 1-based data row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowOrigin {
    pub file: Arc<str>,
    pub row: u64,
}

impl fmt::Display for RowOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.row)
    }
}

/// A snapshot row with its origin. `raw` is an error when the row could not
/// be split into the snapshot columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcedRecord {
    pub origin: RowOrigin,
    pub raw: Result<RawRecord, ParseError>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub serial_number: String,
    pub model: String,
    pub capacity_gb: i64,
    /// `None` when the source row had no date.
    pub weekday: Option<Weekday>,
    pub failure: u8,
}

impl NormalizedRecord {
    pub fn class(&self) -> ModelClass {
        ModelClass {
            model: self.model.clone(),
            capacity_gb: self.capacity_gb,
        }
    }

    pub fn device(&self) -> DeviceKey {
        DeviceKey {
            serial_number: self.serial_number.clone(),
            model: self.model.clone(),
            capacity_gb: self.capacity_gb,
        }
    }
}

/// One physical unit. A serial number seen under two (model, capacity)
/// pairs yields two keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceKey {
    pub serial_number: String,
    pub model: String,
    pub capacity_gb: i64,
}

impl DeviceKey {
    pub fn class(&self) -> ModelClass {
        ModelClass {
            model: self.model.clone(),
            capacity_gb: self.capacity_gb,
        }
    }
}

/// Grouping key of every aggregate: (model, capacity in GB).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelClass {
    pub model: String,
    pub capacity_gb: i64,
}

impl ModelClass {
    pub fn new(model: impl Into<String>, capacity_gb: i64) -> Self {
        Self {
            model: model.into(),
            capacity_gb,
        }
    }
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} GB)", self.model, self.capacity_gb)
    }
}

/// A row diverted by the reject parse policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub file: String,
    pub row: u64,
    pub reason: String,
}
