//! Error types for the drive-statistics job.
//!
//! Execution and IO failures travel as `anyhow::Error` with context; the
//! enums here name the failures a caller may want to match on.

use crate::hdd::record::{ModelClass, RowOrigin};
use std::path::PathBuf;
use thiserror::Error;

/// Bad invocation, detected before any record is read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("input path does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("output path already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("no CSV files found in {}", .0.display())]
    NoInputFiles(PathBuf),
}

/// A row or field that cannot be normalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("capacity_bytes `{value}` is not an integer")]
    InvalidCapacity { value: String },

    #[error("date `{value}` is not a YYYY-MM-DD calendar date")]
    InvalidDate { value: String },

    #[error("failure flag `{value}` is not 0 or 1")]
    InvalidFailure { value: String },

    #[error("row has {found} fields, header has {expected}")]
    WrongWidth { found: usize, expected: usize },

    #[error("column `{column}` is not valid UTF-8")]
    InvalidUtf8 { column: String },
}

/// Failures of the aggregation itself.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Fail-fast parse policy hit a bad row.
    #[error("rejected record at {origin}: {source}")]
    Rejected {
        origin: RowOrigin,
        #[source]
        source: ParseError,
    },

    /// A class reached the probability step without any counted unit.
    #[error("class {class} has {failure_sum} failures but no counted units")]
    ZeroUnits { class: ModelClass, failure_sum: u64 },
}
