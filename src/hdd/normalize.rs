//! Field normalization: raw snapshot text → typed record.
//!
//! Pure per-row functions; the pipeline applies them with `map`/`try_map`.

use crate::error::{ParseError, PipelineError};
use crate::hdd::record::{NormalizedRecord, RawRecord, RejectedRecord, SourcedRecord};
use chrono::{Datelike, NaiveDate, Weekday};
use std::cmp::Ordering;

/// Decimal gigabyte.
pub const BYTES_PER_GB: i64 = 1_000_000_000;

/// Capacity assumed when the cell is empty.
const MISSING_CAPACITY: &str = "0";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Bytes → decimal gigabytes, rounding half to even. Non-positive byte counts
/// are returned unchanged.
pub fn bytes_to_gb(bytes: i64) -> i64 {
    if bytes <= 0 {
        return bytes;
    }
    let (q, r) = (bytes / BYTES_PER_GB, bytes % BYTES_PER_GB);
    match (2 * r).cmp(&BYTES_PER_GB) {
        Ordering::Less => q,
        Ordering::Greater => q + 1,
        Ordering::Equal if q % 2 == 0 => q,
        Ordering::Equal => q + 1,
    }
}

/// Parse a `capacity_bytes` cell and convert it to gigabytes.
///
/// # Errors
/// [`ParseError::InvalidCapacity`] if the cell is not an `i64`.
pub fn capacity_gb(raw: Option<&str>) -> Result<i64, ParseError> {
    let text = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_CAPACITY);
    let bytes: i64 = text.parse().map_err(|_| ParseError::InvalidCapacity {
        value: text.to_string(),
    })?;
    Ok(bytes_to_gb(bytes))
}

/// Day of week of a `YYYY-MM-DD` date; an absent or empty date stays absent.
///
/// # Errors
/// [`ParseError::InvalidDate`] for any other text that is not a date.
pub fn weekday(raw: Option<&str>) -> Result<Option<Weekday>, ParseError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(|d| Some(d.weekday()))
            .map_err(|_| ParseError::InvalidDate {
                value: s.to_string(),
            }),
    }
}

/// English day name as used for pivot column headers.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse the failure flag.
///
/// # Errors
/// [`ParseError::MissingField`] when empty, [`ParseError::InvalidFailure`]
/// for anything but an integer 0 or 1.
pub fn failure_flag(raw: Option<&str>) -> Result<u8, ParseError> {
    let text = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingField("failure"))?;
    match text.parse::<i64>() {
        Ok(0) => Ok(0),
        Ok(1) => Ok(1),
        _ => Err(ParseError::InvalidFailure {
            value: text.to_string(),
        }),
    }
}

fn required(raw: &Option<String>, field: &'static str) -> Result<String, ParseError> {
    match raw.as_deref() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ParseError::MissingField(field)),
    }
}

/// Normalize every field of one raw row.
///
/// # Errors
/// The first field that fails, in column order.
pub fn normalize(raw: &RawRecord) -> Result<NormalizedRecord, ParseError> {
    Ok(NormalizedRecord {
        weekday: weekday(raw.date.as_deref())?,
        serial_number: required(&raw.serial_number, "serial_number")?,
        model: required(&raw.model, "model")?,
        capacity_gb: capacity_gb(raw.capacity_bytes.as_deref())?,
        failure: failure_flag(raw.failure.as_deref())?,
    })
}

/// A sourced row's read defect, or the result of normalizing it.
fn normalize_sourced(rec: &SourcedRecord) -> Result<NormalizedRecord, ParseError> {
    match &rec.raw {
        Ok(raw) => normalize(raw),
        Err(e) => Err(e.clone()),
    }
}

/// [`normalize`] for the fail-fast policy: the error names the row.
///
/// # Errors
/// [`PipelineError::Rejected`] wrapping the read or field error.
pub fn normalize_or_fail(rec: &SourcedRecord) -> Result<NormalizedRecord, PipelineError> {
    normalize_sourced(rec).map_err(|source| PipelineError::Rejected {
        origin: rec.origin.clone(),
        source,
    })
}

/// [`normalize`] for the reject policy: the error becomes a reject row.
///
/// # Errors
/// A [`RejectedRecord`] describing the failing row.
pub fn normalize_or_reject(rec: &SourcedRecord) -> Result<NormalizedRecord, RejectedRecord> {
    normalize_sourced(rec).map_err(|e| RejectedRecord {
        file: rec.origin.file.to_string(),
        row: rec.origin.row,
        reason: e.to_string(),
    })
}
