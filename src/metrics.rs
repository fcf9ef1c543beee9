//! Run metrics: named counters plus wall-clock timing, exportable as JSON.
//!
//! The job updates the counters named by the constants below; callers may add
//! their own. A [`RunMetrics`] is cheap to clone and safe to share.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const FILES_READ: &str = "files_read";
pub const ROWS_READ: &str = "rows_read";
pub const ROWS_REJECTED: &str = "rows_rejected";
pub const CLASSES_UNITS_ONLY: &str = "classes_units_only";
pub const CLASSES_FAILURES_ONLY: &str = "classes_failures_only";
pub const CLASSES_WITHOUT_PROBABILITY: &str = "classes_without_probability";
pub const CLASSES_REPORTED: &str = "classes_reported";
pub const ROWS_WRITTEN: &str = "rows_written";

#[derive(Clone, Default)]
pub struct RunMetrics {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    counters: BTreeMap<String, u64>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl RunMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_start(&self) {
        self.lock().start_time = Some(Instant::now());
    }

    pub fn record_end(&self) {
        self.lock().end_time = Some(Instant::now());
    }

    /// Time between [`record_start`](Self::record_start) and
    /// [`record_end`](Self::record_end), once both happened.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start_time, inner.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Add `value` to a counter, creating it at zero if absent.
    pub fn increment_counter(&self, name: &str, value: u64) {
        *self.lock().counters.entry(name.to_string()).or_insert(0) += value;
    }

    pub fn set_counter(&self, name: &str, value: u64) {
        self.lock().counters.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.lock().counters.get(name).copied()
    }

    /// Counters by name, plus `execution_time_ms` when timing is complete.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut out = serde_json::Map::new();
        for (name, value) in &inner.counters {
            out.insert(name.clone(), json!(value));
        }
        if let (Some(start), Some(end)) = (inner.start_time, inner.end_time) {
            let ms = u64::try_from(end.duration_since(start).as_millis()).unwrap_or(u64::MAX);
            out.insert("execution_time_ms".to_string(), json!(ms));
        }
        Value::Object(out)
    }

    /// Write [`to_json`](Self::to_json) pretty-printed to `path`.
    ///
    /// # Errors
    /// File creation or write failures.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file =
            File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
