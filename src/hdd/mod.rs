//! Per-model drive failure statistics.
//!
//! Daily snapshot rows (one per device per day) go through five stages:
//! normalization ([`normalize`]), unit counting ([`catalog`]), failure sums
//! ([`failures`]), probability derivation ([`probability`]) and the weekday
//! pivot ([`pivot`]), ending in a [`report::SummaryTable`].
//!
//! [`SummaryJob`] wires the stages together on one [`Pipeline`].

pub mod catalog;
pub mod failures;
pub mod normalize;
pub mod pivot;
pub mod probability;
pub mod record;
pub mod report;
pub mod source;

use crate::config::{ParsePolicy, RunConfig};
use crate::error::ConfigError;
use crate::hdd::normalize::{normalize_or_fail, normalize_or_reject};
use crate::hdd::probability::ProbabilityTable;
use crate::hdd::record::{NormalizedRecord, RejectedRecord, SourcedRecord};
use crate::hdd::report::SummaryTable;
use crate::io::csv::write_csv_vec;
use crate::io::glob::list_csv_files;
use crate::metrics::{self, RunMetrics};
use crate::{PCollection, Pipeline, Runner, from_vec};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything a run produced.
#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    pub table: SummaryTable,
    pub probabilities: ProbabilityTable,
    /// Rows diverted under [`ParsePolicy::Reject`]; empty otherwise.
    pub rejected: Vec<RejectedRecord>,
    /// Where the table was written, for directory runs.
    pub output_path: Option<PathBuf>,
}

pub struct SummaryJob {
    config: RunConfig,
    metrics: RunMetrics,
}

impl SummaryJob {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            metrics: RunMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Normalize raw rows under the configured parse policy.
    ///
    /// The result is materialized: the three aggregations downstream each
    /// read it.
    ///
    /// # Errors
    /// Under [`ParsePolicy::FailFast`], the first bad row; otherwise only
    /// execution failures.
    pub fn normalize(
        &self,
        records: PCollection<SourcedRecord>,
        runner: &Runner,
    ) -> Result<(PCollection<NormalizedRecord>, Vec<RejectedRecord>)> {
        match self.config.parse_policy {
            ParsePolicy::FailFast => {
                let rows = records.try_map(normalize_or_fail).materialize(runner)?;
                Ok((rows, Vec::new()))
            }
            ParsePolicy::Reject => {
                let p = records.pipeline().clone();
                let (ok, mut rejected) = records
                    .map(normalize_or_reject)
                    .collect_partitioned(runner)?;
                rejected.sort_by(|a, b| (&a.file, a.row).cmp(&(&b.file, b.row)));
                if !rejected.is_empty() {
                    warn!(rejected = rejected.len(), kept = ok.len(), "rows rejected during normalization");
                }
                Ok((from_vec(&p, ok), rejected))
            }
        }
    }

    /// Run every stage over `records` and build the summary table.
    ///
    /// # Errors
    /// Parse failures under the fail-fast policy,
    /// [`PipelineError::ZeroUnits`](crate::error::PipelineError::ZeroUnits)
    /// under the outer join policy, and execution failures.
    pub fn run_records(&self, records: PCollection<SourcedRecord>) -> Result<RunOutcome> {
        let runner = self.config.runner();
        let policy = self.config.join_policy;
        let p = records.pipeline().clone();

        let (rows, rejected) = self.normalize(records, &runner)?;
        self.metrics.set_counter(metrics::ROWS_REJECTED, rejected.len() as u64);

        let units = catalog::unit_counts(&rows);
        let sums = failures::failure_sums(&rows);
        let probabilities = probability::derive_probabilities(&units, &sums, policy, &runner)?;
        self.metrics
            .set_counter(metrics::CLASSES_UNITS_ONLY, probabilities.units_only as u64);
        self.metrics
            .set_counter(metrics::CLASSES_FAILURES_ONLY, probabilities.failures_only as u64);
        info!(classes = probabilities.rows.len(), "derived failure probabilities");

        let pairs = from_vec(&p, probabilities.pairs());
        let weekday_sums = failures::weekday_failure_sums(&rows);
        let pivoted = pivot::pivot_weekdays(&weekday_sums, &pairs, policy, &runner)?;
        self.metrics.set_counter(
            metrics::CLASSES_WITHOUT_PROBABILITY,
            pivoted.without_probability as u64,
        );
        let table = pivoted.table;
        self.metrics
            .set_counter(metrics::CLASSES_REPORTED, table.rows.len() as u64);
        info!(
            classes = table.rows.len(),
            columns = table.columns.len(),
            "pivoted failures by weekday"
        );

        Ok(RunOutcome {
            table,
            probabilities,
            rejected,
            output_path: None,
        })
    }

    /// Read every snapshot file under `input`, run the job and write the
    /// table into the `output` directory, which is created.
    ///
    /// Paths are not validated here; see
    /// [`validate_paths`](crate::config::validate_paths).
    ///
    /// # Errors
    /// [`ConfigError::NoInputFiles`](crate::error::ConfigError::NoInputFiles),
    /// IO failures, and everything [`run_records`](Self::run_records) returns.
    pub fn run(&self, input: &Path, output: &Path) -> Result<RunOutcome> {
        self.metrics.record_start();

        let files = list_csv_files(input)?;
        if files.is_empty() {
            return Err(ConfigError::NoInputFiles(input.to_path_buf()).into());
        }
        info!(files = files.len(), input = %input.display(), "discovered snapshot files");
        let raw = source::load_snapshot_files(&files, self.config.parallel_io())?;
        info!(rows = raw.len(), "read snapshot rows");
        self.metrics.set_counter(metrics::FILES_READ, files.len() as u64);
        self.metrics.set_counter(metrics::ROWS_READ, raw.len() as u64);

        let p = Pipeline::new();
        let mut outcome = self.run_records(from_vec(&p, raw))?;

        fs::create_dir_all(output).with_context(|| format!("create {}", output.display()))?;
        let out_path = output.join(&self.config.output_file);
        let written = outcome.table.write_csv(&out_path)?;
        info!(rows = written, path = %out_path.display(), "wrote summary table");
        self.metrics.set_counter(metrics::ROWS_WRITTEN, written as u64);

        if let Some(rejects) = &self.config.rejects_path {
            if self.config.parse_policy == ParsePolicy::Reject {
                let n = write_csv_vec(rejects, &outcome.rejected)?;
                debug!(rows = n, path = %rejects.display(), "wrote rejected rows");
            } else {
                warn!(path = %rejects.display(), "rejects file ignored under the fail-fast parse policy");
            }
        }

        outcome.output_path = Some(out_path);
        self.metrics.record_end();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JoinPolicy;
    use crate::error::PipelineError;
    use crate::testing::{raw, sourced};

    fn job(parse_policy: ParsePolicy) -> SummaryJob {
        SummaryJob::new(RunConfig {
            parse_policy,
            join_policy: JoinPolicy::Inner,
            ..RunConfig::default()
        })
    }

    #[test]
    fn fail_fast_names_the_row() {
        let p = Pipeline::new();
        let rows = sourced(
            "day1.csv",
            vec![
                raw("2021-01-04", "SN1", "ModelA", "1000000000000", "0"),
                raw("2021-01-04", "SN2", "ModelA", "lots", "0"),
            ],
        );
        let err = job(ParsePolicy::FailFast)
            .run_records(from_vec(&p, rows))
            .unwrap_err();
        let rejected = err.downcast_ref::<PipelineError>().expect("pipeline error");
        assert_eq!(rejected.to_string(), "rejected record at day1.csv:2: capacity_bytes `lots` is not an integer");
    }

    #[test]
    fn reject_policy_keeps_good_rows() -> Result<()> {
        let p = Pipeline::new();
        let rows = sourced(
            "day1.csv",
            vec![
                raw("2021-01-04", "SN1", "ModelA", "1000000000000", "1"),
                raw("2021-01-04", "SN2", "ModelA", "1000000000000", "maybe"),
                raw("2021-01-04", "SN3", "ModelA", "1000000000000", "0"),
            ],
        );
        let job = job(ParsePolicy::Reject);
        let outcome = job.run_records(from_vec(&p, rows))?;
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].row, 2);
        assert_eq!(outcome.probabilities.rows[0].unit_count, 2);
        assert_eq!(outcome.probabilities.rows[0].failure_probability, 0.5);
        assert_eq!(job.metrics().counter(metrics::ROWS_REJECTED), Some(1));
        assert_eq!(job.metrics().counter(metrics::CLASSES_REPORTED), Some(1));
        assert_eq!(job.metrics().counter(metrics::CLASSES_WITHOUT_PROBABILITY), Some(0));
        Ok(())
    }
}
