//! Run configuration and path validation.

use crate::error::ConfigError;
use crate::runner::{ExecMode, Runner};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Output file name inside the output directory.
pub const DEFAULT_OUTPUT_FILE: &str = "part-00000.csv";

/// What to do with a row that cannot be normalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ParsePolicy {
    /// Abort the run on the first bad row.
    #[default]
    #[value(name = "fail")]
    FailFast,
    /// Divert bad rows to the reject stream and keep going.
    Reject,
}

/// How classes present on only one side of a join are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum JoinPolicy {
    /// Drop them.
    #[default]
    Inner,
    /// Keep them: a class without failures gets probability 0, a class
    /// without a probability keeps its weekday cells with an empty
    /// probability.
    Outer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    pub exec: ExecMode,
    pub parse_policy: ParsePolicy,
    pub join_policy: JoinPolicy,
    pub output_file: String,
    pub rejects_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            exec: ExecMode::default(),
            parse_policy: ParsePolicy::default(),
            join_policy: JoinPolicy::default(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            rejects_path: None,
        }
    }
}

impl RunConfig {
    pub fn runner(&self) -> Runner {
        Runner::new(self.exec)
    }

    /// Whether input files may be read concurrently.
    pub fn parallel_io(&self) -> bool {
        matches!(self.exec, ExecMode::Parallel { .. })
    }
}

/// Check the invocation before any record is read.
///
/// # Errors
/// [`ConfigError::InputMissing`] or [`ConfigError::OutputExists`].
pub fn validate_paths(input: &Path, output: &Path) -> Result<(), ConfigError> {
    if !input.exists() {
        return Err(ConfigError::InputMissing(input.to_path_buf()));
    }
    if output.exists() {
        return Err(ConfigError::OutputExists(output.to_path_buf()));
    }
    Ok(())
}
