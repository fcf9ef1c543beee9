//! # hddstats
//!
//! Per-model hard-drive failure statistics from daily fleet snapshots.
//!
//! Each snapshot file holds one row per device per day (`date`,
//! `serial_number`, `model`, `capacity_bytes`, `failure`). The job counts
//! distinct units per (model, capacity) class, sums their failure flags,
//! derives `failure_probability = failure_sum / unit_count` and spreads the
//! failures over the day of the week they were reported on:
//!
//! ```text
//! model,capacity_GB,failure_probability,Monday,Tuesday
//! ModelA,1000,0.5,0,1
//! ```
//!
//! ## Layout
//!
//! - [`hdd`]: the domain stages and [`hdd::SummaryJob`], which runs them.
//! - A small batch engine the stages are written against: a [`Pipeline`]
//!   graph of lazy, typed [`PCollection`]s, executed by a [`Runner`]
//!   sequentially or on a rayon pool. Stateless steps are fused per
//!   partition; keyed combines run in two phases (per partition, then
//!   merged); joins co-group two sub-plans.
//! - [`io`]: input discovery and CSV reading and writing.
//! - [`config`], [`error`], [`metrics`]: run settings, error types and
//!   counters.
//! - [`testing`]: fixtures shared by unit and integration tests.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hddstats::config::{RunConfig, validate_paths};
//! use hddstats::hdd::SummaryJob;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let (input, output) = (Path::new("snapshots"), Path::new("summary"));
//! validate_paths(input, output)?;
//! let outcome = SummaryJob::new(RunConfig::default()).run(input, output)?;
//! println!("{} classes", outcome.table.rows.len());
//! # Ok(())
//! # }
//! ```
//!
//! The engine can be used on its own:
//!
//! ```
//! use hddstats::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let p = Pipeline::new();
//! let counts = from_vec(&p, vec!["a", "b", "a"])
//!     .map(|s: &&str| (s.to_string(), 1u64))
//!     .combine_values(Sum::<u64>::new())
//!     .collect_seq_sorted()?;
//! assert_eq!(counts, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod combiners;
pub mod config;
pub mod error;
pub mod hdd;
pub mod helpers;
pub mod io;
pub mod metrics;
pub mod node;
pub mod node_id;
pub mod pipeline;
pub mod runner;
pub mod testing;
pub mod type_token;

pub use collection::{CombineFn, PCollection, RFBound, from_iter, from_vec};
pub use combiners::{Count, Sum};
pub use node_id::NodeId;
pub use pipeline::Pipeline;
pub use runner::{ExecMode, Runner};
pub use type_token::Partition;
