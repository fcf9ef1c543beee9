//! Collect-and-sort helpers for deterministic sinks and assertions.

use crate::{PCollection, RFBound, Runner};
use anyhow::Result;

impl<T: RFBound + Ord> PCollection<T> {
    pub fn collect_seq_sorted(self) -> Result<Vec<T>> {
        let mut v = self.collect_seq()?;
        v.sort();
        Ok(v)
    }

    pub fn collect_par_sorted(self, threads: Option<usize>, partitions: Option<usize>) -> Result<Vec<T>> {
        let mut v = self.collect_par(threads, partitions)?;
        v.sort();
        Ok(v)
    }
}

impl<K: RFBound + Ord, V: RFBound> PCollection<(K, V)> {
    /// Collect with `runner` and sort by key only; values need no ordering.
    pub fn collect_sorted_by_key(self, runner: &Runner) -> Result<Vec<(K, V)>> {
        let mut v = self.collect_with(runner)?;
        v.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(v)
    }
}
