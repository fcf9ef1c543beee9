use crate::collection::TryMapOp;
use crate::{PCollection, RFBound, Runner};
use anyhow::Result;
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: RFBound> PCollection<T> {
    /// Fallible map whose first error aborts the run it executes in.
    pub fn try_map<O, E, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        E: Into<anyhow::Error> + 'static,
        F: 'static + Send + Sync + Fn(&T) -> std::result::Result<O, E>,
    {
        self.then_op(Arc::new(TryMapOp::<T, O, E, F>(f, PhantomData)))
    }
}

impl<T: RFBound, E: RFBound> PCollection<std::result::Result<T, E>> {
    /// Run the plan and split successes from failures, keeping both.
    ///
    /// # Errors
    /// Only execution failures are returned; element errors land in the
    /// second vector.
    pub fn collect_partitioned(self, runner: &Runner) -> Result<(Vec<T>, Vec<E>)> {
        let mut ok = Vec::new();
        let mut failed = Vec::new();
        for r in self.collect_with(runner)? {
            match r {
                Ok(v) => ok.push(v),
                Err(e) => failed.push(e),
            }
        }
        Ok((ok, failed))
    }
}
