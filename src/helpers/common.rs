use crate::collection::{FilterOp, FlatMapOp, MapOp};
use crate::{ExecMode, PCollection, RFBound, Runner, from_vec};
use anyhow::Result;
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: RFBound> PCollection<T> {
    pub fn map<O, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> O,
    {
        self.then_op(Arc::new(MapOp::<T, O, F>(f, PhantomData)))
    }

    pub fn filter<F>(self, pred: F) -> PCollection<T>
    where
        F: 'static + Send + Sync + Fn(&T) -> bool,
    {
        self.then_op(Arc::new(FilterOp::<T, F>(pred, PhantomData)))
    }

    pub fn flat_map<O, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> Vec<O>,
    {
        self.then_op(Arc::new(FlatMapOp::<T, O, F>(f, PhantomData)))
    }
}

impl<T: RFBound> PCollection<T> {
    /// Run with the given runner and return every element.
    ///
    /// # Errors
    /// Propagates any failure raised while executing the plan.
    pub fn collect_with(self, runner: &Runner) -> Result<Vec<T>> {
        runner.run_collect::<T>(&self.pipeline, self.id)
    }

    pub fn collect_seq(self) -> Result<Vec<T>> {
        self.collect_with(&Runner::sequential())
    }

    pub fn collect_par(self, threads: Option<usize>, partitions: Option<usize>) -> Result<Vec<T>> {
        self.collect_with(&Runner::new(ExecMode::Parallel {
            threads,
            partitions,
        }))
    }

    /// Execute the plan once and replace it with an in-memory source, so that
    /// several downstream branches reuse the result instead of recomputing it.
    ///
    /// # Errors
    /// Propagates any failure raised while executing the plan.
    pub fn materialize(self, runner: &Runner) -> Result<PCollection<T>> {
        let p = self.pipeline.clone();
        let data = self.collect_with(runner)?;
        Ok(from_vec(&p, data))
    }
}
