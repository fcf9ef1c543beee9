//! Plan execution.
//!
//! The runner walks a linear chain head-first. The head is either a source
//! (split into partitions) or a co-group (both sub-plans executed, then
//! joined). Adjacent stateless nodes are fused and applied per partition;
//! combines run their local phase per partition and merge into a single
//! partition. In parallel mode partitions are processed on a rayon pool.

use crate::node::{DynOp, Node};
use crate::pipeline::Pipeline;
use crate::type_token::{Partition, downcast_vec};
use crate::{NodeId, RFBound};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ExecMode {
    /// Single partition on the calling thread.
    Sequential,
    /// Partitioned execution on rayon. `threads` sizes a dedicated pool
    /// (global pool when `None`); `partitions` overrides the split count.
    Parallel {
        threads: Option<usize>,
        partitions: Option<usize>,
    },
}

impl Default for ExecMode {
    fn default() -> Self {
        ExecMode::Parallel {
            threads: None,
            partitions: None,
        }
    }
}

/// Executes plans in one [`ExecMode`]. A dedicated pool, when the mode asks
/// for one, is built on first use and reused by every later collect.
pub struct Runner {
    mode: ExecMode,
    pub default_partitions: usize,
    pool: OnceLock<ThreadPool>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(ExecMode::default())
    }
}

impl Runner {
    pub fn new(mode: ExecMode) -> Self {
        Self {
            mode,
            default_partitions: 2 * num_cpus::get().max(2),
            pool: OnceLock::new(),
        }
    }

    pub fn sequential() -> Self {
        Self::new(ExecMode::Sequential)
    }

    /// Execute the plan ending at `terminal` and materialize it.
    ///
    /// # Errors
    /// Propagates any operator failure; the run is aborted as a whole.
    pub fn run_collect<T: RFBound>(&self, p: &Pipeline, terminal: NodeId) -> Result<Vec<T>> {
        let chain = p.chain_to(terminal)?;
        debug!(
            terminal = terminal.raw(),
            steps = chain.len(),
            barriers = chain.iter().filter(|n| n.is_barrier()).count(),
            mode = ?self.mode,
            "executing plan"
        );

        let parts = match self.mode {
            ExecMode::Sequential => exec_chain(&chain, 1, false)?,
            ExecMode::Parallel {
                threads,
                partitions,
            } => {
                let n = partitions.unwrap_or(self.default_partitions).max(1);
                match threads {
                    Some(t) => self.pool(t)?.install(|| exec_chain(&chain, n, true))?,
                    None => exec_chain(&chain, n, true)?,
                }
            }
        };

        let mut out = Vec::new();
        for part in parts {
            out.extend(downcast_vec::<T>(part, "collect")?);
        }
        Ok(out)
    }

    fn pool(&self, threads: usize) -> Result<&ThreadPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let built = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .context("build rayon thread pool")?;
        debug!(threads = built.current_num_threads(), "built rayon thread pool");
        // a concurrent first use may have won the race; its pool is kept
        Ok(self.pool.get_or_init(|| built))
    }
}

fn exec_chain(chain: &[Node], partitions: usize, parallel: bool) -> Result<Vec<Partition>> {
    let Some((head, rest)) = chain.split_first() else {
        bail!("cannot execute an empty plan");
    };

    let mut current = match head {
        Node::Source {
            payload,
            vec_ops,
            elem_tag,
        } => {
            let parts = if partitions <= 1 {
                vec_ops.clone_any(payload.as_ref()).map(|p| vec![p])
            } else {
                vec_ops.split(payload.as_ref(), partitions)
            };
            parts.with_context(|| format!("source payload is not a Vec<{}>", elem_tag.name))?
        }
        Node::CoGroup {
            left,
            right,
            coalesce_left,
            coalesce_right,
            exec,
        } => {
            let (l, r) = if parallel {
                rayon::join(
                    || exec_chain(left, partitions, true),
                    || exec_chain(right, partitions, true),
                )
            } else {
                (
                    exec_chain(left, partitions, false),
                    exec_chain(right, partitions, false),
                )
            };
            let l = coalesce_left(l.context("left side of co-group")?)?;
            let r = coalesce_right(r.context("right side of co-group")?)?;
            vec![exec(l, r)?]
        }
        other => bail!("plan must start with a source or co-group, found {}", other.kind()),
    };

    let mut i = 0;
    while i < rest.len() {
        match &rest[i] {
            Node::Stateless(_) => {
                let mut ops: Vec<Arc<dyn DynOp>> = Vec::new();
                while let Some(Node::Stateless(more)) = rest.get(i) {
                    ops.extend(more.iter().cloned());
                    i += 1;
                }
                current = for_each_partition(current, parallel, |part| fuse(&ops, part))?;
            }
            Node::CombineValues { local, merge } => {
                let locals = for_each_partition(current, parallel, |part| local(part))?;
                current = vec![merge(locals)?];
                i += 1;
            }
            other => bail!("unexpected {} node inside a plan", other.kind()),
        }
    }
    Ok(current)
}

fn fuse(ops: &[Arc<dyn DynOp>], input: Partition) -> Result<Partition> {
    ops.iter().try_fold(input, |acc, op| {
        op.apply(acc).with_context(|| format!("{} step", op.name()))
    })
}

fn for_each_partition<F>(parts: Vec<Partition>, parallel: bool, f: F) -> Result<Vec<Partition>>
where
    F: Fn(Partition) -> Result<Partition> + Send + Sync,
{
    if parallel {
        parts.into_par_iter().map(f).collect()
    } else {
        parts.into_iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_vec;

    #[test]
    fn dedicated_pool_is_built_once() -> Result<()> {
        let runner = Runner::new(ExecMode::Parallel {
            threads: Some(2),
            partitions: Some(4),
        });
        assert!(runner.pool.get().is_none());

        let p = Pipeline::new();
        let threads = from_vec(&p, vec![0u8; 8]).map(|_: &u8| rayon::current_num_threads());
        assert!(threads.clone().collect_with(&runner)?.iter().all(|n| *n == 2));
        let first = runner.pool.get().map(std::ptr::from_ref);
        assert!(first.is_some());

        threads.collect_with(&runner)?;
        assert_eq!(runner.pool.get().map(std::ptr::from_ref), first);
        Ok(())
    }

    #[test]
    fn global_pool_and_sequential_modes_build_none() -> Result<()> {
        let p = Pipeline::new();
        let doubled = from_vec(&p, vec![1u32, 2, 3]).map(|x: &u32| x * 2);
        for runner in [Runner::default(), Runner::sequential()] {
            assert_eq!(doubled.clone().collect_with(&runner)?, vec![2, 4, 6]);
            assert!(runner.pool.get().is_none());
        }
        Ok(())
    }
}
