//! Execution graph nodes.
//!
//! A node is type-erased: it holds closures that take and return
//! [`Partition`]s. The typed [`PCollection`](crate::PCollection) methods build
//! these closures with the concrete element types baked in, so the runner can
//! stay generic-free.

use crate::type_token::{Partition, TypeTag, VecOps};
use anyhow::Result;
use std::any::Any;
use std::sync::Arc;

/// An element-wise operator that can be fused with its neighbours and run on
/// each partition independently.
pub trait DynOp: Send + Sync {
    fn apply(&self, input: Partition) -> Result<Partition>;

    /// Short label used in plan logs.
    fn name(&self) -> &'static str {
        "op"
    }
}

/// Per-partition phase of a barrier (e.g. `Vec<(K, V)>` → `HashMap<K, A>`).
pub type LocalFn = Arc<dyn Fn(Partition) -> Result<Partition> + Send + Sync>;
/// Merge phase of a barrier: many local results → one partition.
pub type MergeFn = Arc<dyn Fn(Vec<Partition>) -> Result<Partition> + Send + Sync>;
/// Binary step of a co-group: coalesced left and right → joined rows.
pub type JoinFn = Arc<dyn Fn(Partition, Partition) -> Result<Partition> + Send + Sync>;

#[derive(Clone)]
pub enum Node {
    /// In-memory `Vec<T>` payload.
    Source {
        payload: Arc<dyn Any + Send + Sync>,
        vec_ops: Arc<dyn VecOps>,
        elem_tag: TypeTag,
    },

    /// Run of element-wise operators; adjacent runs are fused by the runner.
    Stateless(Vec<Arc<dyn DynOp>>),

    /// Two-phase combine-by-key. `local` folds one partition of `(K, V)` into
    /// accumulators; `merge` folds the accumulators of all partitions and
    /// finishes them into `Vec<(K, O)>`.
    CombineValues { local: LocalFn, merge: MergeFn },

    /// Keyed co-group of two sub-plans. Each side is executed on its own,
    /// coalesced into a single partition, and handed to `exec`. A co-group has
    /// no parent edge and always starts a chain.
    CoGroup {
        left: Arc<Vec<Node>>,
        right: Arc<Vec<Node>>,
        coalesce_left: MergeFn,
        coalesce_right: MergeFn,
        exec: JoinFn,
    },
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Source { .. } => "source",
            Node::Stateless(_) => "stateless",
            Node::CombineValues { .. } => "combine",
            Node::CoGroup { .. } => "cogroup",
        }
    }

    /// Whether execution of this node needs every partition at once.
    pub fn is_barrier(&self) -> bool {
        matches!(self, Node::CombineValues { .. } | Node::CoGroup { .. })
    }
}
