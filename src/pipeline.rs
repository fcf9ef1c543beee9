//! The execution context.
//!
//! A [`Pipeline`] owns the deferred computation graph for one run. It is an
//! explicit value: create it when the run starts, hand it (or collections
//! built on it) to each stage, and drop it when the run ends. Clones share
//! the same graph.

use crate::node::Node;
use crate::node_id::NodeId;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Default)]
pub struct Pipeline {
    inner: Arc<Mutex<Graph>>,
}

#[derive(Default)]
struct Graph {
    next_id: u64,
    nodes: HashMap<NodeId, Node>,
    /// child → parent. Every non-head node has exactly one parent.
    parents: HashMap<NodeId, NodeId>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn graph(&self) -> MutexGuard<'_, Graph> {
        // append-only, so a poisoned graph is still whole
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_node(&self, node: Node) -> NodeId {
        let mut g = self.graph();
        let id = NodeId::new(g.next_id);
        g.next_id += 1;
        g.nodes.insert(id, node);
        id
    }

    pub(crate) fn connect(&self, from: NodeId, to: NodeId) {
        self.graph().parents.insert(to, from);
    }

    /// Linear plan ending at `terminal`, head first.
    ///
    /// # Errors
    /// Returns an error if the walk reaches an id this pipeline never issued.
    pub(crate) fn chain_to(&self, terminal: NodeId) -> Result<Vec<Node>> {
        let g = self.graph();
        let mut chain = Vec::new();
        let mut cur = terminal;
        loop {
            let node = g
                .nodes
                .get(&cur)
                .ok_or_else(|| anyhow!("node {} not found in pipeline", cur.raw()))?;
            chain.push(node.clone());
            match g.parents.get(&cur) {
                Some(parent) => cur = *parent,
                None => break,
            }
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn same_as(&self, other: &Pipeline) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of nodes attached so far.
    pub fn node_count(&self) -> usize {
        self.graph().nodes.len()
    }
}
