//! Handles for nodes in a [`Pipeline`](crate::pipeline::Pipeline) graph.
//!
//! Ids are handed out sequentially as stages are attached, so a larger id was
//! always created later. They are `Copy` and hashable and only mean something
//! inside the pipeline that issued them.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new(v: u64) -> Self {
        Self(v)
    }

    /// The raw sequence number, for logs.
    pub fn raw(&self) -> u64 {
        self.0
    }
}
