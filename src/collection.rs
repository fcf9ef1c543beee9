//! Typed, lazy collections and the element-wise operators behind them.
//!
//! A [`PCollection<T>`] is a handle to a node in a [`Pipeline`]. Transforms
//! append nodes and return new handles; nothing runs until a collect method
//! (see `helpers::common`) hands the plan to the [`Runner`](crate::Runner).

use crate::node::{DynOp, Node};
use crate::node_id::NodeId;
use crate::pipeline::Pipeline;
use crate::type_token::{Partition, TypeTag, downcast_vec, vec_ops_for};
use anyhow::Result;
use std::marker::PhantomData;
use std::sync::Arc;

/// Bound shared by every element type that flows through a pipeline.
pub trait RFBound: 'static + Send + Sync + Clone {}
impl<T> RFBound for T where T: 'static + Send + Sync + Clone {}

pub struct PCollection<T> {
    pub(crate) pipeline: Pipeline,
    pub(crate) id: NodeId,
    pub(crate) _t: PhantomData<fn() -> T>,
}

impl<T> Clone for PCollection<T> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            id: self.id,
            _t: PhantomData,
        }
    }
}

impl<T: RFBound> PCollection<T> {
    pub(crate) fn from_node(pipeline: Pipeline, id: NodeId) -> Self {
        Self {
            pipeline,
            id,
            _t: PhantomData,
        }
    }

    /// Attach `node` downstream of this collection.
    pub(crate) fn then<O: RFBound>(self, node: Node) -> PCollection<O> {
        let id = self.pipeline.insert_node(node);
        self.pipeline.connect(self.id, id);
        PCollection::from_node(self.pipeline, id)
    }

    pub(crate) fn then_op<O: RFBound>(self, op: Arc<dyn DynOp>) -> PCollection<O> {
        self.then(Node::Stateless(vec![op]))
    }

    /// The pipeline this collection belongs to.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// Start a collection from owned data.
pub fn from_vec<T: RFBound>(p: &Pipeline, data: Vec<T>) -> PCollection<T> {
    let id = p.insert_node(Node::Source {
        payload: Arc::new(data),
        vec_ops: vec_ops_for::<T>(),
        elem_tag: TypeTag::of::<T>(),
    });
    PCollection::from_node(p.clone(), id)
}

pub fn from_iter<T, I>(p: &Pipeline, iter: I) -> PCollection<T>
where
    T: RFBound,
    I: IntoIterator<Item = T>,
{
    from_vec(p, iter.into_iter().collect())
}

/// Associative, commutative aggregation used by keyed combines.
///
/// `add_input` and `merge` may be called in any order across partitions, so
/// the result must not depend on it.
pub trait CombineFn<V, A, O>: Send + Sync + 'static {
    fn create(&self) -> A;
    fn add_input(&self, acc: &mut A, v: V);
    fn merge(&self, acc: &mut A, other: A);
    fn finish(&self, acc: A) -> O;
}

// ---- element-wise operators ----

pub(crate) struct MapOp<I, O, F>(pub F, pub PhantomData<fn(I) -> O>);

impl<I, O, F> DynOp for MapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Fn(&I) -> O + Send + Sync + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = downcast_vec::<I>(input, "map")?;
        Ok(Box::new(v.iter().map(&self.0).collect::<Vec<O>>()))
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

pub(crate) struct FilterOp<T, P>(pub P, pub PhantomData<fn(T)>);

impl<T, P> DynOp for FilterOp<T, P>
where
    T: RFBound,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = downcast_vec::<T>(input, "filter")?;
        Ok(Box::new(v.into_iter().filter(|t| (self.0)(t)).collect::<Vec<T>>()))
    }

    fn name(&self) -> &'static str {
        "filter"
    }
}

pub(crate) struct FlatMapOp<I, O, F>(pub F, pub PhantomData<fn(I) -> O>);

impl<I, O, F> DynOp for FlatMapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Fn(&I) -> Vec<O> + Send + Sync + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = downcast_vec::<I>(input, "flat_map")?;
        Ok(Box::new(v.iter().flat_map(&self.0).collect::<Vec<O>>()))
    }

    fn name(&self) -> &'static str {
        "flat_map"
    }
}

/// Fallible map: the first element that fails aborts the whole run.
pub(crate) struct TryMapOp<I, O, E, F>(pub F, pub PhantomData<fn(I) -> Result<O, E>>);

impl<I, O, E, F> DynOp for TryMapOp<I, O, E, F>
where
    I: RFBound,
    O: RFBound,
    E: Into<anyhow::Error>,
    F: Fn(&I) -> std::result::Result<O, E> + Send + Sync + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = downcast_vec::<I>(input, "try_map")?;
        let out = v
            .iter()
            .map(|i| (self.0)(i).map_err(Into::into))
            .collect::<Result<Vec<O>>>()?;
        Ok(Box::new(out))
    }

    fn name(&self) -> &'static str {
        "try_map"
    }
}
