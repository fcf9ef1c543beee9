//! Runtime type tags and type-erased `Vec<T>` handling.
//!
//! Nodes in the execution graph are not generic, so the data flowing between
//! them travels as a boxed [`Partition`]. Every operator knows the concrete
//! element type it expects and recovers it with [`downcast_vec`]; source nodes
//! carry a [`VecOps`] so the runner can measure, split and clone their payload
//! without knowing `T`.

use anyhow::{Result, anyhow};
use std::any::{Any, TypeId, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

/// One chunk of intermediate data, type-erased.
///
/// Operators downcast it to the `Vec<T>` (or accumulator map) they expect.
pub type Partition = Box<dyn Any + Send + Sync>;

/// Readable runtime identity of an element type, attached to sources so that
/// plan errors can name the type involved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Recover a `Vec<T>` from a partition, naming the operator on mismatch.
///
/// # Errors
/// Returns an error if the partition does not hold a `Vec<T>`.
pub fn downcast_vec<T: 'static>(part: Partition, op: &str) -> Result<Vec<T>> {
    part.downcast::<Vec<T>>()
        .map(|b| *b)
        .map_err(|_| anyhow!("{op}: expected a partition of Vec<{}>", type_name::<T>()))
}

/// Recover an arbitrary boxed value from a partition.
///
/// # Errors
/// Returns an error if the partition does not hold a `U`.
pub fn downcast_part<U: 'static>(part: Partition, op: &str) -> Result<U> {
    part.downcast::<U>()
        .map(|b| *b)
        .map_err(|_| anyhow!("{op}: expected a partition of {}", type_name::<U>()))
}

/// Type-erased operations the runner needs on a source payload.
///
/// Every method returns `None` when `data` is not the `Vec<T>` the
/// implementation was built for.
pub trait VecOps: Send + Sync {
    /// Number of elements in the payload.
    fn len(&self, data: &dyn Any) -> Option<usize>;

    /// Split the payload into at most `n` contiguous, order-preserving chunks.
    /// Always yields at least one chunk, possibly empty.
    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>>;

    /// Copy the whole payload into a single partition.
    fn clone_any(&self, data: &dyn Any) -> Option<Partition>;
}

struct VecOpsImpl<T>(PhantomData<fn() -> T>);

impl<T: Clone + Send + Sync + 'static> VecOps for VecOpsImpl<T> {
    fn len(&self, data: &dyn Any) -> Option<usize> {
        data.downcast_ref::<Vec<T>>().map(Vec::len)
    }

    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>> {
        let v = data.downcast_ref::<Vec<T>>()?;
        if n <= 1 || v.len() <= 1 {
            return Some(vec![Box::new(v.clone())]);
        }
        let chunk = v.len().div_ceil(n);
        Some(
            v.chunks(chunk)
                .map(|c| Box::new(c.to_vec()) as Partition)
                .collect(),
        )
    }

    fn clone_any(&self, data: &dyn Any) -> Option<Partition> {
        data.downcast_ref::<Vec<T>>()
            .map(|v| Box::new(v.clone()) as Partition)
    }
}

/// Build the [`VecOps`] for a `Vec<T>` payload.
pub fn vec_ops_for<T: Clone + Send + Sync + 'static>() -> Arc<dyn VecOps> {
    Arc::new(VecOpsImpl::<T>(PhantomData))
}
