//! Built-in combiners for [`combine_values`](crate::PCollection::combine_values).
//!
//! - [`Count`]: number of values per key, whatever their type.
//! - [`Sum<T>`]: sum of values per key.
//!
//! Both are commutative and associative, so per-partition results merge in
//! any order.

use crate::RFBound;
use crate::collection::CombineFn;
use std::marker::PhantomData;
use std::mem::take;
use std::ops::Add;

/// Counts values per key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl<V> CombineFn<V, u64, u64> for Count {
    fn create(&self) -> u64 {
        0
    }

    fn add_input(&self, acc: &mut u64, _v: V) {
        *acc += 1;
    }

    fn merge(&self, acc: &mut u64, other: u64) {
        *acc += other;
    }

    fn finish(&self, acc: u64) -> u64 {
        acc
    }
}

/// Sums values per key. Use an integer `T` when the result must not depend
/// on partitioning.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<T>(PhantomData<fn() -> T>);

impl<T> Sum<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> CombineFn<T, T, T> for Sum<T>
where
    T: RFBound + Add<Output = T> + Default,
{
    fn create(&self) -> T {
        T::default()
    }

    fn add_input(&self, acc: &mut T, v: T) {
        *acc = take(acc) + v;
    }

    fn merge(&self, acc: &mut T, other: T) {
        *acc = take(acc) + other;
    }

    fn finish(&self, acc: T) -> T {
        acc
    }
}
