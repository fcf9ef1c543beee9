//! Keyed combine.
//!
//! `combine_values` is a two-phase barrier: each partition folds its pairs
//! into a `HashMap<K, A>` of accumulators, then the maps of all partitions
//! are merged and finished. Only accumulators cross the barrier, never the
//! raw values, which is what keeps counts and sums cheap on large inputs.

use crate::collection::CombineFn;
use crate::node::Node;
use crate::type_token::{Partition, downcast_part, downcast_vec};
use crate::{PCollection, RFBound};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

impl<K: RFBound + Eq + Hash, V: RFBound> PCollection<(K, V)> {
    /// Aggregate the values of each key with `comb`: `(K, V)` → `(K, O)`.
    ///
    /// Output order is unspecified.
    pub fn combine_values<C, A, O>(self, comb: C) -> PCollection<(K, O)>
    where
        C: CombineFn<V, A, O>,
        A: Send + Sync + 'static,
        O: RFBound,
    {
        let comb = Arc::new(comb);

        let local = {
            let comb = Arc::clone(&comb);
            Arc::new(move |p: Partition| -> anyhow::Result<Partition> {
                let kv = downcast_vec::<(K, V)>(p, "combine local")?;
                let mut accs: HashMap<K, A> = HashMap::new();
                for (k, v) in kv {
                    comb.add_input(accs.entry(k).or_insert_with(|| comb.create()), v);
                }
                Ok(Box::new(accs))
            })
        };

        let merge = Arc::new(move |parts: Vec<Partition>| -> anyhow::Result<Partition> {
            let mut accs: HashMap<K, A> = HashMap::new();
            for p in parts {
                for (k, a) in downcast_part::<HashMap<K, A>>(p, "combine merge")? {
                    match accs.get_mut(&k) {
                        Some(acc) => comb.merge(acc, a),
                        None => {
                            accs.insert(k, a);
                        }
                    }
                }
            }
            let out: Vec<(K, O)> = accs
                .into_iter()
                .map(|(k, a)| (k, comb.finish(a)))
                .collect();
            Ok(Box::new(out))
        });

        self.then(Node::CombineValues { local, merge })
    }
}
