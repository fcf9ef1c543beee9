//! Keyed joins built on a co-group node.
//!
//! Each join snapshots the sub-plans ending at its two inputs, runs them
//! independently (in parallel when the runner is), coalesces each side into
//! one partition and groups both sides by key before emitting rows.
//!
//! - [`join_inner`](crate::PCollection::join_inner): keys present on both sides
//! - [`join_left`](crate::PCollection::join_left): every left row, right side optional
//! - [`join_full`](crate::PCollection::join_full): every key from either side
//!
//! Output order is unspecified.

use crate::node::Node;
use crate::type_token::{Partition, downcast_vec};
use crate::{PCollection, RFBound};
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Per-key groups of both sides, in first-seen key order of the left side
/// followed by right-only keys.
type Grouped<K, V, W> = Vec<(K, Vec<V>, Vec<W>)>;

fn group_sides<K, V, W>(left: Vec<(K, V)>, right: Vec<(K, W)>) -> Grouped<K, V, W>
where
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Grouped<K, V, W> = Vec::new();
    for (k, v) in left {
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Vec::new(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(v);
    }
    for (k, w) in right {
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Vec::new(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].2.push(w);
    }
    groups
}

fn coalesce<T: RFBound>(op: &'static str) -> crate::node::MergeFn {
    Arc::new(move |parts: Vec<Partition>| -> Result<Partition> {
        let mut out: Vec<T> = Vec::new();
        for p in parts {
            out.append(&mut downcast_vec::<T>(p, op)?);
        }
        Ok(Box::new(out))
    })
}

impl<K, V> PCollection<(K, V)>
where
    K: RFBound + Eq + Hash,
    V: RFBound,
{
    fn co_group<W, O, F>(&self, right: &PCollection<(K, W)>, emit: F) -> Result<PCollection<(K, O)>>
    where
        W: RFBound,
        O: RFBound,
        F: Fn(K, Vec<V>, Vec<W>, &mut Vec<(K, O)>) + Send + Sync + 'static,
    {
        if !self.pipeline.same_as(&right.pipeline) {
            bail!("cannot join collections that belong to different pipelines");
        }
        let left_chain = self.pipeline.chain_to(self.id)?;
        let right_chain = right.pipeline.chain_to(right.id)?;

        let exec = Arc::new(move |l: Partition, r: Partition| -> Result<Partition> {
            let left_rows = downcast_vec::<(K, V)>(l, "join left")?;
            let right_rows = downcast_vec::<(K, W)>(r, "join right")?;
            let mut out: Vec<(K, O)> = Vec::new();
            for (k, vs, ws) in group_sides(left_rows, right_rows) {
                emit(k, vs, ws, &mut out);
            }
            Ok(Box::new(out))
        });

        let id = self.pipeline.insert_node(Node::CoGroup {
            left: Arc::new(left_chain),
            right: Arc::new(right_chain),
            coalesce_left: coalesce::<(K, V)>("join coalesce left"),
            coalesce_right: coalesce::<(K, W)>("join coalesce right"),
            exec,
        });
        Ok(PCollection::from_node(self.pipeline.clone(), id))
    }

    /// `(K, V)` ⋈ `(K, W)` → `(K, (V, W))`, one row per matching pair.
    ///
    /// # Errors
    /// Fails if the two collections live in different pipelines.
    pub fn join_inner<W: RFBound>(&self, right: &PCollection<(K, W)>) -> Result<PCollection<(K, (V, W))>> {
        self.co_group(right, |k, vs, ws, out| {
            for v in &vs {
                for w in &ws {
                    out.push((k.clone(), (v.clone(), w.clone())));
                }
            }
        })
    }

    /// Left outer join: left rows without a match carry `None`.
    ///
    /// # Errors
    /// Fails if the two collections live in different pipelines.
    pub fn join_left<W: RFBound>(
        &self,
        right: &PCollection<(K, W)>,
    ) -> Result<PCollection<(K, (V, Option<W>))>> {
        self.co_group(right, |k, vs, ws, out| {
            for v in vs {
                if ws.is_empty() {
                    out.push((k.clone(), (v, None)));
                } else {
                    for w in &ws {
                        out.push((k.clone(), (v.clone(), Some(w.clone()))));
                    }
                }
            }
        })
    }

    /// Full outer join: every key of either side, missing side as `None`.
    ///
    /// # Errors
    /// Fails if the two collections live in different pipelines.
    pub fn join_full<W: RFBound>(
        &self,
        right: &PCollection<(K, W)>,
    ) -> Result<PCollection<(K, (Option<V>, Option<W>))>> {
        self.co_group(right, |k, vs, ws, out| match (vs.is_empty(), ws.is_empty()) {
            (false, true) => out.extend(vs.into_iter().map(|v| (k.clone(), (Some(v), None)))),
            (true, false) => out.extend(ws.into_iter().map(|w| (k.clone(), (None, Some(w))))),
            _ => {
                for v in &vs {
                    for w in &ws {
                        out.push((k.clone(), (Some(v.clone()), Some(w.clone()))));
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::group_sides;

    #[test]
    fn groups_keep_left_first_order() {
        let g = group_sides(
            vec![("b", 1), ("a", 2), ("b", 3)],
            vec![("c", 'x'), ("a", 'y')],
        );
        let keys: Vec<&str> = g.iter().map(|(k, _, _)| *k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(g[0].1, vec![1, 3]);
        assert_eq!(g[1].2, vec!['y']);
        assert!(g[2].1.is_empty());
    }
}
