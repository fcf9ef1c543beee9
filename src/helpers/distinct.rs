//! Exact distinct.
//!
//! Implemented as a keyed count over the element itself followed by a
//! projection back to the key, so duplicates collapse during the local
//! combine phase before anything is merged.

use crate::combiners::Count;
use crate::{PCollection, RFBound};
use std::hash::Hash;

impl<T: RFBound + Eq + Hash> PCollection<T> {
    /// Remove duplicate elements across the whole collection. Order is
    /// unspecified.
    #[must_use]
    pub fn distinct(self) -> Self {
        self.map(|t: &T| (t.clone(), ()))
            .combine_values(Count)
            .keys()
    }
}
