pub(crate) mod collect_sorted;
pub(crate) mod combine;
pub(crate) mod common;
pub(crate) mod distinct;
pub(crate) mod joins;
pub(crate) mod keyed;
pub(crate) mod try_process;
