//! Failure probability per class.
//!
//! `failure_probability = failure_sum / unit_count` is a rate: failures per
//! unit ever observed, across the whole observation window. It can exceed 1
//! when a unit reports failures on several days.

use crate::config::JoinPolicy;
use crate::error::PipelineError;
use crate::hdd::record::ModelClass;
use crate::{PCollection, Runner};
use anyhow::Result;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct ClassProbability {
    pub class: ModelClass,
    pub unit_count: u64,
    pub failure_sum: u64,
    pub failure_probability: f64,
}

/// Probabilities plus the classes that were present on only one side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbabilityTable {
    /// Sorted by class.
    pub rows: Vec<ClassProbability>,
    /// Classes with units but no failure sum.
    pub units_only: usize,
    /// Classes with a failure sum but no counted unit.
    pub failures_only: usize,
}

impl ProbabilityTable {
    /// `(class, probability)` pairs, the shape the pivot joins against.
    pub fn pairs(&self) -> Vec<(ModelClass, f64)> {
        self.rows
            .iter()
            .map(|r| (r.class.clone(), r.failure_probability))
            .collect()
    }
}

/// Divide, refusing a zero denominator.
///
/// # Errors
/// [`PipelineError::ZeroUnits`] when `unit_count` is 0.
pub fn failure_probability(
    class: &ModelClass,
    failure_sum: u64,
    unit_count: u64,
) -> Result<f64, PipelineError> {
    if unit_count == 0 {
        return Err(PipelineError::ZeroUnits {
            class: class.clone(),
            failure_sum,
        });
    }
    Ok(failure_sum as f64 / unit_count as f64)
}

/// Join unit counts with failure sums and derive each class's probability.
///
/// The sides are co-grouped in full so one-sided classes can be counted and
/// logged. `JoinPolicy::Inner` then drops them; `JoinPolicy::Outer` keeps a
/// class without failures at probability 0 and fails on a class without
/// units.
///
/// # Errors
/// Execution failures, or [`PipelineError::ZeroUnits`].
pub fn derive_probabilities(
    units: &PCollection<(ModelClass, u64)>,
    failures: &PCollection<(ModelClass, u64)>,
    policy: JoinPolicy,
    runner: &Runner,
) -> Result<ProbabilityTable> {
    let joined = units.join_full(failures)?.collect_sorted_by_key(runner)?;

    let mut table = ProbabilityTable::default();
    for (class, (unit_count, failure_sum)) in joined {
        let (unit_count, failure_sum) = match (unit_count, failure_sum) {
            (Some(u), Some(f)) => (u, f),
            (Some(u), None) => {
                table.units_only += 1;
                match policy {
                    JoinPolicy::Inner => continue,
                    JoinPolicy::Outer => (u, 0),
                }
            }
            (None, Some(f)) => {
                table.failures_only += 1;
                match policy {
                    JoinPolicy::Inner => continue,
                    JoinPolicy::Outer => (0, f),
                }
            }
            (None, None) => continue,
        };
        let failure_probability = failure_probability(&class, failure_sum, unit_count)?;
        table.rows.push(ClassProbability {
            class,
            unit_count,
            failure_sum,
            failure_probability,
        });
    }

    if table.units_only + table.failures_only > 0 {
        warn!(
            units_only = table.units_only,
            failures_only = table.failures_only,
            ?policy,
            "classes present on only one side of the unit/failure join"
        );
    }
    debug!(classes = table.rows.len(), "derived failure probabilities");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pipeline, from_vec};

    fn sides(p: &Pipeline) -> (PCollection<(ModelClass, u64)>, PCollection<(ModelClass, u64)>) {
        let units = from_vec(
            p,
            vec![
                (ModelClass::new("A", 1000), 2),
                (ModelClass::new("B", 4000), 4),
            ],
        );
        let failures = from_vec(
            p,
            vec![
                (ModelClass::new("A", 1000), 1),
                (ModelClass::new("C", 8000), 3),
            ],
        );
        (units, failures)
    }

    #[test]
    fn inner_policy_drops_one_sided_classes() -> Result<()> {
        let p = Pipeline::new();
        let (units, failures) = sides(&p);
        let table = derive_probabilities(&units, &failures, JoinPolicy::Inner, &Runner::sequential())?;
        assert_eq!(
            table.rows,
            vec![ClassProbability {
                class: ModelClass::new("A", 1000),
                unit_count: 2,
                failure_sum: 1,
                failure_probability: 0.5,
            }]
        );
        assert_eq!((table.units_only, table.failures_only), (1, 1));
        Ok(())
    }

    #[test]
    fn outer_policy_fails_on_class_without_units() {
        let p = Pipeline::new();
        let (units, failures) = sides(&p);
        let err = derive_probabilities(&units, &failures, JoinPolicy::Outer, &Runner::sequential())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ZeroUnits { failure_sum: 3, .. })
        ));
    }

    #[test]
    fn outer_policy_keeps_units_without_failures_at_zero() -> Result<()> {
        let p = Pipeline::new();
        let units = from_vec(&p, vec![(ModelClass::new("B", 4000), 4u64)]);
        let failures = from_vec(&p, Vec::<(ModelClass, u64)>::new());
        let table = derive_probabilities(&units, &failures, JoinPolicy::Outer, &Runner::default())?;
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].failure_probability, 0.0);
        assert_eq!(table.units_only, 1);
        Ok(())
    }

    #[test]
    fn rate_can_exceed_one() -> Result<()> {
        let class = ModelClass::new("A", 1);
        assert_eq!(failure_probability(&class, 3, 2)?, 1.5);
        Ok(())
    }
}
