//! Weekday pivot: per-class failure sums spread into one column per weekday.
//!
//! The per-(class, weekday) sums are left-joined to the probability table
//! before grouping; under the inner join policy classes the probability step
//! dropped are then removed, and counted either way.
//! Summing is associative, so pivoting pre-aggregated sums gives the same
//! cells as pivoting the daily rows.

use crate::collection::CombineFn;
use crate::config::JoinPolicy;
use crate::hdd::normalize::weekday_name;
use crate::hdd::record::ModelClass;
use crate::hdd::report::SummaryTable;
use crate::{PCollection, Runner};
use anyhow::Result;
use chrono::Weekday;
use tracing::{debug, warn};

/// A pivot output column: a weekday, or the bucket of rows without a date.
///
/// Columns order like their labels sort as pivot values: `null` first, then
/// weekday names alphabetically (`Friday`, `Monday`, ..., `Wednesday`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PivotColumn {
    Day(Weekday),
    Null,
}

pub(crate) const BUCKETS: usize = 8;

impl PivotColumn {
    /// Every possible column in bucket order: Monday to Sunday, then `null`.
    pub const ALL: [PivotColumn; BUCKETS] = [
        PivotColumn::Day(Weekday::Mon),
        PivotColumn::Day(Weekday::Tue),
        PivotColumn::Day(Weekday::Wed),
        PivotColumn::Day(Weekday::Thu),
        PivotColumn::Day(Weekday::Fri),
        PivotColumn::Day(Weekday::Sat),
        PivotColumn::Day(Weekday::Sun),
        PivotColumn::Null,
    ];

    pub fn index(self) -> usize {
        match self {
            PivotColumn::Day(d) => d.num_days_from_monday() as usize,
            PivotColumn::Null => BUCKETS - 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PivotColumn::Day(d) => weekday_name(d),
            PivotColumn::Null => "null",
        }
    }
}

impl Ord for PivotColumn {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let key = |c: &PivotColumn| (matches!(c, PivotColumn::Day(_)), c.label());
        key(self).cmp(&key(other))
    }
}

impl PartialOrd for PivotColumn {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Option<Weekday>> for PivotColumn {
    fn from(day: Option<Weekday>) -> Self {
        day.map_or(PivotColumn::Null, PivotColumn::Day)
    }
}

/// Pivoted cells of one class. `None` buckets had no rows at all.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeekdayCounts {
    pub failure_probability: Option<f64>,
    pub buckets: [Option<u64>; BUCKETS],
}

impl WeekdayCounts {
    fn add(&mut self, column: PivotColumn, failures: u64) {
        let cell = &mut self.buckets[column.index()];
        *cell = Some(cell.unwrap_or(0) + failures);
    }

    /// Sum over every bucket; equals the class's total failure sum.
    pub fn total(&self) -> u64 {
        self.buckets.iter().flatten().sum()
    }
}

/// Input of the pivot combine: column, failures, class probability.
type PivotInput = (PivotColumn, u64, Option<f64>);

struct WeekdayPivot;

impl CombineFn<PivotInput, WeekdayCounts, WeekdayCounts> for WeekdayPivot {
    fn create(&self) -> WeekdayCounts {
        WeekdayCounts::default()
    }

    fn add_input(&self, acc: &mut WeekdayCounts, (column, failures, probability): PivotInput) {
        acc.failure_probability = acc.failure_probability.or(probability);
        acc.add(column, failures);
    }

    fn merge(&self, acc: &mut WeekdayCounts, other: WeekdayCounts) {
        acc.failure_probability = acc.failure_probability.or(other.failure_probability);
        for column in PivotColumn::ALL {
            if let Some(n) = other.buckets[column.index()] {
                acc.add(column, n);
            }
        }
    }

    fn finish(&self, acc: WeekdayCounts) -> WeekdayCounts {
        acc
    }
}

/// The report plus the join's bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PivotOutcome {
    pub table: SummaryTable,
    /// Classes with weekday sums but no probability; dropped under
    /// `JoinPolicy::Inner`, kept with an empty probability otherwise.
    pub without_probability: usize,
}

/// Join weekday sums to probabilities and pivot them into the report.
///
/// `JoinPolicy::Inner` keeps only classes with a probability;
/// `JoinPolicy::Outer` keeps every class, with an empty probability cell
/// where none was derived.
///
/// # Errors
/// Execution failures of the join or combine.
pub fn pivot_weekdays(
    weekday_sums: &PCollection<((ModelClass, Option<Weekday>), u64)>,
    probabilities: &PCollection<(ModelClass, f64)>,
    policy: JoinPolicy,
    runner: &Runner,
) -> Result<PivotOutcome> {
    let cells = weekday_sums
        .clone()
        .map(|((class, day), sum): &((ModelClass, Option<Weekday>), u64)| {
            (class.clone(), (PivotColumn::from(*day), *sum))
        })
        .join_left(probabilities)?
        .map_values(|((column, sum), p): &((PivotColumn, u64), Option<f64>)| (*column, *sum, *p));

    let mut pivoted = cells.combine_values(WeekdayPivot).collect_sorted_by_key(runner)?;
    let without_probability = pivoted
        .iter()
        .filter(|(_, w)| w.failure_probability.is_none())
        .count();
    if policy == JoinPolicy::Inner {
        pivoted.retain(|(_, w)| w.failure_probability.is_some());
    }
    if without_probability > 0 {
        warn!(
            without_probability,
            ?policy,
            "classes with weekday failures but no probability"
        );
    }
    debug!(classes = pivoted.len(), "pivoted weekday failures");
    Ok(PivotOutcome {
        table: SummaryTable::from_pivot(pivoted),
        without_probability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_index_in_calendar_order() {
        let idx: Vec<usize> = PivotColumn::ALL.iter().map(|c| c.index()).collect();
        assert_eq!(idx, (0..BUCKETS).collect::<Vec<_>>());
        assert_eq!(PivotColumn::from(None).label(), "null");
        assert_eq!(PivotColumn::from(Some(Weekday::Sat)).label(), "Saturday");
    }

    #[test]
    fn columns_sort_null_first_then_by_name() {
        let mut columns = PivotColumn::ALL.to_vec();
        columns.sort();
        let labels: Vec<&str> = columns.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec!["null", "Friday", "Monday", "Saturday", "Sunday", "Thursday", "Tuesday", "Wednesday"]
        );
    }

    #[test]
    fn merge_adds_bucket_by_bucket() {
        let pivot = WeekdayPivot;
        let mut a = pivot.create();
        pivot.add_input(&mut a, (PivotColumn::Day(Weekday::Mon), 0, Some(0.5)));
        pivot.add_input(&mut a, (PivotColumn::Day(Weekday::Tue), 1, Some(0.5)));
        let mut b = pivot.create();
        pivot.add_input(&mut b, (PivotColumn::Day(Weekday::Tue), 2, Some(0.5)));
        pivot.add_input(&mut b, (PivotColumn::Null, 1, Some(0.5)));
        pivot.merge(&mut a, b);

        assert_eq!(a.failure_probability, Some(0.5));
        assert_eq!(a.buckets[0], Some(0));
        assert_eq!(a.buckets[1], Some(3));
        assert_eq!(a.buckets[2], None);
        assert_eq!(a.buckets[7], Some(1));
        assert_eq!(a.total(), 4);
    }

    fn inputs(p: &crate::Pipeline) -> (
        PCollection<((ModelClass, Option<Weekday>), u64)>,
        PCollection<(ModelClass, f64)>,
    ) {
        let a = ModelClass::new("A", 1000);
        let b = ModelClass::new("B", 2000);
        let sums = crate::from_vec(
            p,
            vec![
                ((a.clone(), Some(Weekday::Mon)), 0),
                ((a.clone(), Some(Weekday::Tue)), 1),
                ((b.clone(), Some(Weekday::Fri)), 2),
            ],
        );
        let probabilities = crate::from_vec(p, vec![(a, 0.5)]);
        (sums, probabilities)
    }

    #[test]
    fn inner_policy_drops_classes_without_probability() -> Result<()> {
        let p = crate::Pipeline::new();
        let (sums, probabilities) = inputs(&p);
        let PivotOutcome {
            table,
            without_probability,
        } = pivot_weekdays(&sums, &probabilities, JoinPolicy::Inner, &Runner::default())?;
        assert_eq!(without_probability, 1);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.columns,
            vec![PivotColumn::Day(Weekday::Mon), PivotColumn::Day(Weekday::Tue)]
        );
        Ok(())
    }

    #[test]
    fn outer_policy_keeps_them_with_empty_probability() -> Result<()> {
        let p = crate::Pipeline::new();
        let (sums, probabilities) = inputs(&p);
        let outcome = pivot_weekdays(&sums, &probabilities, JoinPolicy::Outer, &Runner::sequential())?;
        assert_eq!(outcome.without_probability, 1);
        let table = outcome.table;
        assert_eq!(table.rows.len(), 2);
        let b = table.row("B", 2000).expect("row B");
        assert_eq!(b.failure_probability, None);
        assert_eq!(table.cell(b, PivotColumn::Day(Weekday::Fri)), Some(2));
        Ok(())
    }
}
