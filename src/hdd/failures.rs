//! Failure sums over every daily row (no deduplication: each day's flag
//! counts).

use crate::combiners::Sum;
use crate::hdd::record::{ModelClass, NormalizedRecord};
use crate::PCollection;
use chrono::Weekday;

/// Total failures per class.
pub fn failure_sums(records: &PCollection<NormalizedRecord>) -> PCollection<(ModelClass, u64)> {
    records
        .clone()
        .map(|r: &NormalizedRecord| (r.class(), u64::from(r.failure)))
        .combine_values(Sum::<u64>::new())
}

/// Failures per class and weekday; rows without a date fall under `None`.
pub fn weekday_failure_sums(
    records: &PCollection<NormalizedRecord>,
) -> PCollection<((ModelClass, Option<Weekday>), u64)> {
    records
        .clone()
        .map(|r: &NormalizedRecord| ((r.class(), r.weekday), u64::from(r.failure)))
        .combine_values(Sum::<u64>::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{normalized, normalized_on};
    use crate::{Pipeline, Runner, from_vec};
    use anyhow::Result;

    #[test]
    fn every_day_counts() -> Result<()> {
        let p = Pipeline::new();
        let rows = from_vec(
            &p,
            vec![
                normalized("SN1", "ModelA", 1000, 1),
                normalized("SN1", "ModelA", 1000, 1),
                normalized("SN2", "ModelA", 1000, 0),
                normalized("SN3", "ModelB", 4000, 0),
            ],
        );
        let got = failure_sums(&rows).collect_seq_sorted()?;
        assert_eq!(
            got,
            vec![
                (ModelClass::new("ModelA", 1000), 2),
                (ModelClass::new("ModelB", 4000), 0),
            ]
        );
        Ok(())
    }

    #[test]
    fn weekday_sums_split_by_day() -> Result<()> {
        let p = Pipeline::new();
        let rows = from_vec(
            &p,
            vec![
                normalized_on(Some(Weekday::Mon), "SN1", "ModelA", 1000, 0),
                normalized_on(Some(Weekday::Tue), "SN1", "ModelA", 1000, 1),
                normalized_on(Some(Weekday::Mon), "SN2", "ModelA", 1000, 1),
                normalized_on(None, "SN3", "ModelA", 1000, 1),
            ],
        );
        let mut got = weekday_failure_sums(&rows).collect_with(&Runner::default())?;
        got.sort_by_key(|((c, d), _)| (c.clone(), d.map(|w| w.num_days_from_monday())));
        let class = ModelClass::new("ModelA", 1000);
        assert_eq!(
            got,
            vec![
                ((class.clone(), None), 1),
                ((class.clone(), Some(Weekday::Mon)), 1),
                ((class, Some(Weekday::Tue)), 1),
            ]
        );
        Ok(())
    }
}
