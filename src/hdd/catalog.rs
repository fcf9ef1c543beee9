//! Installed units per model/capacity class.

use crate::combiners::Count;
use crate::hdd::record::{DeviceKey, ModelClass, NormalizedRecord};
use crate::PCollection;

/// Count distinct devices per class.
///
/// A device seen on many days counts once. A serial number seen with two
/// (model, capacity) pairs counts once in each class.
pub fn unit_counts(records: &PCollection<NormalizedRecord>) -> PCollection<(ModelClass, u64)> {
    records
        .clone()
        .map(NormalizedRecord::device)
        .distinct()
        .map(|d: &DeviceKey| (d.class(), ()))
        .combine_values(Count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::normalized;
    use crate::{Pipeline, from_vec};
    use anyhow::Result;

    #[test]
    fn repeated_days_count_once() -> Result<()> {
        let p = Pipeline::new();
        let rows = from_vec(
            &p,
            vec![
                normalized("SN1", "ModelA", 1000, 0),
                normalized("SN1", "ModelA", 1000, 1),
                normalized("SN1", "ModelA", 1000, 0),
                normalized("SN2", "ModelA", 1000, 0),
                normalized("SN3", "ModelB", 4000, 0),
            ],
        );
        let got = unit_counts(&rows).collect_seq_sorted()?;
        assert_eq!(
            got,
            vec![
                (ModelClass::new("ModelA", 1000), 2),
                (ModelClass::new("ModelB", 4000), 1),
            ]
        );
        Ok(())
    }

    #[test]
    fn serial_under_two_classes_is_credited_to_both() -> Result<()> {
        let p = Pipeline::new();
        let rows = from_vec(
            &p,
            vec![
                normalized("SN1", "ModelA", 1000, 0),
                normalized("SN1", "ModelA", 2000, 0),
            ],
        );
        let got = unit_counts(&rows).collect_par_sorted(None, Some(2))?;
        assert_eq!(
            got,
            vec![
                (ModelClass::new("ModelA", 1000), 1),
                (ModelClass::new("ModelA", 2000), 1),
            ]
        );
        Ok(())
    }
}
