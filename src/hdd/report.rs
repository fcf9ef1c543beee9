//! The summary table and its CSV rendering.
//!
//! Columns: `model`, `capacity_GB`, `failure_probability`, then one column per
//! pivot value observed after the join, in [`PivotColumn`] order: `null` (rows
//! without a date) first, then weekday names alphabetically.
//! `failure_probability` is failures per unit ever observed, not a per-day or
//! per-year probability. Empty cells mean "no rows".

use crate::hdd::pivot::{PivotColumn, WeekdayCounts};
use crate::hdd::record::ModelClass;
use crate::io::csv::write_csv_table;
use anyhow::Result;
use std::path::Path;

pub const MODEL_COLUMN: &str = "model";
pub const CAPACITY_COLUMN: &str = "capacity_GB";
pub const PROBABILITY_COLUMN: &str = "failure_probability";

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    pub class: ModelClass,
    pub failure_probability: Option<f64>,
    /// Aligned with [`SummaryTable::columns`].
    pub by_weekday: Vec<Option<u64>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryTable {
    pub columns: Vec<PivotColumn>,
    /// Sorted by class.
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Build from pivoted cells sorted by class. Only columns holding at least
    /// one value are kept, in [`PivotColumn`] order.
    pub fn from_pivot(pivoted: Vec<(ModelClass, WeekdayCounts)>) -> Self {
        let mut columns: Vec<PivotColumn> = PivotColumn::ALL
            .into_iter()
            .filter(|c| pivoted.iter().any(|(_, w)| w.buckets[c.index()].is_some()))
            .collect();
        columns.sort();
        let rows = pivoted
            .into_iter()
            .map(|(class, counts)| SummaryRow {
                class,
                failure_probability: counts.failure_probability,
                by_weekday: columns.iter().map(|c| counts.buckets[c.index()]).collect(),
            })
            .collect();
        Self { columns, rows }
    }

    pub fn header(&self) -> Vec<String> {
        [MODEL_COLUMN, CAPACITY_COLUMN, PROBABILITY_COLUMN]
            .into_iter()
            .chain(self.columns.iter().map(|c| c.label()))
            .map(String::from)
            .collect()
    }

    pub fn render_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|r| {
            let mut cells = Vec::with_capacity(3 + r.by_weekday.len());
            cells.push(r.class.model.clone());
            cells.push(r.class.capacity_gb.to_string());
            cells.push(r.failure_probability.map(format_probability).unwrap_or_default());
            cells.extend(
                r.by_weekday
                    .iter()
                    .map(|c| c.map(|n| n.to_string()).unwrap_or_default()),
            );
            cells
        })
    }

    /// Write the table as a single header-bearing CSV file.
    ///
    /// # Errors
    /// File creation or write failures.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        write_csv_table(path, &self.header(), self.render_rows())
    }

    pub fn row(&self, model: &str, capacity_gb: i64) -> Option<&SummaryRow> {
        self.rows
            .iter()
            .find(|r| r.class.model == model && r.class.capacity_gb == capacity_gb)
    }

    /// Cell of `row` under `column`; `None` if the column is absent or empty.
    pub fn cell(&self, row: &SummaryRow, column: PivotColumn) -> Option<u64> {
        let i = self.columns.iter().position(|c| *c == column)?;
        row.by_weekday.get(i).copied().flatten()
    }
}

/// Shortest round-trip digits in the usual CSV double form: plain decimal
/// with a fractional digit for `1e-3 <= |p| < 1e7` (`0.5`, `1.0`), otherwise
/// scientific with an upper-case exponent (`5.0E-4`, `1.25E7`).
pub fn format_probability(p: f64) -> String {
    if p == 0.0 || !p.is_finite() || (1e-3..1e7).contains(&p.abs()) {
        return format!("{p:?}");
    }
    let sci = format!("{p:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => format!("{mantissa}E{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}.0E{exp}"),
        None => sci,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn counts(probability: f64, cells: &[(PivotColumn, u64)]) -> WeekdayCounts {
        let mut w = WeekdayCounts {
            failure_probability: Some(probability),
            ..Default::default()
        };
        for (c, n) in cells {
            w.buckets[c.index()] = Some(*n);
        }
        w
    }

    #[test]
    fn only_observed_columns_are_kept() {
        let table = SummaryTable::from_pivot(vec![
            (
                ModelClass::new("A", 1000),
                counts(0.5, &[(PivotColumn::Day(Weekday::Tue), 1), (PivotColumn::Day(Weekday::Mon), 0)]),
            ),
            (ModelClass::new("B", 2000), counts(1.0, &[(PivotColumn::Day(Weekday::Fri), 2)])),
        ]);
        assert_eq!(
            table.header(),
            vec!["model", "capacity_GB", "failure_probability", "Friday", "Monday", "Tuesday"]
        );
        let rendered: Vec<Vec<String>> = table.render_rows().collect();
        assert_eq!(rendered[0], vec!["A", "1000", "0.5", "", "0", "1"]);
        assert_eq!(rendered[1], vec!["B", "2000", "1.0", "2", "", ""]);

        let b = table.row("B", 2000).expect("row B");
        assert_eq!(table.cell(b, PivotColumn::Day(Weekday::Fri)), Some(2));
        assert_eq!(table.cell(b, PivotColumn::Day(Weekday::Mon)), None);
        assert_eq!(table.cell(b, PivotColumn::Null), None);
    }

    #[test]
    fn empty_table_has_only_fixed_columns() {
        let table = SummaryTable::from_pivot(Vec::new());
        assert_eq!(table.header().len(), 3);
        assert_eq!(table.render_rows().count(), 0);
    }

    #[test]
    fn probability_formatting() {
        assert_eq!(format_probability(0.5), "0.5");
        assert_eq!(format_probability(2.0), "2.0");
        assert_eq!(format_probability(1.0 / 3.0), "0.3333333333333333");
        assert_eq!(format_probability(0.0), "0.0");
        assert_eq!(format_probability(0.001), "0.001");
    }

    #[test]
    fn small_and_large_probabilities_use_scientific_form() {
        assert_eq!(format_probability(1.0 / 2000.0), "5.0E-4");
        assert_eq!(format_probability(0.00015), "1.5E-4");
        assert_eq!(format_probability(1e7), "1.0E7");
        assert_eq!(format_probability(12_500_000.0), "1.25E7");
    }
}
