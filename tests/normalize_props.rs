// tests/normalize_props.rs
use chrono::{Datelike, Days, NaiveDate};
use hddstats::error::ParseError;
use hddstats::hdd::normalize::{capacity_gb, failure_flag, weekday};
use proptest::prelude::*;

proptest! {
    #[test]
    fn positive_capacity_rounds_like_float_division(b in 1i64..1_000_000_000_000_000) {
        let expected = (b as f64 / 1e9).round_ties_even() as i64;
        prop_assert_eq!(capacity_gb(Some(&b.to_string())), Ok(expected));
    }

    #[test]
    fn non_positive_capacity_passes_through(b in i64::MIN..=0) {
        prop_assert_eq!(capacity_gb(Some(&b.to_string())), Ok(b));
    }

    #[test]
    fn weekday_is_total_over_calendar_dates(offset in 0u64..200_000) {
        let base = NaiveDate::from_ymd_opt(1900, 1, 1).expect("valid base date");
        let date = base + Days::new(offset);
        let text = date.format("%Y-%m-%d").to_string();
        prop_assert_eq!(weekday(Some(&text)), Ok(Some(date.weekday())));
    }

    #[test]
    fn failure_flag_rejects_other_integers(n in any::<i64>().prop_filter("not a flag", |n| *n != 0 && *n != 1)) {
        let is_invalid = matches!(failure_flag(Some(&n.to_string())), Err(ParseError::InvalidFailure { .. }));
        prop_assert!(is_invalid);
    }
}
