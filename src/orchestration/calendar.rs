use chrono::{Datelike, NaiveDate, Weekday};

/// Monday-to-Friday dates in `[start, end]`, ascending. Holidays are not excluded.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |date| *date <= end)
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_skips_weekends() {
        // 2025-01-03 is a Friday.
        let days: Vec<NaiveDate> = business_days(day(1, 3), day(1, 7)).collect();
        assert_eq!(days, vec![day(1, 3), day(1, 6), day(1, 7)]);
    }

    #[test]
    fn test_inclusive_single_day() {
        assert_eq!(business_days(day(1, 2), day(1, 2)).count(), 1);
    }

    #[test]
    fn test_weekend_only_range_is_empty() {
        assert_eq!(business_days(day(1, 4), day(1, 5)).count(), 0);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        assert_eq!(business_days(day(1, 10), day(1, 2)).count(), 0);
    }
}
