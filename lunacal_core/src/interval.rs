//! Calendar-day interval arithmetic.
//!
//! All arithmetic goes through `chrono::NaiveDate`, so month and year
//! rollovers are carried correctly.

use crate::{DateInterval, Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `start` to `end`
///
/// Fails with [`Error::InvalidRange`] when `end` precedes `start`.
pub fn duration_days(start: NaiveDate, end: NaiveDate) -> Result<i64> {
    if end < start {
        return Err(Error::InvalidRange { start, end });
    }
    Ok((end - start).num_days())
}

/// Whole days between two timestamps, rounded to the nearest day
///
/// Sub-day noise (DST shifts, timestamps stored at odd hours) rounds
/// rather than truncates.
pub fn duration_days_rounded(start: NaiveDateTime, end: NaiveDateTime) -> Result<i64> {
    if end < start {
        return Err(Error::InvalidRange {
            start: start.date(),
            end: end.date(),
        });
    }
    let seconds = (end - start).num_seconds();
    Ok((seconds + SECONDS_PER_DAY / 2) / SECONDS_PER_DAY)
}

/// Inclusive containment; an open interval contains only its start day
pub fn contains(interval: &DateInterval, date: NaiveDate) -> bool {
    let end = interval.end.unwrap_or(interval.start);
    interval.start <= date && date <= end
}

/// `date` moved by `n` days
///
/// Fails with [`Error::InvalidDate`] when the result leaves chrono's
/// representable range.
pub fn add_days(date: NaiveDate, n: i64) -> Result<NaiveDate> {
    Duration::try_days(n)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| Error::InvalidDate(format!("{} {:+} days is out of range", date, n)))
}

/// Closed interval `[center - before, center + after]`
pub fn shift_window(center: NaiveDate, before: i64, after: i64) -> Result<DateInterval> {
    Ok(DateInterval {
        start: add_days(center, -before)?,
        end: Some(add_days(center, after)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_duration_days() {
        assert_eq!(duration_days(date(2024, 1, 1), date(2024, 1, 5)).unwrap(), 4);
        assert_eq!(duration_days(date(2024, 1, 1), date(2024, 1, 1)).unwrap(), 0);
        // leap year February
        assert_eq!(duration_days(date(2024, 2, 27), date(2024, 3, 2)).unwrap(), 4);
    }

    #[test]
    fn test_duration_days_rejects_inverted_range() {
        let err = duration_days(date(2024, 1, 5), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_duration_days_rounded() {
        let start = date(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap();
        let almost = date(2024, 3, 4).and_hms_opt(23, 0, 0).unwrap();
        let just_over = date(2024, 3, 5).and_hms_opt(1, 0, 0).unwrap();
        let half = date(2024, 3, 1).and_hms_opt(12, 0, 0).unwrap();

        assert_eq!(duration_days_rounded(start, almost).unwrap(), 4);
        assert_eq!(duration_days_rounded(start, just_over).unwrap(), 4);
        assert_eq!(duration_days_rounded(start, half).unwrap(), 1);
        assert!(duration_days_rounded(just_over, start).is_err());
    }

    #[test]
    fn test_contains_closed_interval_inclusive() {
        let interval = DateInterval::closed(date(2024, 1, 1), date(2024, 1, 5)).unwrap();
        assert!(contains(&interval, date(2024, 1, 1)));
        assert!(contains(&interval, date(2024, 1, 3)));
        assert!(contains(&interval, date(2024, 1, 5)));
        assert!(!contains(&interval, date(2023, 12, 31)));
        assert!(!contains(&interval, date(2024, 1, 6)));
    }

    #[test]
    fn test_open_interval_contains_only_start() {
        let interval = DateInterval::open(date(2024, 3, 1));
        assert!(contains(&interval, date(2024, 3, 1)));
        assert!(!contains(&interval, date(2024, 3, 2)));
        assert!(!contains(&interval, date(2024, 2, 29)));
    }

    #[test]
    fn test_add_days_carries_month_and_year() {
        assert_eq!(add_days(date(2024, 1, 29), 4).unwrap(), date(2024, 2, 2));
        assert_eq!(add_days(date(2023, 12, 30), 3).unwrap(), date(2024, 1, 2));
        assert_eq!(add_days(date(2024, 3, 1), -1).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_add_days_out_of_range() {
        assert!(matches!(
            add_days(NaiveDate::MAX, 1),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(
            add_days(NaiveDate::MIN, -1),
            Err(Error::InvalidDate(_))
        ));
        assert!(add_days(date(2024, 1, 1), 1_000_000_000_000).is_err());
        assert!(add_days(date(2024, 1, 1), i64::MAX).is_err());
    }

    #[test]
    fn test_shift_window_across_month_boundary() {
        let window = shift_window(date(2024, 3, 1), 2, 2).unwrap();
        assert_eq!(window.start, date(2024, 2, 28));
        assert_eq!(window.end, Some(date(2024, 3, 3)));

        assert!(shift_window(NaiveDate::MAX, 2, 2).is_err());
    }
}
