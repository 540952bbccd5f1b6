//! Month arithmetic and integer amount splitting.

use chrono::{Datelike, NaiveDate};

/// First day of the month containing `date`.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after the one containing `date`.
#[must_use]
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    let (year, month) = if start.month() == 12 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start)
}

/// First day of the month before the one containing `date`.
#[must_use]
pub fn previous_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    let (year, month) = if start.month() == 1 {
        (start.year() - 1, 12)
    } else {
        (start.year(), start.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start)
}

/// Split `total_minor` into `parts` near-equal integer shares that sum
/// exactly to `total_minor`. The remainder is spread one minor unit at a
/// time over the leading shares.
#[must_use]
pub fn split_amount_minor(total_minor: i64, parts: usize) -> Vec<i64> {
    if parts == 0 {
        return Vec::new();
    }
    let parts_i64 = parts as i64;
    let base = total_minor.div_euclid(parts_i64);
    let remainder = total_minor.rem_euclid(parts_i64);
    (0..parts_i64)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_start_truncates_day() {
        assert_eq!(month_start(date(2025, 2, 15)), date(2025, 2, 1));
        assert_eq!(month_start(date(2025, 2, 1)), date(2025, 2, 1));
    }

    #[test]
    fn month_arithmetic_wraps_years() {
        assert_eq!(next_month_start(date(2025, 12, 31)), date(2026, 1, 1));
        assert_eq!(previous_month_start(date(2025, 1, 5)), date(2024, 12, 1));
    }

    #[test]
    fn split_sums_exactly_with_unit_variance() {
        let shares = split_amount_minor(12345, 3);
        assert_eq!(shares.iter().sum::<i64>(), 12345);
        let max = shares.iter().max().unwrap();
        let min = shares.iter().min().unwrap();
        assert!(max - min <= 1, "shares {shares:?} vary by more than 1");
    }

    #[test]
    fn split_handles_negative_totals() {
        let shares = split_amount_minor(-10, 3);
        assert_eq!(shares.iter().sum::<i64>(), -10);
        let max = shares.iter().max().unwrap();
        let min = shares.iter().min().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn split_zero_parts_is_empty() {
        assert!(split_amount_minor(100, 0).is_empty());
    }
}
