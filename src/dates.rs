//! Calendar-month helpers shared by the aggregation services.

use chrono::NaiveDate;

/// Half-open date range `[start, end)` covering a calendar month.
pub fn month_range(month: i16, year: i16) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(year as i32, month as u32, 1)
        .expect("month is validated to 1-12");
    let (next_month, next_year) = if month == 12 { (1, year + 1) } else { (month + 1, year) };
    let end = NaiveDate::from_ymd_opt(next_year as i32, next_month as u32, 1)
        .expect("month is validated to 1-12");
    (start, end)
}

/// The month before `(month, year)`, wrapping over year boundaries.
pub fn previous_month(month: i16, year: i16) -> (i16, i16) {
    if month > 1 {
        (month - 1, year)
    } else {
        (12, year - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_range_mid_year() {
        let (start, end) = month_range(4, 2024);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_month_range_december_wraps() {
        let (start, end) = month_range(12, 2023);
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_previous_month_january_wraps() {
        assert_eq!(previous_month(1, 2024), (12, 2023));
        assert_eq!(previous_month(7, 2024), (6, 2024));
    }
}
