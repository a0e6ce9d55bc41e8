//! Calendar arithmetic that is not provided by the `time` crate.

use time::{Date, Duration, Month};

/// Shift `date` by a number of calendar months, keeping the day of the month.
///
/// If the target month is shorter than the day of the month, the date is
/// clamped to the last day of that month, e.g. Jan 31 + 1 month = Feb 29 in a
/// leap year.
///
/// Returns `None` if the result falls outside the range supported by [Date].
pub fn add_months(date: Date, months: i32) -> Option<Date> {
    let month_index = (date.month() as i32 - 1).checked_add(months)?;
    let year = date.year().checked_add(month_index.div_euclid(12))?;
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;

    (1..=date.day())
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
}

/// Shift `date` by a number of calendar years, clamping Feb 29 to Feb 28.
pub fn add_years(date: Date, years: i32) -> Option<Date> {
    add_months(date, years.checked_mul(12)?)
}

/// The first day of the month that `date` falls in.
pub fn first_day_of_month(date: Date) -> Date {
    date.saturating_sub(Duration::days(i64::from(date.day()) - 1))
}

/// The first day of the calendar month given by `year` and `month`.
///
/// `month` counts from 1 (January) to 12 (December).
///
/// # Errors
/// Returns [Error::InvalidMonth](crate::Error::InvalidMonth) if `month` is
/// out of range or `year` is outside the supported range.
pub fn month_start(year: i32, month: u8) -> Result<Date, crate::Error> {
    Month::try_from(month)
        .ok()
        .filter(|_| (1..=9999).contains(&year))
        .and_then(|month| Date::from_calendar_date(year, month, 1).ok())
        .ok_or(crate::Error::InvalidMonth { year, month })
}

#[cfg(test)]
mod calendar_tests {
    use time::macros::date;

    use crate::Error;

    use super::{add_months, add_years, first_day_of_month, month_start};

    #[test]
    fn add_months_keeps_day_of_month() {
        assert_eq!(add_months(date!(2024 - 01 - 15), 1), Some(date!(2024 - 02 - 15)));
        assert_eq!(add_months(date!(2024 - 11 - 15), 3), Some(date!(2025 - 02 - 15)));
    }

    #[test]
    fn add_months_clamps_to_end_of_shorter_month() {
        assert_eq!(add_months(date!(2024 - 01 - 31), 1), Some(date!(2024 - 02 - 29)));
        assert_eq!(add_months(date!(2023 - 01 - 31), 1), Some(date!(2023 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 01 - 31), 3), Some(date!(2024 - 04 - 30)));
    }

    #[test]
    fn add_months_goes_backwards() {
        assert_eq!(add_months(date!(2024 - 03 - 31), -1), Some(date!(2024 - 02 - 29)));
        assert_eq!(add_months(date!(2024 - 01 - 01), -2), Some(date!(2023 - 11 - 01)));
    }

    #[test]
    fn add_years_handles_leap_day() {
        assert_eq!(add_years(date!(2024 - 02 - 29), 1), Some(date!(2025 - 02 - 28)));
        assert_eq!(add_years(date!(2024 - 02 - 29), 4), Some(date!(2028 - 02 - 29)));
    }

    #[test]
    fn add_months_returns_none_past_max_date() {
        assert_eq!(add_months(date!(9999 - 12 - 01), 1), None);
    }

    #[test]
    fn first_day() {
        assert_eq!(first_day_of_month(date!(2024 - 02 - 29)), date!(2024 - 02 - 01));
    }

    #[test]
    fn month_start_rejects_invalid_month() {
        assert_eq!(month_start(2024, 13), Err(Error::InvalidMonth { year: 2024, month: 13 }));
        assert_eq!(month_start(2024, 0), Err(Error::InvalidMonth { year: 2024, month: 0 }));
        assert_eq!(month_start(2024, 12), Ok(date!(2024 - 12 - 01)));
    }
}
