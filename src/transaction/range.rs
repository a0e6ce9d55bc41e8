//! Calendar month ranges used to list transactions.

use time::{Date, Month};

use crate::{
    Error,
    calendar::{add_months, first_day_of_month, month_start},
};

/// A half-open range of dates, `[from, until)`, covering whole calendar months.
///
/// A `from` of `None` means the range has no lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    /// The first day of the first month, or `None` for no lower bound.
    pub from: Option<Date>,
    /// The first day of the month after the last month.
    pub until: Date,
}

impl MonthRange {
    /// The single calendar month `month` of `year`.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `year` and `month` do not form a valid month.
    pub fn month(year: i32, month: u8) -> Result<Self, Error> {
        Self::months(year, month, year, month)
    }

    /// The calendar months from `from_year`-`from_month` to `to_year`-`to_month`, inclusive.
    ///
    /// # Errors
    /// Returns an [Error::InvalidMonth] if either month is invalid or
    /// [Error::InvalidDateRange] if the last month comes before the first.
    pub fn months(from_year: i32, from_month: u8, to_year: i32, to_month: u8) -> Result<Self, Error> {
        let from = month_start(from_year, from_month)?;
        let last_month = month_start(to_year, to_month)?;

        if last_month < from {
            return Err(Error::InvalidDateRange {
                start_date: from,
                end_date: last_month,
            });
        }

        Ok(Self {
            from: Some(from),
            until: next_month_start(last_month)?,
        })
    }

    /// The month containing `today` and the `months - 1` months before it.
    ///
    /// A `months` of zero is treated as one.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if the range leaves the supported calendar.
    pub fn past_months(today: Date, months: u32) -> Result<Self, Error> {
        let this_month = first_day_of_month(today);
        let months_before = i32::try_from(months.max(1) - 1).unwrap_or(i32::MAX);

        let from = add_months(this_month, -months_before).ok_or(Error::InvalidMonth {
            year: today.year(),
            month: today.month() as u8,
        })?;

        Ok(Self {
            from: Some(from),
            until: next_month_start(this_month)?,
        })
    }

    /// January 1st of the year of `today` up to the end of the month containing `today`.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `today` is in the last supported month.
    pub fn year_to_date(today: Date) -> Result<Self, Error> {
        let from = Date::from_calendar_date(today.year(), Month::January, 1).map_err(|_| {
            Error::InvalidMonth {
                year: today.year(),
                month: 1,
            }
        })?;

        Ok(Self {
            from: Some(from),
            until: next_month_start(first_day_of_month(today))?,
        })
    }

    /// Everything up to the end of the month containing `today`.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `today` is in the last supported month.
    pub fn to_date(today: Date) -> Result<Self, Error> {
        Ok(Self {
            from: None,
            until: next_month_start(first_day_of_month(today))?,
        })
    }
}

fn next_month_start(month_start: Date) -> Result<Date, Error> {
    add_months(month_start, 1).ok_or(Error::InvalidMonth {
        year: month_start.year(),
        month: month_start.month() as u8,
    })
}

#[cfg(test)]
mod month_range_tests {
    use time::macros::date;

    use crate::Error;

    use super::MonthRange;

    #[test]
    fn single_month() {
        assert_eq!(
            MonthRange::month(2024, 12),
            Ok(MonthRange {
                from: Some(date!(2024 - 12 - 01)),
                until: date!(2025 - 01 - 01),
            })
        );
    }

    #[test]
    fn month_range_is_inclusive() {
        assert_eq!(
            MonthRange::months(2024, 11, 2025, 2),
            Ok(MonthRange {
                from: Some(date!(2024 - 11 - 01)),
                until: date!(2025 - 03 - 01),
            })
        );
    }

    #[test]
    fn reversed_months_are_rejected() {
        assert_eq!(
            MonthRange::months(2025, 2, 2024, 11),
            Err(Error::InvalidDateRange {
                start_date: date!(2025 - 02 - 01),
                end_date: date!(2024 - 11 - 01),
            })
        );
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert_eq!(
            MonthRange::month(2024, 13),
            Err(Error::InvalidMonth {
                year: 2024,
                month: 13
            })
        );
    }

    #[test]
    fn past_three_months_includes_current_month() {
        assert_eq!(
            MonthRange::past_months(date!(2025 - 01 - 20), 3),
            Ok(MonthRange {
                from: Some(date!(2024 - 11 - 01)),
                until: date!(2025 - 02 - 01),
            })
        );
    }

    #[test]
    fn past_zero_months_is_current_month() {
        assert_eq!(
            MonthRange::past_months(date!(2025 - 01 - 20), 0),
            MonthRange::month(2025, 1)
        );
    }

    #[test]
    fn year_to_date_ends_after_current_month() {
        assert_eq!(
            MonthRange::year_to_date(date!(2025 - 05 - 31)),
            Ok(MonthRange {
                from: Some(date!(2025 - 01 - 01)),
                until: date!(2025 - 06 - 01),
            })
        );
    }

    #[test]
    fn to_date_has_no_lower_bound() {
        assert_eq!(
            MonthRange::to_date(date!(2025 - 12 - 15)),
            Ok(MonthRange {
                from: None,
                until: date!(2026 - 01 - 01),
            })
        );
    }
}
