//! How often a recurring transaction happens and the dates it happens on.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    calendar::{add_months, add_years},
};

/// How often a recurring transaction happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    #[default]
    Daily,
    /// Every seven days.
    Weekly,
    /// A calendar month of variable length.
    Monthly,
    /// A calendar year, Feb 29 falls back to Feb 28 in common years.
    Yearly,
}

impl Frequency {
    /// The lowercase name used in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The `step`-th date after `anchor`.
    ///
    /// Calendar steps are always taken from the anchor so that a day of the
    /// month that does not exist in a shorter month does not drift, e.g.
    /// monthly from Jan 31 gives Feb 29 and then Mar 31.
    fn nth_after(&self, anchor: Date, step: u32) -> Option<Date> {
        let step = i32::try_from(step).ok()?;

        match self {
            Frequency::Daily => anchor.checked_add(Duration::days(i64::from(step))),
            Frequency::Weekly => anchor.checked_add(Duration::weeks(i64::from(step))),
            Frequency::Monthly => add_months(anchor, step),
            Frequency::Yearly => add_years(anchor, step),
        }
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(Error::InvalidFrequency(s.to_owned())),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The dates from `start` to `end`, inclusive, spaced by `frequency`.
///
/// The first date is always `start` unless `end` is before `start`, in which
/// case there are no dates. `end` is included only if a step lands on it.
pub fn occurrences(start: Date, end: Date, frequency: Frequency) -> Occurrences {
    Occurrences {
        anchor: start,
        end,
        frequency,
        step: 0,
        done: false,
    }
}

/// Iterator over the dates of a recurring transaction, created by [occurrences].
#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: Date,
    end: Date,
    frequency: Frequency,
    step: u32,
    done: bool,
}

impl Iterator for Occurrences {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.frequency.nth_after(self.anchor, self.step) {
            Some(date) if date <= self.end => {
                self.step += 1;
                Some(date)
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Occurrences {}

#[cfg(test)]
mod frequency_tests {
    use crate::{Error, recurring::Frequency};

    #[test]
    fn parses_names() {
        assert_eq!("daily".parse(), Ok(Frequency::Daily));
        assert_eq!("Weekly".parse(), Ok(Frequency::Weekly));
        assert_eq!("MONTHLY".parse(), Ok(Frequency::Monthly));
        assert_eq!("yearly".parse(), Ok(Frequency::Yearly));
    }

    #[test]
    fn rejects_unsupported_frequency() {
        assert_eq!(
            "fortnightly".parse::<Frequency>(),
            Err(Error::InvalidFrequency("fortnightly".to_owned()))
        );
    }

    #[test]
    fn serializes_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&Frequency::Monthly).unwrap(),
            "\"monthly\""
        );
    }
}
