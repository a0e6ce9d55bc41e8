//! The recurring transaction template and the types used to create and edit it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    calendar::add_years,
    database_id::RecurringId,
    recurring::Frequency,
    transaction::{DateFilter, TransactionType, validate_amount, validate_name},
};

/// The longest time a recurring transaction may span.
pub const MAX_DURATION_YEARS: i32 = 100;

/// A template for a transaction that repeats on a regular schedule, e.g. rent or wages.
///
/// The transactions it generates are stored as ordinary transactions that
/// refer back to the template with their `recurring_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    /// The ID of the recurring transaction.
    pub id: RecurringId,
    /// A short description copied to every generated transaction.
    pub name: String,
    /// The category copied to every generated transaction.
    pub category: String,
    /// The tags copied to every generated transaction.
    pub tags: Vec<String>,
    /// The amount of every generated transaction, always positive.
    pub amount: f64,
    /// Whether the generated transactions are expenses or income.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The date of the first generated transaction.
    pub start_date: Date,
    /// No transactions are generated after this date.
    pub end_date: Date,
    /// How often a transaction is generated.
    pub frequency: Frequency,
    /// When the recurring transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_date: OffsetDateTime,
}

/// The data needed to create a [RecurringTransaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringTransaction {
    /// A short description of the transaction.
    pub name: String,
    /// The category of the generated transactions.
    pub category: String,
    /// The tags of the generated transactions.
    pub tags: Vec<String>,
    /// The amount of each generated transaction.
    pub amount: f64,
    /// Whether the generated transactions are expenses or income.
    pub transaction_type: TransactionType,
    /// The date of the first transaction.
    pub start_date: Date,
    /// The last possible date of a transaction.
    pub end_date: Date,
    /// How often a transaction happens.
    pub frequency: Frequency,
}

impl NewRecurringTransaction {
    /// Check the invariants of a recurring transaction.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyName] if the name is empty,
    /// - [Error::InvalidAmount] if the amount is not a positive number,
    /// - [Error::InvalidDateRange] if the end date is not after the start date,
    /// - [Error::DateRangeTooLong] if the end date is more than 100 years after the start date.
    pub fn validate(&self) -> Result<(), Error> {
        validate_name(&self.name)?;
        validate_amount(self.amount)?;

        if self.end_date <= self.start_date {
            return Err(Error::InvalidDateRange {
                start_date: self.start_date,
                end_date: self.end_date,
            });
        }

        // A limit past the end of the calendar cannot be exceeded.
        if add_years(self.start_date, MAX_DURATION_YEARS).is_some_and(|limit| self.end_date > limit)
        {
            return Err(Error::DateRangeTooLong {
                start_date: self.start_date,
                end_date: self.end_date,
            });
        }

        Ok(())
    }
}

/// The fields of a recurring transaction to change, fields set to `None` are left as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurringPatch {
    /// The new name.
    pub name: Option<String>,
    /// The new category.
    pub category: Option<String>,
    /// The new tags.
    pub tags: Option<Vec<String>>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new transaction type.
    pub transaction_type: Option<TransactionType>,
    /// The new start date.
    pub start_date: Option<Date>,
    /// The new end date.
    pub end_date: Option<Date>,
    /// The new frequency.
    pub frequency: Option<Frequency>,
}

impl RecurringPatch {
    /// The recurring transaction that results from applying this patch to `template`.
    pub fn merge(&self, template: &RecurringTransaction) -> NewRecurringTransaction {
        NewRecurringTransaction {
            name: self.name.clone().unwrap_or_else(|| template.name.clone()),
            category: self
                .category
                .clone()
                .unwrap_or_else(|| template.category.clone()),
            tags: self.tags.clone().unwrap_or_else(|| template.tags.clone()),
            amount: self.amount.unwrap_or(template.amount),
            transaction_type: self.transaction_type.unwrap_or(template.transaction_type),
            start_date: self.start_date.unwrap_or(template.start_date),
            end_date: self.end_date.unwrap_or(template.end_date),
            frequency: self.frequency.unwrap_or(template.frequency),
        }
    }
}

/// Which generated transactions an edit or deletion of a recurring transaction affects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyTo {
    /// Only transactions dated after today, earlier transactions are kept as they are.
    #[default]
    Future,
    /// Every transaction generated by the recurring transaction.
    All,
}

impl ApplyTo {
    /// The generated transactions affected when the operation happens on `today`.
    pub fn date_filter(&self, today: Date) -> DateFilter {
        match self {
            ApplyTo::Future => DateFilter::After(today),
            ApplyTo::All => DateFilter::All,
        }
    }
}

impl FromStr for ApplyTo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "future" => Ok(ApplyTo::Future),
            "all" => Ok(ApplyTo::All),
            _ => Err(Error::InvalidApplyTo(s.to_owned())),
        }
    }
}

/// How many generated transactions a synchronization changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// The number of generated transactions that were deleted.
    pub deleted: usize,
    /// The number of generated transactions that were detached from the recurring transaction.
    pub unlinked: usize,
    /// The number of transactions that were generated.
    pub created: usize,
}

#[cfg(test)]
mod recurring_model_tests {
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error,
        recurring::{ApplyTo, Frequency, NewRecurringTransaction, RecurringPatch, RecurringTransaction},
        transaction::{DateFilter, TransactionType},
    };

    fn new_rent() -> NewRecurringTransaction {
        NewRecurringTransaction {
            name: "Rent".to_owned(),
            category: "Rent".to_owned(),
            tags: vec![],
            amount: 100.0,
            transaction_type: TransactionType::Expense,
            start_date: date!(2024 - 01 - 01),
            end_date: date!(2024 - 03 - 01),
            frequency: Frequency::Monthly,
        }
    }

    #[test]
    fn valid_template_passes() {
        assert_eq!(new_rent().validate(), Ok(()));
    }

    #[test]
    fn end_date_must_be_after_start_date() {
        let mut template = new_rent();
        template.end_date = template.start_date;

        assert_eq!(
            template.validate(),
            Err(Error::InvalidDateRange {
                start_date: date!(2024 - 01 - 01),
                end_date: date!(2024 - 01 - 01),
            })
        );
    }

    #[test]
    fn span_of_exactly_100_years_is_allowed() {
        let mut template = new_rent();
        template.end_date = date!(2124 - 01 - 01);

        assert_eq!(template.validate(), Ok(()));
    }

    #[test]
    fn span_over_100_years_is_rejected() {
        let mut template = new_rent();
        template.end_date = date!(2124 - 01 - 02);

        assert_eq!(
            template.validate(),
            Err(Error::DateRangeTooLong {
                start_date: date!(2024 - 01 - 01),
                end_date: date!(2124 - 01 - 02),
            })
        );
    }

    #[test]
    fn amount_must_be_positive() {
        let mut template = new_rent();
        template.amount = -5.0;

        assert_eq!(template.validate(), Err(Error::InvalidAmount(-5.0)));
    }

    #[test]
    fn amount_must_be_finite() {
        let mut template = new_rent();
        template.amount = f64::INFINITY;

        assert_eq!(template.validate(), Err(Error::InvalidAmount(f64::INFINITY)));
    }

    #[test]
    fn merge_only_overwrites_given_fields() {
        let template = RecurringTransaction {
            id: 1,
            name: "Rent".to_owned(),
            category: "Rent".to_owned(),
            tags: vec!["home".to_owned()],
            amount: 100.0,
            transaction_type: TransactionType::Expense,
            start_date: date!(2024 - 01 - 01),
            end_date: date!(2024 - 03 - 01),
            frequency: Frequency::Monthly,
            created_date: OffsetDateTime::UNIX_EPOCH,
        };
        let patch = RecurringPatch {
            amount: Some(200.0),
            frequency: Some(Frequency::Weekly),
            ..Default::default()
        };

        let merged = patch.merge(&template);

        assert_eq!(merged.amount, 200.0);
        assert_eq!(merged.frequency, Frequency::Weekly);
        assert_eq!(merged.name, "Rent");
        assert_eq!(merged.tags, vec!["home".to_owned()]);
        assert_eq!(merged.start_date, template.start_date);
        assert_eq!(merged.end_date, template.end_date);
    }

    #[test]
    fn apply_to_defaults_to_future() {
        assert_eq!(ApplyTo::default(), ApplyTo::Future);
    }

    #[test]
    fn apply_to_filters() {
        let today = date!(2024 - 02 - 15);

        assert_eq!(ApplyTo::Future.date_filter(today), DateFilter::After(today));
        assert_eq!(ApplyTo::All.date_filter(today), DateFilter::All);
    }

    #[test]
    fn apply_to_rejects_unknown_policy() {
        assert_eq!(
            "past".parse::<ApplyTo>(),
            Err(Error::InvalidApplyTo("past".to_owned()))
        );
    }
}
