//! Queries over the transactions generated by a recurring transaction.

use rusqlite::{Connection, ToSql};
use time::Date;

use crate::{
    Error,
    database_id::RecurringId,
    transaction::{
        Transaction,
        core::{
            PATCH_ASSIGNMENTS, TRANSACTION_COLUMNS, TransactionPatch, map_transaction_row,
            patch_params, tags_to_json,
        },
    },
};

/// Restricts queries over linked transactions to a range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Every date.
    All,
    /// Dates strictly after the given date.
    After(Date),
    /// Dates on or before the given date.
    OnOrBefore(Date),
}

impl DateFilter {
    /// Whether `date` passes the filter.
    pub fn contains(&self, date: Date) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::After(boundary) => date > *boundary,
            DateFilter::OnOrBefore(boundary) => date <= *boundary,
        }
    }

    fn sql_clause(&self) -> &'static str {
        match self {
            DateFilter::All => "",
            DateFilter::After(_) => " AND date > :boundary",
            DateFilter::OnOrBefore(_) => " AND date <= :boundary",
        }
    }

    fn boundary(&self) -> Option<&Date> {
        match self {
            DateFilter::All => None,
            DateFilter::After(date) | DateFilter::OnOrBefore(date) => Some(date),
        }
    }
}

/// The named parameters for a query on `recurring_id` filtered by `filter`.
fn filter_params<'a>(
    recurring_id: &'a RecurringId,
    filter: &'a DateFilter,
) -> Vec<(&'static str, &'a dyn ToSql)> {
    let mut params: Vec<(&str, &dyn ToSql)> = vec![(":recurring_id", recurring_id)];

    if let Some(date) = filter.boundary() {
        params.push((":boundary", date));
    }

    params
}

/// Get the transactions generated by `recurring_id` that pass `filter`, ordered by date.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn select_by_recurring_id(
    recurring_id: RecurringId,
    filter: DateFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let params = filter_params(&recurring_id, &filter);

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE recurring_id = :recurring_id{}
             ORDER BY date ASC, id ASC",
            filter.sql_clause()
        ))?
        .query_map(params.as_slice(), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Delete the transactions generated by `recurring_id` that pass `filter`.
///
/// Returns the number of deleted transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_by_recurring_id(
    recurring_id: RecurringId,
    filter: DateFilter,
    connection: &Connection,
) -> Result<usize, Error> {
    let params = filter_params(&recurring_id, &filter);

    let rows_affected = connection.execute(
        &format!(
            "DELETE FROM \"transaction\" WHERE recurring_id = :recurring_id{}",
            filter.sql_clause()
        ),
        params.as_slice(),
    )?;

    Ok(rows_affected)
}

/// Apply `patch` to the transactions generated by `recurring_id` that pass `filter`.
///
/// Returns the number of updated transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn update_by_recurring_id(
    recurring_id: RecurringId,
    filter: DateFilter,
    patch: &TransactionPatch,
    connection: &Connection,
) -> Result<usize, Error> {
    let tags = patch.tags.as_deref().map(tags_to_json).transpose()?;
    let mut params = patch_params(patch, &tags);
    params.extend(filter_params(&recurring_id, &filter));

    let rows_affected = connection.execute(
        &format!(
            "UPDATE \"transaction\" SET {PATCH_ASSIGNMENTS}
             WHERE recurring_id = :recurring_id{}",
            filter.sql_clause()
        ),
        params.as_slice(),
    )?;

    Ok(rows_affected)
}
