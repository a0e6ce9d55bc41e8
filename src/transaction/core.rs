//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::{RecurringId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction spent or earned money.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money was spent.
    #[default]
    Expense,
    /// Money was earned.
    Income,
}

impl TransactionType {
    /// The lowercase name used in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            _ => Err(Error::InvalidTransactionType(s.to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The recurring transaction that generated this transaction.
    ///
    /// `None` for transactions that were created on their own, or that were
    /// detached when their recurring transaction was deleted.
    pub recurring_id: Option<RecurringId>,
    /// A short description of what the transaction was for.
    pub name: String,
    /// The name of the category the transaction belongs to.
    pub category: String,
    /// Free-form labels attached to the transaction.
    pub tags: Vec<String>,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// Whether the money was spent or earned.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    pub date: Date,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_date: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, date: Date, name: &str) -> TransactionBuilder {
        TransactionBuilder {
            name: name.to_owned(),
            category: DEFAULT_CATEGORY.to_owned(),
            tags: Vec::new(),
            amount,
            transaction_type: TransactionType::Expense,
            date,
            recurring_id: None,
        }
    }
}

/// The category given to transactions that do not specify one.
pub const DEFAULT_CATEGORY: &str = "Miscellaneous";

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{Transaction, TransactionType};
///
/// let salary = Transaction::build(2500.0, date!(2025 - 01 - 15), "Salary")
///     .category("Income")
///     .transaction_type(TransactionType::Income);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// A short description of the transaction.
    pub name: String,

    /// The category of the transaction, e.g. "Groceries", "Rent".
    ///
    /// Defaults to [DEFAULT_CATEGORY].
    pub category: String,

    /// Labels attached to the transaction.
    pub tags: Vec<String>,

    /// The monetary amount of the transaction.
    ///
    /// Amounts are always positive, whether money was spent or earned is
    /// given by [TransactionBuilder::transaction_type].
    pub amount: f64,

    /// Whether money was spent or earned. Defaults to an expense.
    pub transaction_type: TransactionType,

    /// The date when the transaction occurred.
    pub date: Date,

    /// The recurring transaction this transaction was generated from.
    pub recurring_id: Option<RecurringId>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    /// Set the tags for the transaction.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set whether the transaction is an expense or income.
    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Link the transaction to the recurring transaction that generated it.
    pub fn recurring_id(mut self, recurring_id: Option<RecurringId>) -> Self {
        self.recurring_id = recurring_id;
        self
    }

    /// Check that the name is not empty and the amount is positive.
    ///
    /// # Errors
    /// Returns [Error::EmptyName] or [Error::InvalidAmount].
    pub fn validate(&self) -> Result<(), Error> {
        validate_name(&self.name)?;
        validate_amount(self.amount)
    }
}

/// The fields of a transaction to change, fields set to `None` are left as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// The new name.
    pub name: Option<String>,
    /// The new category.
    pub category: Option<String>,
    /// The new tags, replacing the existing tags.
    pub tags: Option<Vec<String>>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new transaction type.
    pub transaction_type: Option<TransactionType>,
    /// The new date.
    pub date: Option<Date>,
    /// Whether to clear the link to the recurring transaction.
    pub unlink: bool,
}

impl TransactionPatch {
    /// A patch that only detaches transactions from their recurring transaction.
    pub fn unlink() -> Self {
        Self {
            unlink: true,
            ..Default::default()
        }
    }

    /// Check the fields that are set.
    ///
    /// # Errors
    /// Returns [Error::EmptyName] or [Error::InvalidAmount].
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }

        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }

        Ok(())
    }
}

/// Returns [Error::EmptyName] if `name` is empty or only whitespace.
pub(crate) fn validate_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(())
    }
}

/// Returns [Error::InvalidAmount] unless `amount` is a finite number greater than zero.
pub(crate) fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, recurring_id, name, category, tags, amount, type, date, created_date";

const INSERT_TRANSACTION_SQL: &str = "INSERT INTO \"transaction\"
        (recurring_id, name, category, tags, amount, type, date, created_date)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
     RETURNING id, recurring_id, name, category, tags, amount, type, date, created_date";

/// The `SET` clause shared by the update queries, takes the parameters from [patch_params].
pub(crate) const PATCH_ASSIGNMENTS: &str = "name = COALESCE(:name, name),
        category = COALESCE(:category, category),
        tags = COALESCE(:tags, tags),
        amount = COALESCE(:amount, amount),
        type = COALESCE(:type, type),
        date = COALESCE(:date, date),
        recurring_id = CASE WHEN :unlink THEN NULL ELSE recurring_id END";

/// Create a new transaction in the database from a builder.
///
/// The builder is not validated, callers should call [TransactionBuilder::validate] first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error,
/// e.g. `recurring_id` does not refer to a recurring transaction.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    insert_batch(&[builder], connection)?
        .pop()
        .ok_or(Error::NotFound)
}

/// Insert many transactions, returning them in the same order as `builders`.
///
/// Rows are inserted one at a time with a single cached, prepared statement.
/// Callers that need all-or-nothing semantics must run this inside a SQL transaction.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn insert_batch(
    builders: &[TransactionBuilder],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let created_date = OffsetDateTime::now_utc();
    let mut statement = connection.prepare_cached(INSERT_TRANSACTION_SQL)?;
    let mut transactions = Vec::with_capacity(builders.len());

    for builder in builders {
        let tags = tags_to_json(&builder.tags)?;

        let transaction = statement.query_row(
            (
                builder.recurring_id,
                &builder.name,
                &builder.category,
                tags,
                builder.amount,
                builder.transaction_type,
                builder.date,
                created_date,
            ),
            map_transaction_row,
        )?;

        transactions.push(transaction);
    }

    tracing::debug!("inserted {} transactions", transactions.len());

    Ok(transactions)
}

/// Insert imported transactions in a single SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyImport] if `builders` is empty,
/// - [Error::EmptyName] or [Error::InvalidAmount] if any transaction is invalid,
/// - or [Error::SqlError] if there is some SQL error, in which case nothing is imported.
pub fn import_transactions(
    builders: &[TransactionBuilder],
    connection: &mut Connection,
) -> Result<Vec<Transaction>, Error> {
    if builders.is_empty() {
        return Err(Error::EmptyImport);
    }

    for builder in builders {
        builder.validate()?;
    }

    let sql_transaction = connection.transaction()?;
    let transactions = insert_batch(builders, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(transactions)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve all transactions, most recently recorded first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" ORDER BY created_date DESC, id DESC"
        ))?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the transactions dated on or after `from` and before `until`, newest first.
///
/// Pass `None` for `from` to get every transaction before `until`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_in_range(
    from: Option<Date>,
    until: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE (:from IS NULL OR date >= :from) AND date < :until
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            &[(":from", &from as &dyn ToSql), (":until", &until)],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Find up to `limit` distinct transaction names containing `query`, ignoring case.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn search_transaction_names(
    query: &str,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("%{escaped}%");

    connection
        .prepare(
            "SELECT DISTINCT name FROM \"transaction\"
             WHERE name LIKE :pattern ESCAPE '\\'
             ORDER BY name COLLATE NOCASE ASC
             LIMIT :limit",
        )?
        .query_map(
            &[(":pattern", &pattern as &dyn ToSql), (":limit", &limit)],
            |row| row.get(0),
        )?
        .map(|maybe_name| maybe_name.map_err(|error| error.into()))
        .collect()
}

/// Apply `patch` to the transaction `id` and return the updated transaction.
///
/// Only the fields set in `patch` are changed.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    patch: &TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tags = patch.tags.as_deref().map(tags_to_json).transpose()?;
    let mut params = patch_params(patch, &tags);
    params.push((":id", &id));

    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET {PATCH_ASSIGNMENTS}
             WHERE id = :id
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(params.as_slice(), map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

/// Delete the transaction `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recurring_id INTEGER,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            amount REAL NOT NULL CHECK (amount > 0),
            type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
            date TEXT NOT NULL,
            created_date TEXT NOT NULL,
            FOREIGN KEY(recurring_id) REFERENCES recurring_transaction(id)
                ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);
        CREATE INDEX IF NOT EXISTS idx_transaction_recurring_date
            ON \"transaction\"(recurring_id, date);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns in [TRANSACTION_COLUMNS], in that order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let recurring_id = row.get(1)?;
    let name = row.get(2)?;
    let category = row.get(3)?;
    let tags = tags_from_column(row, 4)?;
    let amount = row.get(5)?;
    let transaction_type = row.get(6)?;
    let date = row.get(7)?;
    let created_date = row.get(8)?;

    Ok(Transaction {
        id,
        recurring_id,
        name,
        category,
        tags,
        amount,
        transaction_type,
        date,
        created_date,
    })
}

/// The named parameters for [PATCH_ASSIGNMENTS].
///
/// `tags` must be the JSON encoded tags of `patch`.
pub(crate) fn patch_params<'a>(
    patch: &'a TransactionPatch,
    tags: &'a Option<String>,
) -> Vec<(&'static str, &'a dyn ToSql)> {
    vec![
        (":name", &patch.name),
        (":category", &patch.category),
        (":tags", tags),
        (":amount", &patch.amount),
        (":type", &patch.transaction_type),
        (":date", &patch.date),
        (":unlink", &patch.unlink),
    ]
}

/// Tags are stored as a JSON array of strings.
pub(crate) fn tags_to_json(tags: &[String]) -> Result<String, Error> {
    Ok(serde_json::to_string(tags)?)
}

pub(crate) fn tags_from_column(row: &Row, index: usize) -> Result<Vec<String>, rusqlite::Error> {
    let raw_tags: String = row.get(index)?;

    serde_json::from_str(&raw_tags).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

// ============================================================================
// TESTS
// ============================================================================
