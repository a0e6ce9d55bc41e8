//! JSON endpoints for recurring transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    database_id::RecurringId,
    recurring::{
        ApplyTo, Frequency, NewRecurringTransaction, RecurringPatch, RecurringTransaction,
        db::{get_all_recurring_transactions, get_recurring_transaction},
        on_template_created, on_template_deleted, on_template_updated,
    },
    timezone::get_local_today,
    transaction::{
        DEFAULT_CATEGORY, DateFilter, Transaction, parse_transaction_type, select_by_recurring_id,
    },
};

/// The state needed by the recurring transaction endpoints.
#[derive(Debug, Clone)]
pub struct RecurringState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Decides which generated transactions are in the future.
    pub local_timezone: String,
    /// The database connection for managing recurring transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a recurring transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringForm {
    /// A short description of the transaction.
    pub name: String,
    /// Defaults to "Miscellaneous".
    pub category: Option<String>,
    /// Defaults to no tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Must be greater than zero.
    pub amount: f64,
    /// "expense" or "income", defaults to "expense".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Defaults to today.
    #[serde(alias = "startDate")]
    pub start_date: Option<Date>,
    /// Must be after the start date and at most 100 years after it.
    #[serde(alias = "endDate")]
    pub end_date: Date,
    /// "daily", "weekly", "monthly" or "yearly", defaults to "daily".
    pub frequency: Option<String>,
}

impl RecurringForm {
    fn into_new(self, today: Date) -> Result<NewRecurringTransaction, Error> {
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_owned();

        Ok(NewRecurringTransaction {
            name: self.name.trim().to_owned(),
            category,
            tags: self.tags,
            amount: self.amount,
            transaction_type: parse_transaction_type(self.transaction_type.as_deref())?
                .unwrap_or_default(),
            start_date: self.start_date.unwrap_or(today),
            end_date: self.end_date,
            frequency: parse_frequency(self.frequency.as_deref())?.unwrap_or_default(),
        })
    }
}

/// The request body for editing a recurring transaction.
///
/// Only the given fields are changed, `apply_to` decides which of the
/// generated transactions are regenerated and defaults to "future".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecurringUpdateForm {
    /// The new name.
    pub name: Option<String>,
    /// The new category.
    pub category: Option<String>,
    /// The new tags.
    pub tags: Option<Vec<String>>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new type, "expense" or "income".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The new start date.
    #[serde(alias = "startDate")]
    pub start_date: Option<Date>,
    /// The new end date.
    #[serde(alias = "endDate")]
    pub end_date: Option<Date>,
    /// The new frequency.
    pub frequency: Option<String>,
    /// "future" or "all".
    #[serde(alias = "applyTo")]
    pub apply_to: Option<String>,
}

impl RecurringUpdateForm {
    fn into_patch(self) -> Result<(RecurringPatch, ApplyTo), Error> {
        let patch = RecurringPatch {
            name: self.name.map(|name| name.trim().to_owned()),
            category: self.category,
            tags: self.tags,
            amount: self.amount,
            transaction_type: parse_transaction_type(self.transaction_type.as_deref())?,
            start_date: self.start_date,
            end_date: self.end_date,
            frequency: parse_frequency(self.frequency.as_deref())?,
        };

        Ok((patch, parse_apply_to(self.apply_to.as_deref())?))
    }
}

/// The optional request body for deleting a recurring transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecurringDeleteForm {
    /// "future" or "all", defaults to "future".
    #[serde(alias = "applyTo")]
    pub apply_to: Option<String>,
}

fn parse_frequency(raw_frequency: Option<&str>) -> Result<Option<Frequency>, Error> {
    raw_frequency.map(str::parse).transpose()
}

fn parse_apply_to(raw_apply_to: Option<&str>) -> Result<ApplyTo, Error> {
    Ok(raw_apply_to
        .map(str::parse::<ApplyTo>)
        .transpose()?
        .unwrap_or_default())
}

/// List every recurring transaction, newest first.
pub async fn list_recurring_transactions_endpoint(
    State(state): State<RecurringState>,
) -> Result<Json<Vec<RecurringTransaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_recurring_transactions(&connection).map(Json)
}

/// Get a single recurring transaction.
pub async fn get_recurring_transaction_endpoint(
    State(state): State<RecurringState>,
    Path(recurring_id): Path<RecurringId>,
) -> Result<Json<RecurringTransaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_recurring_transaction(recurring_id, &connection).map(Json)
}

/// List the transactions generated by a recurring transaction, in date order.
pub async fn get_recurring_occurrences_endpoint(
    State(state): State<RecurringState>,
    Path(recurring_id): Path<RecurringId>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_recurring_transaction(recurring_id, &connection)?;

    select_by_recurring_id(recurring_id, DateFilter::All, &connection).map(Json)
}

/// Create a recurring transaction along with all of its transactions.
pub async fn create_recurring_transaction_endpoint(
    State(state): State<RecurringState>,
    Json(form): Json<RecurringForm>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let new = form.into_new(today)?;

    let mut connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (recurring_transaction, _) = on_template_created(&new, &mut connection)?;

    Ok((StatusCode::CREATED, Json(recurring_transaction)).into_response())
}

/// Edit a recurring transaction and regenerate the affected transactions.
pub async fn update_recurring_transaction_endpoint(
    State(state): State<RecurringState>,
    Path(recurring_id): Path<RecurringId>,
    Json(form): Json<RecurringUpdateForm>,
) -> Result<Json<RecurringTransaction>, Error> {
    let (patch, apply_to) = form.into_patch()?;
    let today = get_local_today(&state.local_timezone)?;

    let mut connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (recurring_transaction, _) =
        on_template_updated(recurring_id, &patch, apply_to, today, &mut connection)?;

    Ok(Json(recurring_transaction))
}

/// Delete a recurring transaction and the affected transactions.
///
/// Without a request body, only transactions after today are deleted.
pub async fn delete_recurring_transaction_endpoint(
    State(state): State<RecurringState>,
    Path(recurring_id): Path<RecurringId>,
    form: Option<Json<RecurringDeleteForm>>,
) -> Result<Response, Error> {
    let Json(form) = form.unwrap_or_default();
    let apply_to = parse_apply_to(form.apply_to.as_deref())?;
    let today = get_local_today(&state.local_timezone)?;

    let mut connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = on_template_deleted(recurring_id, apply_to, today, &mut connection)?;

    Ok(Json(json!({
        "ok": true,
        "deleted": summary.deleted,
        "unlinked": summary.unlinked,
    }))
    .into_response())
}
