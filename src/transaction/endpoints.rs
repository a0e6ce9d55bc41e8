//! JSON endpoints for listing, creating, editing and deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    timezone::get_local_today,
    transaction::{
        Transaction, TransactionBuilder, TransactionPatch, TransactionType,
        core::{
            DEFAULT_CATEGORY, create_transaction, delete_transaction, get_all_transactions,
            get_transaction, get_transactions_in_range, import_transactions,
            search_transaction_names, update_transaction,
        },
        range::MonthRange,
    },
};

/// The maximum number of names returned by the name search.
const NAME_SEARCH_LIMIT: u32 = 10;

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
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
    pub date: Option<Date>,
}

impl TransactionForm {
    fn into_builder(self, today: Date) -> Result<TransactionBuilder, Error> {
        let transaction_type = parse_transaction_type(self.transaction_type.as_deref())?
            .unwrap_or_default();
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);

        let builder = Transaction::build(
            self.amount,
            self.date.unwrap_or(today),
            self.name.trim(),
        )
        .category(category)
        .tags(self.tags)
        .transaction_type(transaction_type);

        builder.validate()?;

        Ok(builder)
    }
}

/// The request body for editing a transaction, only the given fields are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionUpdateForm {
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
    /// The new date.
    pub date: Option<Date>,
}

impl TryFrom<TransactionUpdateForm> for TransactionPatch {
    type Error = Error;

    fn try_from(form: TransactionUpdateForm) -> Result<Self, Self::Error> {
        let patch = TransactionPatch {
            transaction_type: parse_transaction_type(form.transaction_type.as_deref())?,
            name: form.name.map(|name| name.trim().to_owned()),
            category: form.category,
            tags: form.tags,
            amount: form.amount,
            date: form.date,
            unlink: false,
        };

        patch.validate()?;

        Ok(patch)
    }
}

pub(crate) fn parse_transaction_type(
    raw_type: Option<&str>,
) -> Result<Option<TransactionType>, Error> {
    raw_type.map(str::parse).transpose()
}

/// The query string for the name search.
#[derive(Debug, Deserialize)]
pub struct NameSearchQuery {
    /// The text the names should contain.
    #[serde(default)]
    pub q: String,
}

/// List every transaction, most recently created first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_transactions(&connection).map(Json)
}

/// Get a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(transaction_id, &connection).map(Json)
}

/// List the transactions in one calendar month.
pub async fn get_transactions_by_month_endpoint(
    State(state): State<TransactionState>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let range = MonthRange::month(year, month)?;
    list_range(&state, range)
}

/// List the transactions in an inclusive range of calendar months.
pub async fn get_transactions_by_range_endpoint(
    State(state): State<TransactionState>,
    Path((from_year, from_month, to_year, to_month)): Path<(i32, u8, i32, u8)>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let range = MonthRange::months(from_year, from_month, to_year, to_month)?;
    list_range(&state, range)
}

/// List the transactions of the current month and the months before it.
pub async fn get_transactions_past_months_endpoint(
    State(state): State<TransactionState>,
    Path(months): Path<u32>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    list_range(&state, MonthRange::past_months(today, months)?)
}

/// List the transactions from the start of the year to the end of the current month.
pub async fn get_transactions_year_to_date_endpoint(
    State(state): State<TransactionState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    list_range(&state, MonthRange::year_to_date(today)?)
}

/// List every transaction up to the end of the current month.
pub async fn get_transactions_to_date_endpoint(
    State(state): State<TransactionState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    list_range(&state, MonthRange::to_date(today)?)
}

fn list_range(
    state: &TransactionState,
    range: MonthRange,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions_in_range(range.from, range.until, &connection).map(Json)
}

/// Suggest existing transaction names that contain the query text.
pub async fn search_transaction_names_endpoint(
    State(state): State<TransactionState>,
    Query(query): Query<NameSearchQuery>,
) -> Result<Json<Vec<String>>, Error> {
    let query = query.q.trim();

    if query.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    search_transaction_names(query, NAME_SEARCH_LIMIT, &connection).map(Json)
}

/// Create a transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Json(form): Json<TransactionForm>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let builder = form.into_builder(today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let transaction = create_transaction(builder, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

/// Import many transactions at once, either all of them are created or none are.
pub async fn import_transactions_endpoint(
    State(state): State<TransactionState>,
    Json(forms): Json<Vec<TransactionForm>>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let builders = forms
        .into_iter()
        .map(|form| form.into_builder(today))
        .collect::<Result<Vec<_>, _>>()?;

    let mut connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let transactions = import_transactions(&builders, &mut connection)?;
    tracing::info!("imported {} transactions", transactions.len());

    Ok((StatusCode::CREATED, Json(transactions)).into_response())
}

/// Change the given fields of a transaction.
///
/// Editing a transaction generated by a recurring transaction keeps it linked.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<TransactionUpdateForm>,
) -> Result<Json<Transaction>, Error> {
    let patch = TransactionPatch::try_from(form)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_transaction(transaction_id, &patch, &connection).map(Json)
}

/// Delete a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, &connection)?;

    Ok(Json(json!({ "ok": true })).into_response())
}

#[cfg(test)]
mod transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{
        TransactionForm, TransactionState, TransactionUpdateForm, get_transaction_endpoint,
        update_transaction_endpoint,
    };

    fn get_test_state() -> TransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        TransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn form(amount: f64) -> TransactionForm {
        TransactionForm {
            name: "  Groceries  ".to_owned(),
            category: None,
            tags: vec![],
            amount,
            transaction_type: None,
            date: Some(date!(2025 - 01 - 10)),
        }
    }

    #[test]
    fn form_applies_defaults() {
        let builder = form(10.0).into_builder(date!(2025 - 02 - 01)).unwrap();

        assert_eq!(builder.name, "Groceries");
        assert_eq!(builder.category, "Miscellaneous");
        assert_eq!(builder.transaction_type, TransactionType::Expense);
        assert_eq!(builder.date, date!(2025 - 01 - 10));
    }

    #[test]
    fn form_without_date_uses_today() {
        let mut form = form(10.0);
        form.date = None;

        let builder = form.into_builder(date!(2025 - 02 - 01)).unwrap();

        assert_eq!(builder.date, date!(2025 - 02 - 01));
    }

    #[test]
    fn form_rejects_non_positive_amount() {
        assert_eq!(
            form(0.0).into_builder(date!(2025 - 02 - 01)),
            Err(Error::InvalidAmount(0.0))
        );
    }

    #[test]
    fn form_rejects_unknown_type() {
        let mut form = form(1.0);
        form.transaction_type = Some("gift".to_owned());

        assert_eq!(
            form.into_builder(date!(2025 - 02 - 01)),
            Err(Error::InvalidTransactionType("gift".to_owned()))
        );
    }

    #[tokio::test]
    async fn get_missing_transaction_is_not_found() {
        let state = get_test_state();

        let result = get_transaction_endpoint(State(state), Path(42)).await;

        assert_eq!(result.map(|Json(transaction)| transaction), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn update_keeps_link_to_recurring_transaction() {
        let state = get_test_state();
        let transaction = {
            let conn = state.db_connection.lock().unwrap();
            conn.execute(
                "INSERT INTO recurring_transaction
                    (id, name, category, tags, amount, type, start_date, end_date, frequency, created_date)
                 VALUES (7, 'Rent', 'Rent', '[]', 100.0, 'expense', '2024-01-01', '2024-03-01', 'monthly', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
            create_transaction(
                Transaction::build(100.0, date!(2024 - 01 - 01), "Rent").recurring_id(Some(7)),
                &conn,
            )
            .unwrap()
        };

        let Json(updated) = update_transaction_endpoint(
            State(state),
            Path(transaction.id),
            Json(TransactionUpdateForm {
                amount: Some(120.0),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.amount, 120.0);
        assert_eq!(updated.recurring_id, Some(7));
    }

    #[tokio::test]
    async fn update_rejects_empty_name_before_touching_the_database() {
        let state = get_test_state();

        let result = update_transaction_endpoint(
            State(state),
            Path(1),
            Json(TransactionUpdateForm {
                name: Some("   ".to_owned()),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(result.map(|Json(transaction)| transaction), Err(Error::EmptyName));
    }
}
