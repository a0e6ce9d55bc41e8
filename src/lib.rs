//! Wally is a personal finance bookkeeping API.
//!
//! This library provides a JSON REST API for recording transactions,
//! recurring transactions, categories, tags, currencies and app settings.
//! Recurring transactions are expanded into concrete, dated transactions when
//! they are created and kept in sync when they are edited or removed.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod app_state;
mod calendar;
mod category;
mod currency;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod recurring;
mod routing;
mod settings;
mod tag;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use database_id::{DatabaseId, RecurringId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use recurring::{
    ApplyTo, Frequency, NewRecurringTransaction, Occurrences, RecurringPatch,
    RecurringTransaction, SyncSummary, occurrences, on_template_created, on_template_deleted, on_template_updated,
};
pub use routing::build_router;
pub use timezone::{get_local_offset, get_local_today};
pub use transaction::{Transaction, TransactionType};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction or recurring transaction was given an amount that is
    /// zero, negative or not a finite number.
    #[error("amount must be positive, got {0}")]
    InvalidAmount(f64),

    /// The end date of a recurring transaction is on or before its start date.
    #[error("end date {end_date} must be after start date {start_date}")]
    InvalidDateRange {
        /// The first date of the recurring transaction.
        start_date: Date,
        /// The last possible date of the recurring transaction.
        end_date: Date,
    },

    /// The end date of a recurring transaction is more than 100 years after
    /// its start date.
    #[error("end date {end_date} cannot be more than 100 years after start date {start_date}")]
    DateRangeTooLong {
        /// The first date of the recurring transaction.
        start_date: Date,
        /// The last possible date of the recurring transaction.
        end_date: Date,
    },

    /// The frequency string did not match one of the supported frequencies.
    #[error("\"{0}\" is not a valid frequency, expected one of daily, weekly, monthly or yearly")]
    InvalidFrequency(String),

    /// The policy for editing or deleting a recurring transaction was neither
    /// "future" nor "all".
    #[error("\"{0}\" is not a valid apply_to value, expected future or all")]
    InvalidApplyTo(String),

    /// The transaction type string was neither "expense" nor "income".
    #[error("\"{0}\" is not a valid transaction type, expected expense or income")]
    InvalidTransactionType(String),

    /// An empty string was used for a name (transaction, category, tag).
    #[error("name cannot be empty")]
    EmptyName,

    /// A year and month pair that does not refer to a calendar month.
    #[error("{year}-{month} is not a valid month")]
    InvalidMonth {
        /// The requested year.
        year: i32,
        /// The requested month, counting from 1.
        month: u8,
    },

    /// The currency symbol position was neither "left" nor "right".
    #[error("\"{0}\" is not a valid currency position, expected left or right")]
    InvalidCurrencyPosition(String),

    /// The language code was not a two letter, lowercase code.
    #[error("\"{0}\" is not a valid language code")]
    InvalidLanguage(String),

    /// An import request did not contain any transactions.
    #[error("no transactions to import")]
    EmptyImport,

    /// The category name already exists in the database.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategory(String),

    /// The tag name already exists in the database.
    #[error("the tag \"{0}\" already exists")]
    DuplicateTag(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a recurring transaction that does not exist
    #[error("tried to update a recurring transaction that is not in the database")]
    UpdateMissingRecurringTransaction,

    /// Tried to delete a recurring transaction that does not exist
    #[error("tried to delete a recurring transaction that is not in the database")]
    DeleteMissingRecurringTransaction,

    /// Tried to rename a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to rename a tag that does not exist
    #[error("tried to update a tag that is not in the database")]
    UpdateMissingTag,

    /// Tried to delete a tag that does not exist
    #[error("tried to delete a tag that is not in the database")]
    DeleteMissingTag,

    /// Tried to select a currency that does not exist
    #[error("tried to select a currency that is not in the database")]
    UpdateMissingCurrency,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing or deserializing JSON stored in the database.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidAmount(_)
            | Error::InvalidDateRange { .. }
            | Error::DateRangeTooLong { .. }
            | Error::InvalidFrequency(_)
            | Error::InvalidApplyTo(_)
            | Error::InvalidTransactionType(_)
            | Error::EmptyName
            | Error::InvalidMonth { .. }
            | Error::InvalidCurrencyPosition(_)
            | Error::InvalidLanguage(_)
            | Error::EmptyImport
            | Error::DuplicateCategory(_)
            | Error::DuplicateTag(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingRecurringTransaction
            | Error::DeleteMissingRecurringTransaction
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::UpdateMissingTag
            | Error::DeleteMissingTag
            | Error::UpdateMissingCurrency => StatusCode::NOT_FOUND,
            Error::SqlError(_)
            | Error::JSONSerializationError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use time::macros::date;

    use crate::Error;

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = Error::InvalidDateRange {
            start_date: date!(2024 - 03 - 01),
            end_date: date!(2024 - 01 - 01),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_resources_are_not_found() {
        let response = Error::DeleteMissingRecurringTransaction.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn sql_errors_are_internal_server_errors() {
        let response = Error::SqlError(rusqlite::Error::InvalidQuery).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
