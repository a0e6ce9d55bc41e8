//! App configuration stored as key/value rows, plus the service info endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Value, json};

use crate::{AppState, Error};

const LANGUAGE_KEY: &str = "LANGUAGE";
const DEFAULT_LANGUAGE: &str = "en";

/// Get the user interface language, e.g. "en".
pub fn get_language(connection: &Connection) -> Result<String, Error> {
    connection
        .query_row(
            "SELECT value FROM app_config WHERE key = ?1",
            [LANGUAGE_KEY],
            |row| row.get(0),
        )
        .optional()
        .map(|language| language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()))
        .map_err(|error| error.into())
}

/// Set the user interface language.
///
/// # Errors
/// Returns [Error::InvalidLanguage] if `language` is not a two letter, lowercase code.
pub fn set_language(language: &str, connection: &Connection) -> Result<(), Error> {
    let is_valid =
        language.len() == 2 && language.bytes().all(|byte| byte.is_ascii_lowercase());

    if !is_valid {
        return Err(Error::InvalidLanguage(language.to_owned()));
    }

    connection.execute(
        "INSERT INTO app_config (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [LANGUAGE_KEY, language],
    )?;

    Ok(())
}

/// Create the app configuration table.
pub fn create_app_config_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS app_config (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );",
    )
}

/// Insert the default configuration values that are missing.
pub fn seed_default_config(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "INSERT OR IGNORE INTO app_config (key, value) VALUES (?1, ?2)",
        [LANGUAGE_KEY, DEFAULT_LANGUAGE],
    )?;

    Ok(())
}

/// The state needed by the settings endpoints.
#[derive(Debug, Clone)]
pub struct SettingsState {
    /// The database connection holding the app configuration.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Greet API clients.
pub async fn get_welcome_endpoint() -> Json<Value> {
    Json(json!({ "message": "Welcome to Wally API!" }))
}

/// Report that the server is up.
pub async fn get_health_endpoint() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Wally API is running!" }))
}

/// Report the server version.
pub async fn get_version_endpoint() -> Json<Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// Get the user interface language.
pub async fn get_language_endpoint(
    State(state): State<SettingsState>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let language = get_language(&connection)?;

    Ok(Json(json!({ "language": language })))
}

/// Change the user interface language.
pub async fn set_language_endpoint(
    State(state): State<SettingsState>,
    Path(language): Path<String>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    set_language(&language, &connection)?;

    Ok(Json(json!({ "message": "Language updated" })))
}
