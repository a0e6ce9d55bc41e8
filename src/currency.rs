//! Currencies and how amounts are displayed.
//!
//! Exactly one currency is selected at a time. The selected currency also
//! decides whether its symbol goes to the left or the right of an amount.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::{
    Connection, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error};

/// The currencies available in a new database and where their symbols go.
const DEFAULT_CURRENCIES: [(&str, &str, CurrencyPosition); 30] = [
    ("AED", "AED", CurrencyPosition::Left),
    ("AUD", "A$", CurrencyPosition::Left),
    ("BDT", "৳", CurrencyPosition::Left),
    ("BRL", "R$", CurrencyPosition::Left),
    ("CAD", "C$", CurrencyPosition::Left),
    ("CHF", "Fr", CurrencyPosition::Left),
    ("CNY", "¥", CurrencyPosition::Left),
    ("DKK", "kr.", CurrencyPosition::Right),
    ("EUR", "€", CurrencyPosition::Right),
    ("GBP", "£", CurrencyPosition::Left),
    ("HKD", "HK$", CurrencyPosition::Left),
    ("IDR", "Rp", CurrencyPosition::Left),
    ("ILS", "₪", CurrencyPosition::Left),
    ("INR", "₹", CurrencyPosition::Left),
    ("JPY", "¥", CurrencyPosition::Left),
    ("KRW", "₩", CurrencyPosition::Left),
    ("MAD", "DH", CurrencyPosition::Left),
    ("MXN", "Mex$", CurrencyPosition::Left),
    ("MYR", "RM", CurrencyPosition::Left),
    ("NZD", "NZ$", CurrencyPosition::Left),
    ("PHP", "₱", CurrencyPosition::Left),
    ("PLN", "zł", CurrencyPosition::Right),
    ("RUB", "₽", CurrencyPosition::Left),
    ("SEK", "kr", CurrencyPosition::Right),
    ("SGD", "S$", CurrencyPosition::Left),
    ("THB", "฿", CurrencyPosition::Left),
    ("TRY", "₺", CurrencyPosition::Left),
    ("USD", "$", CurrencyPosition::Left),
    ("VND", "₫", CurrencyPosition::Right),
    ("ZAR", "R", CurrencyPosition::Left),
];

const DEFAULT_SELECTED_CURRENCY: &str = "EUR";

/// Which side of an amount the currency symbol is shown on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyPosition {
    /// e.g. €10
    #[default]
    Left,
    /// e.g. 10€
    Right,
}

impl CurrencyPosition {
    fn as_str(&self) -> &'static str {
        match self {
            CurrencyPosition::Left => "left",
            CurrencyPosition::Right => "right",
        }
    }
}

impl FromStr for CurrencyPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(CurrencyPosition::Left),
            "right" => Ok(CurrencyPosition::Right),
            other => Err(Error::InvalidCurrencyPosition(other.to_owned())),
        }
    }
}

impl Display for CurrencyPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for CurrencyPosition {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CurrencyPosition {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A currency name and its symbol, e.g. "EUR" and "€".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// The ISO 4217 code.
    pub name: String,
    /// The symbol shown next to amounts.
    pub symbol: String,
}

/// Every currency plus the current display choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// All currencies, ordered by name.
    pub currencies: Vec<Currency>,
    /// The name of the selected currency.
    pub selected: String,
    /// Where the selected currency's symbol is shown.
    pub position: CurrencyPosition,
}

/// Get all currencies along with the selected currency and its position.
pub fn get_currency_settings(connection: &Connection) -> Result<CurrencySettings, Error> {
    let currencies = connection
        .prepare("SELECT name, symbol FROM currency ORDER BY name ASC")?
        .query_map([], |row| {
            Ok(Currency {
                name: row.get(0)?,
                symbol: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let (selected, position): (String, CurrencyPosition) = connection.query_row(
        "SELECT name, position FROM currency WHERE selected = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(CurrencySettings {
        currencies,
        selected,
        position,
    })
}

/// Make `name` the only selected currency.
///
/// # Errors
/// Returns [Error::UpdateMissingCurrency] if there is no currency called `name`,
/// in which case the previous selection is kept.
pub fn select_currency(name: &str, connection: &mut Connection) -> Result<(), Error> {
    let sql_transaction = connection.transaction()?;

    sql_transaction.execute("UPDATE currency SET selected = 0 WHERE selected = 1", [])?;
    let rows_affected =
        sql_transaction.execute("UPDATE currency SET selected = 1 WHERE name = ?1", [name])?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCurrency);
    }

    sql_transaction.commit()?;

    Ok(())
}

/// Set the symbol position of the selected currency.
pub fn set_currency_position(
    position: CurrencyPosition,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE currency SET position = ?1 WHERE selected = 1",
        [position],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCurrency);
    }

    Ok(())
}

/// Create the currency table.
pub fn create_currency_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS currency (
            name TEXT PRIMARY KEY NOT NULL,
            symbol TEXT NOT NULL,
            position TEXT NOT NULL DEFAULT 'left' CHECK (position IN ('left', 'right')),
            selected INTEGER NOT NULL DEFAULT 0 CHECK (selected IN (0, 1))
        );",
    )
}

/// Add the missing default currencies and select the euro if nothing is selected.
pub fn seed_default_currencies(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO currency (name, symbol, position) VALUES (?1, ?2, ?3)",
    )?;

    for (name, symbol, position) in DEFAULT_CURRENCIES {
        statement.execute((name, symbol, position))?;
    }

    connection.execute(
        "UPDATE currency SET selected = 1
         WHERE name = ?1 AND NOT EXISTS (SELECT 1 FROM currency WHERE selected = 1)",
        [DEFAULT_SELECTED_CURRENCY],
    )?;

    Ok(())
}

/// The state needed by the currency endpoints.
#[derive(Debug, Clone)]
pub struct CurrencyState {
    /// The database connection for reading and changing currencies.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CurrencyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the currency settings.
pub async fn get_currency_endpoint(
    State(state): State<CurrencyState>,
) -> Result<Json<CurrencySettings>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_currency_settings(&connection).map(Json)
}

/// Select a currency and return the updated settings.
pub async fn select_currency_endpoint(
    State(state): State<CurrencyState>,
    Path(currency_name): Path<String>,
) -> Result<Json<CurrencySettings>, Error> {
    let mut connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    select_currency(&currency_name, &mut connection)?;

    get_currency_settings(&connection).map(Json)
}

/// Set the symbol position and return the updated settings.
pub async fn set_currency_position_endpoint(
    State(state): State<CurrencyState>,
    Path(position): Path<String>,
) -> Result<Json<CurrencySettings>, Error> {
    let position: CurrencyPosition = position.parse()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    set_currency_position(position, &connection)?;

    get_currency_settings(&connection).map(Json)
}
