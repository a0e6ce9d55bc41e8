//! Database operations for recurring transactions.

use rusqlite::{Connection, Row, ToSql};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::RecurringId,
    recurring::{NewRecurringTransaction, RecurringPatch, RecurringTransaction},
    transaction::{tags_from_column, tags_to_json},
};

const RECURRING_COLUMNS: &str =
    "id, name, category, tags, amount, type, start_date, end_date, frequency, created_date";

/// Insert a recurring transaction, without generating its transactions.
///
/// `new` is not validated, see [NewRecurringTransaction::validate].
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn insert_recurring_transaction(
    new: &NewRecurringTransaction,
    created_date: OffsetDateTime,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let tags = tags_to_json(&new.tags)?;

    let recurring_transaction = connection
        .prepare(&format!(
            "INSERT INTO recurring_transaction
                (name, category, tags, amount, type, start_date, end_date, frequency, created_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row(
            (
                &new.name,
                &new.category,
                tags,
                new.amount,
                new.transaction_type,
                new.start_date,
                new.end_date,
                new.frequency,
                created_date,
            ),
            map_recurring_row,
        )?;

    Ok(recurring_transaction)
}

/// Retrieve a recurring transaction by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a recurring transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_recurring_transaction(
    id: RecurringId,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_recurring_row)
        .map_err(|error| error.into())
}

/// Retrieve every recurring transaction, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_all_recurring_transactions(
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction
             ORDER BY created_date DESC, id DESC"
        ))?
        .query_map([], map_recurring_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(|error| error.into()))
        .collect()
}

/// Apply `patch` to the stored recurring transaction `id`, without touching its transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRecurringTransaction] if `id` does not refer to a recurring transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_recurring_transaction(
    id: RecurringId,
    patch: &RecurringPatch,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let tags = patch.tags.as_deref().map(tags_to_json).transpose()?;
    let params: [(&str, &dyn ToSql); 9] = [
        (":id", &id),
        (":name", &patch.name),
        (":category", &patch.category),
        (":tags", &tags),
        (":amount", &patch.amount),
        (":type", &patch.transaction_type),
        (":start_date", &patch.start_date),
        (":end_date", &patch.end_date),
        (":frequency", &patch.frequency),
    ];

    connection
        .prepare(&format!(
            "UPDATE recurring_transaction SET
                name = COALESCE(:name, name),
                category = COALESCE(:category, category),
                tags = COALESCE(:tags, tags),
                amount = COALESCE(:amount, amount),
                type = COALESCE(:type, type),
                start_date = COALESCE(:start_date, start_date),
                end_date = COALESCE(:end_date, end_date),
                frequency = COALESCE(:frequency, frequency)
             WHERE id = :id
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row(&params, map_recurring_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingRecurringTransaction,
            error => error.into(),
        })
}

/// Delete the recurring transaction `id`, without touching its transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRecurringTransaction] if `id` does not refer to a recurring transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_recurring_transaction(id: RecurringId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM recurring_transaction WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecurringTransaction);
    }

    Ok(())
}

/// Create the recurring transaction table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            amount REAL NOT NULL CHECK (amount > 0),
            type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            frequency TEXT NOT NULL CHECK (frequency IN ('daily', 'weekly', 'monthly', 'yearly')),
            created_date TEXT NOT NULL,
            CHECK (end_date > start_date)
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_transaction_created_date
            ON recurring_transaction(created_date);",
    )?;

    Ok(())
}

fn map_recurring_row(row: &Row) -> Result<RecurringTransaction, rusqlite::Error> {
    Ok(RecurringTransaction {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        tags: tags_from_column(row, 3)?,
        amount: row.get(4)?,
        transaction_type: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        frequency: row.get(8)?,
        created_date: row.get(9)?,
    })
}

#[cfg(test)]
mod recurring_query_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        Error,
        db::initialize,
        recurring::{Frequency, NewRecurringTransaction, RecurringPatch},
        transaction::TransactionType,
    };

    use super::{
        delete_recurring_transaction, get_all_recurring_transactions, get_recurring_transaction,
        insert_recurring_transaction, update_recurring_transaction,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_rent() -> NewRecurringTransaction {
        NewRecurringTransaction {
            name: "Rent".to_owned(),
            category: "Rent".to_owned(),
            tags: vec!["home".to_owned()],
            amount: 100.0,
            transaction_type: TransactionType::Expense,
            start_date: date!(2024 - 01 - 01),
            end_date: date!(2024 - 03 - 01),
            frequency: Frequency::Monthly,
        }
    }

    #[test]
    fn insert_then_get() {
        let conn = get_test_connection();

        let inserted = insert_recurring_transaction(&new_rent(), OffsetDateTime::now_utc(), &conn)
            .expect("Could not insert recurring transaction");
        let got = get_recurring_transaction(inserted.id, &conn);

        assert!(inserted.id > 0);
        assert_eq!(inserted.tags, vec!["home".to_owned()]);
        assert_eq!(inserted.frequency, Frequency::Monthly);
        assert_eq!(got, Ok(inserted));
    }

    #[test]
    fn get_missing_returns_not_found() {
        let conn = get_test_connection();

        assert_eq!(get_recurring_transaction(1, &conn), Err(Error::NotFound));
    }

    #[test]
    fn get_all_returns_newest_first() {
        let conn = get_test_connection();
        let now = OffsetDateTime::now_utc();
        let older = insert_recurring_transaction(&new_rent(), now - Duration::days(1), &conn).unwrap();
        let newer = insert_recurring_transaction(&new_rent(), now, &conn).unwrap();

        let got = get_all_recurring_transactions(&conn).unwrap();

        assert_eq!(got, vec![newer, older]);
    }

    #[test]
    fn update_only_changes_given_fields() {
        let conn = get_test_connection();
        let inserted =
            insert_recurring_transaction(&new_rent(), OffsetDateTime::now_utc(), &conn).unwrap();

        let updated = update_recurring_transaction(
            inserted.id,
            &RecurringPatch {
                amount: Some(200.0),
                end_date: Some(date!(2024 - 06 - 01)),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, 200.0);
        assert_eq!(updated.end_date, date!(2024 - 06 - 01));
        assert_eq!(updated.name, inserted.name);
        assert_eq!(updated.tags, inserted.tags);
        assert_eq!(updated.start_date, inserted.start_date);
        assert_eq!(updated.created_date, inserted.created_date);
    }

    #[test]
    fn update_missing_returns_error() {
        let conn = get_test_connection();

        let result = update_recurring_transaction(9, &RecurringPatch::default(), &conn);

        assert_eq!(result, Err(Error::UpdateMissingRecurringTransaction));
    }

    #[test]
    fn delete_removes_row() {
        let conn = get_test_connection();
        let inserted =
            insert_recurring_transaction(&new_rent(), OffsetDateTime::now_utc(), &conn).unwrap();

        assert_eq!(delete_recurring_transaction(inserted.id, &conn), Ok(()));
        assert_eq!(get_recurring_transaction(inserted.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_returns_error() {
        let conn = get_test_connection();

        assert_eq!(
            delete_recurring_transaction(9, &conn),
            Err(Error::DeleteMissingRecurringTransaction)
        );
    }
}
