//! Sets up the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    category::{create_category_table, seed_default_categories},
    currency::{create_currency_table, seed_default_currencies},
    recurring::create_recurring_transaction_table,
    settings::{create_app_config_table, seed_default_config},
    tag::create_tag_table,
    transaction::create_transaction_table,
};

/// Create the tables for the domain models and insert the default rows.
///
/// Safe to call on an existing database, tables and default rows that
/// already exist are left untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables cannot be created or seeded.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside of a transaction, SQLite ignores it otherwise.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_app_config_table(&transaction)?;
    create_category_table(&transaction)?;
    create_tag_table(&transaction)?;
    create_currency_table(&transaction)?;
    create_recurring_transaction_table(&transaction)?;
    create_transaction_table(&transaction)?;

    seed_default_config(&transaction)?;
    seed_default_categories(&transaction)?;
    seed_default_currencies(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn can_initialize_twice() {
        let conn = Connection::open_in_memory().unwrap();

        assert_eq!(initialize(&conn), Ok(()));
        assert_eq!(initialize(&conn), Ok(()));
    }

    #[test]
    fn enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let foreign_keys: bool = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert!(foreign_keys);
    }

    #[test]
    fn seeding_twice_does_not_duplicate_rows() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let count_categories = || -> u32 {
            conn.query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))
                .unwrap()
        };
        let before = count_categories();

        initialize(&conn).unwrap();

        assert_eq!(count_categories(), before);
        assert!(before > 0);
    }
}
