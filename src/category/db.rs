//! Database operations for categories.

use rusqlite::Connection;

use crate::{
    Error,
    category::{CategoryName, DEFAULT_CATEGORIES},
};

/// Create a category.
///
/// # Errors
/// Returns [Error::DuplicateCategory] if the category already exists.
pub fn create_category(name: CategoryName, connection: &Connection) -> Result<CategoryName, Error> {
    let rows_affected = connection.execute(
        "INSERT INTO category (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        [name.as_ref()],
    )?;

    if rows_affected == 0 {
        return Err(Error::DuplicateCategory(name.to_string()));
    }

    Ok(name)
}

/// Retrieve all category names ordered alphabetically, ignoring case.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<CategoryName>, Error> {
    connection
        .prepare("SELECT name FROM category ORDER BY name COLLATE NOCASE ASC")?
        .query_map([], |row| {
            let name: String = row.get(0)?;
            Ok(CategoryName::new_unchecked(&name))
        })?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename a category along with every transaction and recurring transaction
/// in that category.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingCategory] if `old_name` is not a category,
/// - [Error::DuplicateCategory] if `new_name` is already a category,
/// - or [Error::SqlError] if there is some other SQL error, in which case nothing is renamed.
pub fn rename_category(
    old_name: &CategoryName,
    new_name: CategoryName,
    connection: &mut Connection,
) -> Result<CategoryName, Error> {
    let sql_transaction = connection.transaction()?;

    if old_name != &new_name {
        let is_taken: bool = sql_transaction.query_row(
            "SELECT EXISTS (SELECT 1 FROM category WHERE name = ?1)",
            [new_name.as_ref()],
            |row| row.get(0),
        )?;

        if is_taken {
            return Err(Error::DuplicateCategory(new_name.to_string()));
        }
    }

    let rows_affected = sql_transaction.execute(
        "UPDATE category SET name = ?1 WHERE name = ?2",
        [new_name.as_ref(), old_name.as_ref()],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    let transactions = sql_transaction.execute(
        "UPDATE \"transaction\" SET category = ?1 WHERE category = ?2",
        [new_name.as_ref(), old_name.as_ref()],
    )?;
    let templates = sql_transaction.execute(
        "UPDATE recurring_transaction SET category = ?1 WHERE category = ?2",
        [new_name.as_ref(), old_name.as_ref()],
    )?;

    sql_transaction.commit()?;

    tracing::debug!(
        "renamed category {old_name} to {new_name} in {transactions} transactions and {templates} recurring transactions"
    );

    Ok(new_name)
}

/// Delete a category.
///
/// Transactions in the category keep its name.
///
/// # Errors
/// Returns [Error::DeleteMissingCategory] if the category does not exist.
pub fn delete_category(name: &CategoryName, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM category WHERE name = ?1", [name.as_ref()])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Create the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            name TEXT PRIMARY KEY NOT NULL
        );",
    )
}

/// Add the default categories that are missing.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare("INSERT OR IGNORE INTO category (name) VALUES (?1)")?;

    for name in DEFAULT_CATEGORIES {
        statement.execute([name])?;
    }

    Ok(())
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, DEFAULT_CATEGORIES},
        db::initialize,
        transaction::{Transaction, create_transaction, get_transaction},
    };

    use super::{create_category, delete_category, get_all_categories, rename_category};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn name(name: &str) -> CategoryName {
        CategoryName::new(name).unwrap()
    }

    #[test]
    fn defaults_are_seeded() {
        let connection = get_test_connection();

        let names: Vec<String> = get_all_categories(&connection)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(names, DEFAULT_CATEGORIES.to_vec());
    }

    #[test]
    fn create_then_list_ignores_case() {
        let connection = get_test_connection();

        create_category(name("books"), &connection).unwrap();

        let names: Vec<String> = get_all_categories(&connection)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names[0], "books");
        assert_eq!(names[1], "Entertainment");
    }

    #[test]
    fn create_duplicate_fails() {
        let connection = get_test_connection();

        let result = create_category(name("Food"), &connection);

        assert_eq!(result, Err(Error::DuplicateCategory("Food".to_owned())));
    }

    #[test]
    fn rename_updates_transactions() {
        let mut connection = get_test_connection();
        let dinner = create_transaction(
            Transaction::build(20.0, date!(2025 - 03 - 03), "Dinner").category("Food"),
            &connection,
        )
        .unwrap();

        let renamed = rename_category(&name("Food"), name("Eating out"), &mut connection);

        assert_eq!(renamed, Ok(name("Eating out")));
        assert_eq!(
            get_transaction(dinner.id, &connection).unwrap().category,
            "Eating out"
        );
    }

    #[test]
    fn rename_to_existing_fails_without_changes() {
        let mut connection = get_test_connection();
        let dinner = create_transaction(
            Transaction::build(20.0, date!(2025 - 03 - 03), "Dinner").category("Food"),
            &connection,
        )
        .unwrap();

        let result = rename_category(&name("Food"), name("Rent"), &mut connection);

        assert_eq!(result, Err(Error::DuplicateCategory("Rent".to_owned())));
        assert_eq!(get_transaction(dinner.id, &connection), Ok(dinner));
    }

    #[test]
    fn rename_missing_fails() {
        let mut connection = get_test_connection();

        let result = rename_category(&name("Pets"), name("Animals"), &mut connection);

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_then_delete_again() {
        let connection = get_test_connection();

        assert_eq!(delete_category(&name("Travel"), &connection), Ok(()));
        assert_eq!(
            delete_category(&name("Travel"), &connection),
            Err(Error::DeleteMissingCategory)
        );
    }
}
