//! Database operations for tags.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    tag::{Tag, TagName},
    transaction::{tags_from_column, tags_to_json},
};

/// Create a tag.
///
/// # Errors
/// Returns [Error::DuplicateTag] if a tag with the same name already exists.
pub fn create_tag(name: TagName, connection: &Connection) -> Result<Tag, Error> {
    let rows_affected = connection.execute(
        "INSERT INTO tag (name) VALUES (?1) ON CONFLICT(name) DO NOTHING;",
        (name.as_ref(),),
    )?;

    if rows_affected == 0 {
        return Err(Error::DuplicateTag(name.to_string()));
    }

    Ok(Tag { name })
}

/// Retrieve all tags ordered alphabetically by name, ignoring case.
pub fn get_all_tags(connection: &Connection) -> Result<Vec<Tag>, Error> {
    connection
        .prepare("SELECT name FROM tag ORDER BY name COLLATE NOCASE ASC;")?
        .query_map([], map_row)?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

/// Rename the tag `old_name` and replace it in the tags of every transaction
/// and recurring transaction, all in one SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTag] if there is no tag called `old_name`,
/// - [Error::DuplicateTag] if there already is a tag called `new_name`,
/// - or [Error::SqlError] if there is some other SQL error, in which case nothing is renamed.
pub fn rename_tag(
    old_name: &TagName,
    new_name: TagName,
    connection: &mut Connection,
) -> Result<Tag, Error> {
    let sql_transaction = connection.transaction()?;

    if old_name != &new_name && tag_exists(&new_name, &sql_transaction)? {
        return Err(Error::DuplicateTag(new_name.to_string()));
    }

    let rows_affected = sql_transaction.execute(
        "UPDATE tag SET name = ?1 WHERE name = ?2",
        (new_name.as_ref(), old_name.as_ref()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTag);
    }

    let transactions = replace_tag_in_table(
        "\"transaction\"",
        old_name.as_ref(),
        new_name.as_ref(),
        &sql_transaction,
    )?;
    let templates = replace_tag_in_table(
        "recurring_transaction",
        old_name.as_ref(),
        new_name.as_ref(),
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    tracing::debug!(
        "renamed tag {old_name} to {new_name} in {transactions} transactions and {templates} recurring transactions"
    );

    Ok(Tag { name: new_name })
}

/// Delete a tag by name. Returns an error if the tag doesn't exist.
///
/// Transactions keep the name in their tags.
pub fn delete_tag(name: &TagName, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM tag WHERE name = ?1", [name.as_ref()])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTag);
    }

    Ok(())
}

/// Initialize the tag table.
pub fn create_tag_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS tag (
            name TEXT PRIMARY KEY NOT NULL
        );",
    )?;

    Ok(())
}

fn tag_exists(name: &TagName, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM tag WHERE name = ?1)",
            [name.as_ref()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Replace `old_name` with `new_name` in the JSON tag lists of `table`.
///
/// Returns the number of rows changed.
fn replace_tag_in_table(
    table: &str,
    old_name: &str,
    new_name: &str,
    connection: &Connection,
) -> Result<usize, Error> {
    let tagged_rows = connection
        .prepare(&format!(
            "SELECT id, tags FROM {table}
             WHERE EXISTS (SELECT 1 FROM json_each({table}.tags) WHERE value = ?1)"
        ))?
        .query_map([old_name], |row| {
            Ok((row.get::<_, i64>(0)?, tags_from_column(row, 1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut statement = connection.prepare(&format!("UPDATE {table} SET tags = ?1 WHERE id = ?2"))?;

    for (id, tags) in &tagged_rows {
        let renamed = replace_in_list(tags, old_name, new_name);
        statement.execute((tags_to_json(&renamed)?, id))?;
    }

    Ok(tagged_rows.len())
}

/// Replace `old_name` with `new_name`, keeping the first of any duplicates.
fn replace_in_list(tags: &[String], old_name: &str, new_name: &str) -> Vec<String> {
    let mut renamed: Vec<String> = Vec::with_capacity(tags.len());

    for tag in tags {
        let tag = if tag == old_name { new_name } else { tag.as_str() };

        if !renamed.iter().any(|existing| existing == tag) {
            renamed.push(tag.to_owned());
        }
    }

    renamed
}

fn map_row(row: &Row) -> Result<Tag, rusqlite::Error> {
    let raw_name: String = row.get(0)?;
    let name = TagName::new_unchecked(&raw_name);

    Ok(Tag { name })
}

#[cfg(test)]
mod tag_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        recurring::{Frequency, NewRecurringTransaction, on_template_created},
        tag::{Tag, TagName, create_tag, get_all_tags},
        transaction::{Transaction, TransactionType, create_transaction, get_transaction},
    };

    use super::{delete_tag, rename_tag, replace_in_list};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn create_tag_succeeds() {
        let connection = get_test_db_connection();
        let name = TagName::new("Terrifically a tag").unwrap();

        let tag = create_tag(name.clone(), &connection);

        assert_eq!(tag, Ok(Tag { name }));
    }

    #[test]
    fn create_duplicate_tag_fails() {
        let connection = get_test_db_connection();
        create_tag(TagName::new_unchecked("Foo"), &connection).unwrap();

        let result = create_tag(TagName::new_unchecked("Foo"), &connection);

        assert_eq!(result, Err(Error::DuplicateTag("Foo".to_owned())));
    }

    #[test]
    fn get_all_tags_sorts_ignoring_case() {
        let connection = get_test_db_connection();
        for name in ["banana", "Cherry", "apple"] {
            create_tag(TagName::new_unchecked(name), &connection).unwrap();
        }

        let names: Vec<String> = get_all_tags(&connection)
            .unwrap()
            .into_iter()
            .map(|tag| tag.name.to_string())
            .collect();

        assert_eq!(names, tags(&["apple", "banana", "Cherry"]));
    }

    #[test]
    fn rename_cascades_to_transactions_and_recurring_transactions() {
        let mut connection = get_test_db_connection();
        create_tag(TagName::new_unchecked("work"), &connection).unwrap();
        let lunch = create_transaction(
            Transaction::build(12.0, date!(2025 - 01 - 01), "Lunch").tags(tags(&["work", "food"])),
            &connection,
        )
        .unwrap();
        let untagged =
            create_transaction(Transaction::build(3.0, date!(2025 - 01 - 01), "Bus"), &connection)
                .unwrap();
        let (template, _) = on_template_created(
            &NewRecurringTransaction {
                name: "Train pass".to_owned(),
                category: "Travel".to_owned(),
                tags: tags(&["work"]),
                amount: 50.0,
                transaction_type: TransactionType::Expense,
                start_date: date!(2025 - 01 - 01),
                end_date: date!(2025 - 02 - 01),
                frequency: Frequency::Monthly,
            },
            &mut connection,
        )
        .unwrap();

        let renamed = rename_tag(
            &TagName::new_unchecked("work"),
            TagName::new_unchecked("office"),
            &mut connection,
        );

        assert_eq!(renamed.map(|tag| tag.name.to_string()), Ok("office".to_owned()));
        assert_eq!(
            get_transaction(lunch.id, &connection).unwrap().tags,
            tags(&["office", "food"])
        );
        assert_eq!(get_transaction(untagged.id, &connection), Ok(untagged));
        let template_tags: String = connection
            .query_row(
                "SELECT tags FROM recurring_transaction WHERE id = ?1",
                [template.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(template_tags, r#"["office"]"#);
        let generated_with_new_tag: u32 = connection
            .query_row(
                "SELECT COUNT(*) FROM \"transaction\" WHERE recurring_id = ?1 AND tags = '[\"office\"]'",
                [template.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(generated_with_new_tag, 2);
    }

    #[test]
    fn rename_to_existing_tag_fails() {
        let mut connection = get_test_db_connection();
        create_tag(TagName::new_unchecked("a"), &connection).unwrap();
        create_tag(TagName::new_unchecked("b"), &connection).unwrap();

        let result = rename_tag(
            &TagName::new_unchecked("a"),
            TagName::new_unchecked("b"),
            &mut connection,
        );

        assert_eq!(result, Err(Error::DuplicateTag("b".to_owned())));
    }

    #[test]
    fn rename_missing_tag_fails() {
        let mut connection = get_test_db_connection();

        let result = rename_tag(
            &TagName::new_unchecked("ghost"),
            TagName::new_unchecked("spirit"),
            &mut connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingTag));
    }

    #[test]
    fn replace_in_list_removes_duplicates() {
        assert_eq!(
            replace_in_list(&tags(&["a", "b", "c"]), "a", "c"),
            tags(&["c", "b"])
        );
    }

    #[test]
    fn delete_tag_succeeds() {
        let connection = get_test_db_connection();
        let name = TagName::new_unchecked("ToDelete");
        create_tag(name.clone(), &connection).unwrap();

        assert_eq!(delete_tag(&name, &connection), Ok(()));
        assert_eq!(get_all_tags(&connection), Ok(vec![]));
    }

    #[test]
    fn delete_missing_tag_fails() {
        let connection = get_test_db_connection();

        let result = delete_tag(&TagName::new_unchecked("nope"), &connection);

        assert_eq!(result, Err(Error::DeleteMissingTag));
    }
}
