//! Keeps the transactions generated by a recurring transaction in sync with it.
//!
//! Every operation runs in a single, immediate SQL transaction: either the
//! recurring transaction and all of its generated transactions change
//! together, or nothing changes.

use rusqlite::{Connection, TransactionBehavior};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::RecurringId,
    recurring::{
        ApplyTo, NewRecurringTransaction, RecurringPatch, RecurringTransaction, SyncSummary,
        db::{
            delete_recurring_transaction, get_recurring_transaction, insert_recurring_transaction,
            update_recurring_transaction,
        },
        occurrences,
    },
    transaction::{
        DateFilter, Transaction, TransactionPatch, delete_by_recurring_id, insert_batch,
        update_by_recurring_id,
    },
};

/// Generate the transactions of `template` whose dates pass `filter`.
///
/// Each transaction copies the template's name, category, tags, amount and
/// type, and links back to the template.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
/// Run it inside a SQL transaction so that a failure inserts nothing.
pub fn materialize(
    template: &RecurringTransaction,
    filter: DateFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let builders: Vec<_> = occurrences(template.start_date, template.end_date, template.frequency)
        .filter(|date| filter.contains(*date))
        .map(|date| {
            Transaction::build(template.amount, date, &template.name)
                .category(&template.category)
                .tags(template.tags.clone())
                .transaction_type(template.transaction_type)
                .recurring_id(Some(template.id))
        })
        .collect();

    insert_batch(&builders, connection)
}

/// Create a recurring transaction and generate all of its transactions.
///
/// # Errors
/// This function will return a:
/// - validation error if `new` is invalid, see [NewRecurringTransaction::validate],
/// - or [Error::SqlError] if there is some SQL error, in which case nothing is created.
pub fn on_template_created(
    new: &NewRecurringTransaction,
    connection: &mut Connection,
) -> Result<(RecurringTransaction, SyncSummary), Error> {
    new.validate()?;

    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let template = insert_recurring_transaction(new, OffsetDateTime::now_utc(), &sql_transaction)?;
    let created = materialize(&template, DateFilter::All, &sql_transaction)?.len();

    sql_transaction.commit()?;

    tracing::info!(
        "created recurring transaction {} with {created} transactions",
        template.id
    );

    Ok((
        template,
        SyncSummary {
            created,
            ..Default::default()
        },
    ))
}

/// Apply `patch` to the recurring transaction `id` and regenerate its transactions.
///
/// With [ApplyTo::Future], only the transactions dated after `today` are
/// replaced, earlier transactions are left exactly as they were. With
/// [ApplyTo::All], every generated transaction is replaced.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a recurring transaction,
/// - validation error if the patched recurring transaction is invalid,
/// - or [Error::SqlError] if there is some SQL error.
///
/// Nothing is changed when an error is returned.
pub fn on_template_updated(
    id: RecurringId,
    patch: &RecurringPatch,
    apply_to: ApplyTo,
    today: Date,
    connection: &mut Connection,
) -> Result<(RecurringTransaction, SyncSummary), Error> {
    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = get_recurring_transaction(id, &sql_transaction)?;
    patch.merge(&current).validate()?;

    let template = update_recurring_transaction(id, patch, &sql_transaction)?;
    let filter = apply_to.date_filter(today);
    let deleted = delete_by_recurring_id(id, filter, &sql_transaction)?;
    let created = materialize(&template, filter, &sql_transaction)?.len();

    sql_transaction.commit()?;

    tracing::info!(
        "updated recurring transaction {id} ({apply_to:?}): deleted {deleted}, created {created} transactions"
    );

    Ok((
        template,
        SyncSummary {
            deleted,
            created,
            ..Default::default()
        },
    ))
}

/// Delete the recurring transaction `id` and its transactions.
///
/// With [ApplyTo::Future], the transactions dated after `today` are deleted
/// and the rest are kept as standalone transactions. With [ApplyTo::All],
/// every generated transaction is deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a recurring transaction,
/// - or [Error::SqlError] if there is some SQL error, in which case nothing is deleted.
pub fn on_template_deleted(
    id: RecurringId,
    apply_to: ApplyTo,
    today: Date,
    connection: &mut Connection,
) -> Result<SyncSummary, Error> {
    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    get_recurring_transaction(id, &sql_transaction)?;

    let deleted = delete_by_recurring_id(id, apply_to.date_filter(today), &sql_transaction)?;
    let unlinked = match apply_to {
        ApplyTo::Future => update_by_recurring_id(
            id,
            DateFilter::OnOrBefore(today),
            &TransactionPatch::unlink(),
            &sql_transaction,
        )?,
        ApplyTo::All => 0,
    };

    delete_recurring_transaction(id, &sql_transaction)?;

    sql_transaction.commit()?;

    tracing::info!(
        "deleted recurring transaction {id} ({apply_to:?}): deleted {deleted}, kept {unlinked} transactions"
    );

    Ok(SyncSummary {
        deleted,
        unlinked,
        created: 0,
    })
}
