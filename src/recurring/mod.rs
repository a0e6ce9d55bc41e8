//! Recurring transactions, e.g. rent, subscriptions and wages.
//!
//! A recurring transaction is a template that is expanded into one ordinary
//! transaction per occurrence date when it is created. Edits and deletions
//! of the template are carried over to its transactions, either to all of
//! them or only to those dated after today (see [ApplyTo]).

mod db;
mod endpoints;
mod frequency;
mod models;
mod sync;

pub use db::create_recurring_transaction_table;
pub use endpoints::{
    create_recurring_transaction_endpoint, delete_recurring_transaction_endpoint,
    get_recurring_occurrences_endpoint, get_recurring_transaction_endpoint,
    list_recurring_transactions_endpoint, update_recurring_transaction_endpoint,
};
pub use frequency::{Frequency, Occurrences, occurrences};
pub use models::{
    ApplyTo, NewRecurringTransaction, RecurringPatch, RecurringTransaction, SyncSummary,
};
pub use sync::{on_template_created, on_template_deleted, on_template_updated};
