//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions,
//!   including the transactions generated by recurring transactions
//! - JSON endpoints for listing, creating, editing and deleting transactions

mod core;
mod endpoints;
mod linked;
mod range;

pub use core::{
    DEFAULT_CATEGORY, Transaction, TransactionBuilder, TransactionPatch, TransactionType,
    create_transaction_table, insert_batch,
};
pub(crate) use core::{tags_from_column, tags_to_json, validate_amount, validate_name};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    get_transactions_by_month_endpoint,
    get_transactions_by_range_endpoint, get_transactions_past_months_endpoint,
    get_transactions_to_date_endpoint, get_transactions_year_to_date_endpoint,
    import_transactions_endpoint, list_transactions_endpoint, search_transaction_names_endpoint,
    update_transaction_endpoint,
};
pub(crate) use endpoints::parse_transaction_type;
pub use linked::{DateFilter, delete_by_recurring_id, select_by_recurring_id, update_by_recurring_id};

#[cfg(test)]
pub use core::{
    count_transactions, create_transaction, delete_transaction, get_all_transactions,
    get_transaction, get_transactions_in_range, import_transactions, search_transaction_names, update_transaction,
};
