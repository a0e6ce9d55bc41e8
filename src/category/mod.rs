//! Categories group transactions, e.g. 'Food' or 'Rent'.

mod db;
mod domain;
mod endpoints;

pub use db::{create_category_table, seed_default_categories};
pub use domain::{CategoryName, DEFAULT_CATEGORIES};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
    rename_category_endpoint,
};
