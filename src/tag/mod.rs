//! Tags are free-form labels that can be attached to transactions.

mod db;
mod domain;
mod endpoints;

pub use db::create_tag_table;
pub use domain::{Tag, TagName};
pub use endpoints::{
    create_tag_endpoint, delete_tag_endpoint, list_tags_endpoint, rename_tag_endpoint,
};

#[cfg(test)]
pub use db::{create_tag, get_all_tags};
