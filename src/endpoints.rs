//! The API endpoints URIs.
//!
//! Endpoints that take a parameter, e.g., '/api/tags/{tag_name}', are filled in by axum's `Path` extractor.

#[cfg(test)]
use std::fmt::Display;

/// The API root which returns a welcome message.
pub const ROOT: &str = "/api";
/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route for getting the version of the API.
pub const VERSION: &str = "/api/version";
/// The route for getting the interface language.
pub const LANGUAGE: &str = "/api/language";
/// The route for setting the interface language.
pub const SET_LANGUAGE: &str = "/api/language/{language}";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list the transactions in a calendar month.
pub const TRANSACTIONS_BY_MONTH: &str = "/api/transactions/date/{year}/{month}";
/// The route to list the transactions in an inclusive range of calendar months.
pub const TRANSACTIONS_BY_RANGE: &str =
    "/api/transactions/range/{from_year}/{from_month}/{to_year}/{to_month}";
/// The route to list the transactions of the current month and the months before it.
pub const TRANSACTIONS_PAST_MONTHS: &str = "/api/transactions/past/{months}";
/// The route to list the transactions from the start of the year to the end of this month.
pub const TRANSACTIONS_YEAR_TO_DATE: &str = "/api/transactions/year-to-date";
/// The route to list every transaction up to the end of this month.
pub const TRANSACTIONS_TO_DATE: &str = "/api/transactions/to-date";
/// The route for searching for transaction names.
pub const TRANSACTION_NAMES_SEARCH: &str = "/api/transactions/names/search";
/// The route for importing many transactions at once.
pub const IMPORT_TRANSACTIONS: &str = "/api/transactions/import";

/// The route to list and create recurring transactions.
pub const RECURRING_TRANSACTIONS: &str = "/api/recurring";
/// The route to access a single recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/recurring/{recurring_id}";
/// The route to list the transactions generated by a recurring transaction.
pub const RECURRING_TRANSACTION_OCCURRENCES: &str = "/api/recurring/{recurring_id}/transactions";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to rename or delete a category.
pub const CATEGORY: &str = "/api/categories/{category_name}";
/// The route to list and create tags.
pub const TAGS: &str = "/api/tags";
/// The route to rename or delete a tag.
pub const TAG: &str = "/api/tags/{tag_name}";
/// The route to get the currency settings.
pub const CURRENCY: &str = "/api/currency";
/// The route to select the currency used for displaying amounts.
pub const SELECT_CURRENCY: &str = "/api/currency/{currency_name}";
/// The route to set which side of the amount the currency symbol is placed on.
pub const CURRENCY_POSITION: &str = "/api/currency/position/{position}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/tags/{tag_name}', '{tag_name}' is the parameter.
///
/// Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::HEALTH);
        assert_endpoint_is_valid_uri(endpoints::VERSION);
        assert_endpoint_is_valid_uri(endpoints::LANGUAGE);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_YEAR_TO_DATE);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_TO_DATE);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_NAMES_SEARCH);
        assert_endpoint_is_valid_uri(endpoints::IMPORT_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::RECURRING_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::TAGS);
        assert_endpoint_is_valid_uri(endpoints::CURRENCY);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint(endpoints::RECURRING_TRANSACTION, 1);

        assert_eq!(formatted_path, "/api/recurring/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::RECURRING_TRANSACTION_OCCURRENCES, 42);

        assert_eq!(formatted_path, "/api/recurring/42/transactions");
    }

    #[test]
    fn accepts_string_parameters() {
        let formatted_path = format_endpoint(endpoints::CATEGORY, "Rent");

        assert_eq!(formatted_path, "/api/categories/Rent");
    }
}
