//! The application router.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    category::{
        create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
        rename_category_endpoint,
    },
    currency::{get_currency_endpoint, select_currency_endpoint, set_currency_position_endpoint},
    endpoints,
    logging::logging_middleware,
    recurring::{
        create_recurring_transaction_endpoint, delete_recurring_transaction_endpoint,
        get_recurring_occurrences_endpoint, get_recurring_transaction_endpoint,
        list_recurring_transactions_endpoint, update_recurring_transaction_endpoint,
    },
    settings::{
        get_health_endpoint, get_language_endpoint, get_version_endpoint, get_welcome_endpoint,
        set_language_endpoint,
    },
    tag::{create_tag_endpoint, delete_tag_endpoint, list_tags_endpoint, rename_tag_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        get_transactions_by_month_endpoint, get_transactions_by_range_endpoint,
        get_transactions_past_months_endpoint, get_transactions_to_date_endpoint,
        get_transactions_year_to_date_endpoint, import_transactions_endpoint,
        list_transactions_endpoint, search_transaction_names_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let info_routes = Router::new()
        .route(endpoints::ROOT, get(get_welcome_endpoint))
        .route(endpoints::HEALTH, get(get_health_endpoint))
        .route(endpoints::VERSION, get(get_version_endpoint))
        .route(endpoints::LANGUAGE, get(get_language_endpoint))
        .route(endpoints::SET_LANGUAGE, put(set_language_endpoint));

    let transaction_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_BY_MONTH,
            get(get_transactions_by_month_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_BY_RANGE,
            get(get_transactions_by_range_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_PAST_MONTHS,
            get(get_transactions_past_months_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_YEAR_TO_DATE,
            get(get_transactions_year_to_date_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_TO_DATE,
            get(get_transactions_to_date_endpoint),
        )
        .route(
            endpoints::TRANSACTION_NAMES_SEARCH,
            get(search_transaction_names_endpoint),
        )
        .route(
            endpoints::IMPORT_TRANSACTIONS,
            post(import_transactions_endpoint),
        );

    let recurring_routes = Router::new()
        .route(
            endpoints::RECURRING_TRANSACTIONS,
            get(list_recurring_transactions_endpoint).post(create_recurring_transaction_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTION,
            get(get_recurring_transaction_endpoint)
                .put(update_recurring_transaction_endpoint)
                .delete(delete_recurring_transaction_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTION_OCCURRENCES,
            get(get_recurring_occurrences_endpoint),
        );

    let label_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(rename_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::TAGS,
            get(list_tags_endpoint).post(create_tag_endpoint),
        )
        .route(
            endpoints::TAG,
            put(rename_tag_endpoint).delete(delete_tag_endpoint),
        );

    let currency_routes = Router::new()
        .route(endpoints::CURRENCY, get(get_currency_endpoint))
        .route(endpoints::SELECT_CURRENCY, put(select_currency_endpoint))
        .route(
            endpoints::CURRENCY_POSITION,
            put(set_currency_position_endpoint),
        );

    info_routes
        .merge(transaction_routes)
        .merge(recurring_routes)
        .merge(label_routes)
        .merge(currency_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Not Found" })),
    )
        .into_response()
}
