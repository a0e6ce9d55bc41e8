//! JSON endpoints for managing categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    category::{
        CategoryName,
        db::{create_category, delete_category, get_all_categories, rename_category},
        domain::CategoryForm,
    },
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the category names in alphabetical order.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
) -> Result<Json<Vec<String>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let names = get_all_categories(&connection)?
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(Json(names))
}

/// Create a category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Json(form): Json<CategoryForm>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let name = create_category(name, &connection)?;

    Ok((StatusCode::CREATED, Json(json!({ "name": name }))).into_response())
}

/// Rename a category and move its transactions to the new name.
pub async fn rename_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_name): Path<String>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Value>, Error> {
    let old_name = CategoryName::new(&category_name)?;
    let new_name = CategoryName::new(&form.name)?;

    let mut connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let name = rename_category(&old_name, new_name, &mut connection)?;

    Ok(Json(json!({ "name": name })))
}

/// Delete a category.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_name): Path<String>,
) -> Result<Json<Value>, Error> {
    let name = CategoryName::new(&category_name)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(&name, &connection)?;

    Ok(Json(json!({ "ok": true })))
}
