//! JSON endpoints for managing tags.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    tag::{
        TagName,
        db::{create_tag, delete_tag, get_all_tags, rename_tag},
        domain::TagFormData,
    },
};

/// The state needed by the tag endpoints.
#[derive(Debug, Clone)]
pub struct TagState {
    /// The database connection for managing tags.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TagState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the tag names in alphabetical order.
pub async fn list_tags_endpoint(
    State(state): State<TagState>,
) -> Result<Json<Vec<String>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let names = get_all_tags(&connection)?
        .into_iter()
        .map(|tag| tag.name.to_string())
        .collect();

    Ok(Json(names))
}

/// Create a tag from a JSON body `{"name": ...}`.
pub async fn create_tag_endpoint(
    State(state): State<TagState>,
    Json(form): Json<TagFormData>,
) -> Result<Response, Error> {
    let name = TagName::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let tag = create_tag(name, &connection)?;

    Ok((StatusCode::CREATED, Json(json!({ "name": tag.name }))).into_response())
}

/// Rename a tag, updating every transaction that uses it.
pub async fn rename_tag_endpoint(
    State(state): State<TagState>,
    Path(tag_name): Path<String>,
    Json(form): Json<TagFormData>,
) -> Result<Json<serde_json::Value>, Error> {
    let old_name = TagName::new(&tag_name)?;
    let new_name = TagName::new(&form.name)?;

    let mut connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let tag = rename_tag(&old_name, new_name, &mut connection)?;

    Ok(Json(json!({ "name": tag.name })))
}

/// Delete a tag.
pub async fn delete_tag_endpoint(
    State(state): State<TagState>,
    Path(tag_name): Path<String>,
) -> Result<Json<serde_json::Value>, Error> {
    let name = TagName::new(&tag_name)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_tag(&name, &connection)?;

    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tag_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        Error,
        db::initialize,
        tag::{TagName, create_tag, domain::TagFormData},
    };

    use super::{
        TagState, create_tag_endpoint, delete_tag_endpoint, list_tags_endpoint,
        rename_tag_endpoint,
    };

    fn get_tag_state() -> TagState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        TagState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn create_tag_returns_created() {
        let state = get_tag_state();

        let response = create_tag_endpoint(
            State(state.clone()),
            Json(TagFormData {
                name: " Holiday ".to_owned(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let Json(names) = list_tags_endpoint(State(state)).await.unwrap();
        assert_eq!(names, vec!["Holiday".to_owned()]);
    }

    #[tokio::test]
    async fn create_tag_rejects_empty_name() {
        let state = get_tag_state();

        let result = create_tag_endpoint(
            State(state),
            Json(TagFormData {
                name: "   ".to_owned(),
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::EmptyName));
    }

    #[tokio::test]
    async fn rename_tag_returns_new_name() {
        let state = get_tag_state();
        create_tag(
            TagName::new_unchecked("Work"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let Json(body) = rename_tag_endpoint(
            State(state),
            Path("Work".to_owned()),
            Json(TagFormData {
                name: "Office".to_owned(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body, json!({ "name": "Office" }));
    }

    #[tokio::test]
    async fn delete_missing_tag_returns_error() {
        let state = get_tag_state();

        let result = delete_tag_endpoint(State(state), Path("Nope".to_owned())).await;

        assert_eq!(result.err(), Some(Error::DeleteMissingTag));
    }

    #[tokio::test]
    async fn delete_tag_returns_ok() {
        let state = get_tag_state();
        create_tag(
            TagName::new_unchecked("Gone"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let Json(body) = delete_tag_endpoint(State(state), Path("Gone".to_owned()))
            .await
            .unwrap();

        assert_eq!(body, json!({ "ok": true }));
    }
}
