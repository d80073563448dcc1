//! Notes CRUD endpoints. Every route requires an access credential.

use axum::{
    Extension, Json,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::auth::require_identity;
use crate::error::{ApiError, ErrorBody};
use crate::identity::Identity;
use crate::notes::{NOTES_TAG, Note, NoteUpdate};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Case-insensitive search over title and content
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_notes, create_note))
        .routes(routes!(get_note, update_note, delete_note))
        .route_layer(axum::middleware::from_fn(require_identity))
}

#[tracing::instrument(skip(resources, identity, query), fields(user_id = %identity.id))]
#[utoipa::path(
    get,
    path = "/",
    tag = NOTES_TAG,
    operation_id = "List Notes",
    summary = "List the caller's notes, newest first",
    params(ListQuery),
    security(("access_cookie" = [])),
    responses(
        (status = 200, description = "Notes owned by the caller", body = Vec<Note>),
        (status = 401, description = "Missing or invalid access credential", body = ErrorBody)
    )
)]
async fn list_notes(
    Extension(resources): Extension<AppResources>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = resources
        .notes
        .list(&identity.id, query.q.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(name = "api.notes.list_failed", error = %e, "Failed to list notes");
            e
        })?;
    Ok(Json(notes))
}

#[tracing::instrument(skip(resources, identity, payload), fields(user_id = %identity.id))]
#[utoipa::path(
    post,
    path = "/",
    tag = NOTES_TAG,
    operation_id = "Create Note",
    summary = "Create a note",
    request_body(content = NewNote, description = "Title is required"),
    security(("access_cookie" = [])),
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Missing title or invalid body", body = ErrorBody),
        (status = 401, description = "Missing or invalid access credential", body = ErrorBody)
    )
)]
async fn create_note(
    Extension(resources): Extension<AppResources>,
    Extension(identity): Extension<Identity>,
    WithRejection(Json(payload), _): WithRejection<Json<NewNote>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::MissingField("title"));
    }
    let note = resources
        .notes
        .create(&identity.id, &payload.title, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[tracing::instrument(skip(resources, identity), fields(user_id = %identity.id))]
#[utoipa::path(
    get,
    path = "/{id}",
    tag = NOTES_TAG,
    operation_id = "Get Note",
    params(("id" = String, Path, description = "Note id")),
    security(("access_cookie" = [])),
    responses(
        (status = 200, description = "The note", body = Note),
        (status = 404, description = "No such note for this user", body = ErrorBody)
    )
)]
async fn get_note(
    Extension(resources): Extension<AppResources>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(resources.notes.get(&id, &identity.id).await?))
}

#[tracing::instrument(skip(resources, identity, payload), fields(user_id = %identity.id))]
#[utoipa::path(
    put,
    path = "/{id}",
    tag = NOTES_TAG,
    operation_id = "Update Note",
    params(("id" = String, Path, description = "Note id")),
    request_body(content = NoteUpdate, description = "Fields to change"),
    security(("access_cookie" = [])),
    responses(
        (status = 200, description = "The updated note", body = Note),
        (status = 400, description = "Body is not a valid note update", body = ErrorBody),
        (status = 404, description = "No such note for this user", body = ErrorBody)
    )
)]
async fn update_note(
    Extension(resources): Extension<AppResources>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<NoteUpdate>, ApiError>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(
        resources.notes.update(&id, &identity.id, payload).await?,
    ))
}

#[tracing::instrument(skip(resources, identity), fields(user_id = %identity.id))]
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = NOTES_TAG,
    operation_id = "Delete Note",
    params(("id" = String, Path, description = "Note id")),
    security(("access_cookie" = [])),
    responses(
        (status = 200, description = "Note deleted", content_type = "application/json", example = json!({"message": "Note deleted successfully"})),
        (status = 404, description = "No such note for this user", body = ErrorBody)
    )
)]
async fn delete_note(
    Extension(resources): Extension<AppResources>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    resources.notes.delete(&id, &identity.id).await?;
    Ok(Json(json!({ "message": "Note deleted successfully" })))
}
