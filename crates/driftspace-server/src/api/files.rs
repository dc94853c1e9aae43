use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use driftspace_core::{File, FilePatch};

use crate::api::acting_user;
use crate::error::AppError;
use crate::AppState;

/// Request to create a new file
#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub workspace_id: Uuid,
    pub folder_id: Uuid,
    pub title: String,
    pub icon_id: String,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub last_modified_by: Option<Uuid>,
}

/// List files of a folder
async fn list_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<Vec<File>>, AppError> {
    let user = acting_user(&headers)?;
    let files = state.db.list_files(folder_id, user).await?;
    Ok(Json(files))
}

/// Create a new file
async fn create_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateFileRequest>,
) -> Result<Json<File>, AppError> {
    let user = acting_user(&headers)?;
    let mut file = File::new(req.workspace_id, req.folder_id, req.title, req.icon_id);
    file.banner_url = req.banner_url;
    file.data = req.data;
    file.last_modified_by = req.last_modified_by;

    let created = state.db.create_file(file, user).await?;
    Ok(Json(created))
}

/// Merge a partial update into a file
async fn update_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(patch): Json<FilePatch>,
) -> Result<Json<File>, AppError> {
    let user = acting_user(&headers)?;
    let file = state.db.update_file(id, user, patch).await?;
    Ok(Json(file))
}

/// Delete a file
async fn delete_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = acting_user(&headers)?;
    state.db.delete_file(id, user).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/folders/{id}/files", get(list_files))
        .route("/api/files", post(create_file))
        .route(
            "/api/files/{id}",
            axum::routing::put(update_file).delete(delete_file),
        )
}
