use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use driftspace_core::{Folder, FolderPatch};

use crate::api::acting_user;
use crate::error::AppError;
use crate::AppState;

/// Request to create a new folder
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub workspace_id: Uuid,
    pub title: String,
    pub icon_id: String,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub last_modified_by: Option<Uuid>,
}

/// List folders of a workspace
async fn list_folders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<Uuid>,
) -> Result<Json<Vec<Folder>>, AppError> {
    let user = acting_user(&headers)?;
    let folders = state.db.list_folders(workspace_id, user).await?;
    Ok(Json(folders))
}

/// Create a new folder
async fn create_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<Folder>, AppError> {
    let user = acting_user(&headers)?;
    let mut folder = Folder::new(req.workspace_id, req.title, req.icon_id);
    folder.banner_url = req.banner_url;
    folder.data = req.data;
    folder.last_modified_by = req.last_modified_by;

    let created = state.db.create_folder(folder, user).await?;
    Ok(Json(created))
}

/// Merge a partial update into a folder
async fn update_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(patch): Json<FolderPatch>,
) -> Result<Json<Folder>, AppError> {
    let user = acting_user(&headers)?;
    let folder = state.db.update_folder(id, user, patch).await?;
    Ok(Json(folder))
}

/// Delete a folder; its files cascade
async fn delete_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = acting_user(&headers)?;
    state.db.delete_folder(id, user).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/workspaces/{id}/folders", get(list_folders))
        .route("/api/folders", post(create_folder))
        .route(
            "/api/folders/{id}",
            axum::routing::put(update_folder).delete(delete_folder),
        )
}
