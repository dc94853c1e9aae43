use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use driftspace_core::{Workspace, WorkspacePatch};
use driftspace_sync::Membership;

use crate::api::acting_user;
use crate::error::AppError;
use crate::AppState;

/// Request to create a new workspace
#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub title: String,
    pub icon_id: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub last_modified_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    pub user_id: Uuid,
}

/// List workspaces visible to the acting user
async fn list_workspaces(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Workspace>>, AppError> {
    let user = acting_user(&headers)?;
    let workspaces = state.db.list_workspaces(user).await?;
    Ok(Json(workspaces))
}

/// Create a new workspace owned by the acting user
async fn create_workspace(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<Json<Workspace>, AppError> {
    let user = acting_user(&headers)?;
    let mut workspace = Workspace::new(req.title, req.icon_id, user);
    workspace.logo = req.logo;
    workspace.banner_url = req.banner_url;
    workspace.data = req.data;
    workspace.last_modified_by = req.last_modified_by;

    let created = state.db.create_workspace(workspace).await?;
    Ok(Json(created))
}

/// Get a workspace by ID
async fn get_workspace(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Workspace>, AppError> {
    let user = acting_user(&headers)?;
    let workspace = state
        .db
        .get_workspace(id, user)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workspace {} not found", id)))?;
    Ok(Json(workspace))
}

/// Merge a partial update into a workspace
async fn update_workspace(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(patch): Json<WorkspacePatch>,
) -> Result<Json<Workspace>, AppError> {
    let user = acting_user(&headers)?;
    let workspace = state.db.update_workspace(id, user, patch).await?;
    Ok(Json(workspace))
}

/// Delete a workspace and, by cascade, everything in it
async fn delete_workspace(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = acting_user(&headers)?;
    state.db.delete_workspace(id, user).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// List collaborators of a workspace
async fn list_collaborators(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Membership>>, AppError> {
    let user = acting_user(&headers)?;
    let members = state.db.list_collaborators(id, user).await?;
    Ok(Json(members))
}

/// Add a collaborator to a workspace
async fn add_collaborator(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCollaboratorRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = acting_user(&headers)?;
    state.db.add_collaborator(id, user, req.user_id).await?;
    Ok(Json(serde_json::json!({ "added": true })))
}

/// Remove a collaborator from a workspace
async fn remove_collaborator(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = acting_user(&headers)?;
    state.db.remove_collaborator(id, user, user_id).await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/workspaces", get(list_workspaces).post(create_workspace))
        .route(
            "/api/workspaces/{id}",
            get(get_workspace)
                .put(update_workspace)
                .delete(delete_workspace),
        )
        .route(
            "/api/workspaces/{id}/collaborators",
            get(list_collaborators).post(add_collaborator),
        )
        .route(
            "/api/workspaces/{id}/collaborators/{user_id}",
            delete(remove_collaborator),
        )
}
