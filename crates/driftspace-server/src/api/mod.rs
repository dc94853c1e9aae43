mod files;
mod folders;
mod health;
mod workspaces;

use axum::http::HeaderMap;
use axum::Router;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// The acting user, as asserted by the authenticating gateway in front of
/// this service. Membership is still re-verified per write in the db layer.
pub(crate) fn acting_user(headers: &HeaderMap) -> Result<Uuid, AppError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| AppError::Unauthorized("missing or invalid x-user-id header".into()))
}

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(workspaces::router())
        .merge(folders::router())
        .merge(files::router())
}
