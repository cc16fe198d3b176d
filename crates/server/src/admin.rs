//! Admin panel endpoints.

use api_types::SuccessResponse;
use api_types::admin::{AdminActionRequest, AdminUserView};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState};
use engine::{AdminAction, Caller};

/// `GET /admin/users`: every account with its profile flags (admin-only).
pub async fn list_users(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AdminUserView>>, ServerError> {
    let users = state
        .engine
        .list_users(&caller.id)
        .await?
        .into_iter()
        .map(|u| AdminUserView {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            is_blocked: u.is_blocked,
            is_admin: u.is_admin,
            created_at: u.created_at,
        })
        .collect();

    Ok(Json(users))
}

/// `POST /admin/action`: applies a moderation action to one user.
pub async fn action(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<AdminActionRequest>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let action = AdminAction::try_from(payload.action.as_str())?;
    state
        .engine
        .admin_action(&caller.id, &payload.user_id, action)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}
