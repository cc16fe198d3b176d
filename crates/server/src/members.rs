//! Wallet membership endpoints (owner-only).

use api_types::SuccessResponse;
use api_types::member::{MemberInvite, MemberView, MembersResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};
use engine::Caller;

/// `POST /wallets/{wallet_id}/members`: invites a user by email.
pub async fn invite(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
    Json(payload): Json<MemberInvite>,
) -> Result<Json<SuccessResponse>, ServerError> {
    state
        .engine
        .add_member(
            &wallet_id,
            &payload.email,
            payload.role.map(|r| r.as_str()),
            &caller.id,
        )
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// `GET /wallets/{wallet_id}/members`: the owner's view of the roster.
pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state
        .engine
        .list_members(&wallet_id, &caller.id)
        .await?
        .into_iter()
        .map(|m| MemberView {
            user_id: m.user_id,
            email: m.email,
            role: m.role,
        })
        .collect();

    Ok(Json(MembersResponse { members }))
}
