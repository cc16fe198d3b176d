//! Wallet endpoints.

use api_types::SuccessResponse;
use api_types::wallet::{WalletCreated, WalletNew, WalletView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};
use engine::Caller;

fn view(model: engine::wallets::Model) -> WalletView {
    WalletView {
        id: model.id,
        name: model.name,
        owner_id: model.owner_id,
        created_at: model.created_at,
    }
}

/// `GET /wallets`: every wallet the caller owns or was invited to.
pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WalletView>>, ServerError> {
    let wallets = state
        .engine
        .list_wallets(&caller.id)
        .await?
        .into_iter()
        .map(view)
        .collect();

    Ok(Json(wallets))
}

/// `POST /wallets`: creates a wallet with the caller as owner.
pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<Json<WalletCreated>, ServerError> {
    let wallet = state.engine.create_wallet(&payload.name, &caller.id).await?;

    Ok(Json(WalletCreated {
        success: true,
        data: view(wallet),
    }))
}

/// `DELETE /wallets/{wallet_id}`: owner-only, removes the wallet and
/// everything in it.
pub async fn remove(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<SuccessResponse>, ServerError> {
    state.engine.delete_wallet(&wallet_id, &caller.id).await?;
    Ok(Json(SuccessResponse::ok()))
}
