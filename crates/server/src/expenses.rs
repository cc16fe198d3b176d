//! Expense record endpoints.

use api_types::SuccessResponse;
use api_types::expense::{ExpenseCreated, ExpenseListParams, ExpenseNew, ExpenseView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::{ServerError, server::ServerState};
use engine::{Caller, ExpenseDraft, ExpenseListFilter, categories};

fn view(model: engine::expenses::Model) -> ExpenseView {
    // Clients render the emoji, not the stored label.
    let icon = categories::category_to_icon(&model.category).to_string();
    ExpenseView {
        id: model.id,
        user_id: model.user_id,
        wallet_id: model.wallet_id,
        item: model.item,
        price: model.price,
        store: model.store,
        date: model.date,
        category: model.category,
        icon,
        category_type: model.kind,
    }
}

fn draft(payload: &ExpenseNew) -> ExpenseDraft {
    ExpenseDraft {
        item: payload.item.clone(),
        price: payload.price,
        store: payload.store.clone(),
        date: payload.date,
        icon: payload.icon.clone(),
        category_type: payload.category_type.clone(),
    }
}

/// `POST /expenses`: creates a record in the given wallet.
pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseCreated>, ServerError> {
    let model = state
        .engine
        .create_expense(&payload.wallet_id, draft(&payload), &caller.id)
        .await?;

    Ok(Json(ExpenseCreated {
        success: true,
        data: view(model),
    }))
}

/// `GET /expenses`: a wallet's records, optionally filtered by month/year
/// and an item search string.
///
/// Without `wallet_id` there is nothing to list; the answer is an empty
/// array, not an error.
pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Query(params): Query<ExpenseListParams>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let Some(wallet_id) = params.wallet_id.as_deref() else {
        return Ok(Json(Vec::new()));
    };

    let filter = ExpenseListFilter {
        month: params.month,
        year: params.year,
        search: params.search,
    };

    let records = state
        .engine
        .list_expenses(wallet_id, &filter, &caller.id)
        .await?
        .into_iter()
        .map(view)
        .collect();

    Ok(Json(records))
}

/// `PUT /expenses/{expense_id}`: creator-only update.
pub async fn update(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseCreated>, ServerError> {
    let model = state
        .engine
        .update_expense(&expense_id, draft(&payload), &caller.id)
        .await?;

    Ok(Json(ExpenseCreated {
        success: true,
        data: view(model),
    }))
}

/// `DELETE /expenses/{expense_id}`: creator-only delete.
pub async fn remove(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
) -> Result<Json<SuccessResponse>, ServerError> {
    state.engine.delete_expense(&expense_id, &caller.id).await?;
    Ok(Json(SuccessResponse::ok()))
}
