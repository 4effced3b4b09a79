use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    balance::{compute_balances, BalanceSheet},
    error::ApiError,
    model::Settlement,
    settlements::dto::CreateSettlementRequest,
    state::AppState,
};

pub fn settlement_routes() -> Router<AppState> {
    Router::new()
        .route("/settlements", get(list_settlements).post(create_settlement))
        .route("/settlements/balances", get(get_balances))
}

#[instrument(skip(state))]
pub async fn list_settlements(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    let db = state.store.read().await?;
    let settlements = db
        .settlements
        .iter()
        .filter(|s| s.paid_by == user_id || s.paid_to == user_id)
        .cloned()
        .collect();
    Ok(Json(settlements))
}

#[instrument(skip(state, payload))]
pub async fn create_settlement(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateSettlementRequest>,
) -> Result<(StatusCode, Json<Settlement>), ApiError> {
    let amount = payload.amount.unwrap_or(0.0);
    let Some(paid_to) = payload.paid_to else {
        return Err(ApiError::Validation(
            "Please provide paidTo and amount".into(),
        ));
    };
    if amount == 0.0 {
        return Err(ApiError::Validation(
            "Please provide paidTo and amount".into(),
        ));
    }
    if amount < 0.0 {
        return Err(ApiError::Validation("Amount must be positive".into()));
    }

    let mut db = state.store.read().await?;

    let settlement = Settlement {
        id: Uuid::new_v4(),
        paid_by: user_id,
        paid_to,
        amount,
        note: payload.note.unwrap_or_default(),
        group_id: payload.group_id,
        date: OffsetDateTime::now_utc(),
        created_at: OffsetDateTime::now_utc(),
    };

    db.settlements.push(settlement.clone());
    state.store.write(&db).await?;

    info!(settlement_id = %settlement.id, paid_to = %paid_to, amount, "settlement recorded");
    Ok((StatusCode::CREATED, Json(settlement)))
}

/// Net pairwise balances for the caller over the whole history.
#[instrument(skip(state))]
pub async fn get_balances(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BalanceSheet>, ApiError> {
    let db = state.store.read().await?;
    let sheet = compute_balances(user_id, &db.transactions, &db.settlements);
    Ok(Json(sheet))
}
