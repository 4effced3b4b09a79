use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    model::{Participant, Transaction},
    split::validate_split,
    state::AppState,
    transactions::dto::CreateTransactionRequest,
};

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction).delete(delete_transaction),
        )
}

fn involves(transaction: &Transaction, user_id: Uuid) -> bool {
    transaction.paid_by == user_id
        || transaction
            .participants
            .iter()
            .any(|p| p.user_id == user_id)
}

#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let db = state.store.read().await?;
    let transactions = db
        .transactions
        .iter()
        .filter(|t| involves(t, user_id))
        .cloned()
        .collect();
    Ok(Json(transactions))
}

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let description = payload.description.unwrap_or_default();
    let amount = payload.amount.unwrap_or(0.0);
    let participants = payload.participants.unwrap_or_default();

    if description.is_empty() || participants.is_empty() || amount == 0.0 {
        return Err(ApiError::Validation(
            "Please provide all required fields".into(),
        ));
    }
    if amount < 0.0 {
        return Err(ApiError::Validation("Amount must be positive".into()));
    }
    if participants.iter().any(|p| p.share < 0.0) {
        return Err(ApiError::Validation("Shares must be non-negative".into()));
    }

    let participants: Vec<Participant> = participants.into_iter().map(Into::into).collect();
    if let Err(mismatch) = validate_split(amount, &participants) {
        warn!(total = mismatch.total, amount = mismatch.amount, "split mismatch");
        return Err(mismatch.into());
    }

    let mut db = state.store.read().await?;

    let transaction = Transaction {
        id: Uuid::new_v4(),
        description,
        amount,
        category: payload.category.unwrap_or_else(|| "general".to_string()),
        paid_by: payload.paid_by.unwrap_or(user_id),
        participants,
        group_id: payload.group_id,
        date: payload.date.unwrap_or_else(OffsetDateTime::now_utc),
        created_at: OffsetDateTime::now_utc(),
        created_by: user_id,
        bank_transaction_id: None,
    };

    db.transactions.push(transaction.clone());
    state.store.write(&db).await?;

    info!(transaction_id = %transaction.id, amount = transaction.amount, "transaction created");
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
    let db = state.store.read().await?;
    let transaction = db
        .transactions
        .iter()
        .find(|t| t.id == id)
        .ok_or(ApiError::NotFound("Transaction not found"))?;

    if !involves(transaction, user_id) {
        return Err(ApiError::AccessDenied("Access denied"));
    }

    Ok(Json(transaction.clone()))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut db = state.store.read().await?;
    let position = db
        .transactions
        .iter()
        .position(|t| t.id == id)
        .ok_or(ApiError::NotFound("Transaction not found"))?;

    if db.transactions[position].created_by != user_id {
        return Err(ApiError::AccessDenied("Access denied"));
    }

    db.transactions.remove(position);
    state.store.write(&db).await?;

    info!(transaction_id = %id, "transaction deleted");
    Ok(Json(json!({ "message": "Transaction deleted successfully" })))
}
