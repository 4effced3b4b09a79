use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use rand::Rng;
use serde_json::{json, Value};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    bank::dto::{ConnectAccountRequest, ImportRequest, ImportResponse, SyncResponse},
    error::ApiError,
    model::{BankAccount, BankTransaction, BankTransactionKind, Participant, Transaction},
    split::validate_split,
    state::AppState,
};

const CATEGORIES: [&str; 7] = [
    "food",
    "transport",
    "shopping",
    "entertainment",
    "utilities",
    "groceries",
    "other",
];
const MERCHANTS: [&str; 10] = [
    "Swiggy",
    "Zomato",
    "Amazon",
    "Flipkart",
    "Big Bazaar",
    "DMart",
    "Uber",
    "Ola",
    "Netflix",
    "Spotify",
];

pub fn bank_routes() -> Router<AppState> {
    Router::new()
        .route("/bank-accounts", get(list_accounts))
        .route("/bank-accounts/connect", post(connect_account))
        .route("/bank-accounts/:account_id", delete(disconnect_account))
        .route("/bank-accounts/:account_id/sync", post(sync_transactions))
        .route(
            "/bank-accounts/:account_id/transactions",
            get(list_bank_transactions),
        )
        .route(
            "/bank-accounts/transactions/:transaction_id/import",
            post(import_transaction),
        )
}

#[instrument(skip(state))]
pub async fn list_accounts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<BankAccount>>, ApiError> {
    let db = state.store.read().await?;
    let accounts = db
        .bank_accounts
        .iter()
        .filter(|a| a.user_id == user_id)
        .cloned()
        .collect();
    Ok(Json(accounts))
}

#[instrument(skip(state, payload))]
pub async fn connect_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ConnectAccountRequest>,
) -> Result<(StatusCode, Json<BankAccount>), ApiError> {
    let bank_name = payload.bank_name.unwrap_or_default();
    let account_number = payload.account_number.unwrap_or_default();

    if bank_name.is_empty() || account_number.is_empty() {
        return Err(ApiError::Validation(
            "Please provide bank name and account number".into(),
        ));
    }

    let mut db = state.store.read().await?;

    // Only the tail of the account number survives; the simulated balance
    // lands in [10000, 110000).
    let last_four: String = account_number
        .chars()
        .skip(account_number.chars().count().saturating_sub(4))
        .collect();
    let balance = rand::thread_rng().gen_range(10_000..110_000) as f64;

    let now = OffsetDateTime::now_utc();
    let account = BankAccount {
        id: Uuid::new_v4(),
        user_id,
        bank_name,
        account_number: last_four,
        account_type: payload.account_type.unwrap_or_else(|| "savings".to_string()),
        ifsc: payload.ifsc.unwrap_or_default(),
        balance,
        is_active: true,
        connected_at: now,
        last_synced_at: now,
    };

    db.bank_accounts.push(account.clone());
    state.store.write(&db).await?;

    info!(account_id = %account.id, bank = %account.bank_name, "bank account connected");
    Ok((StatusCode::CREATED, Json(account)))
}

#[instrument(skip(state))]
pub async fn disconnect_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut db = state.store.read().await?;
    let position = db
        .bank_accounts
        .iter()
        .position(|a| a.id == account_id && a.user_id == user_id)
        .ok_or(ApiError::NotFound("Bank account not found"))?;

    db.bank_accounts.remove(position);
    state.store.write(&db).await?;

    info!(account_id = %account_id, "bank account disconnected");
    Ok(Json(json!({
        "message": "Bank account disconnected successfully"
    })))
}

/// Simulated sync: appends ten pseudo-random transactions to the account
/// and bumps its sync timestamp.
#[instrument(skip(state))]
pub async fn sync_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<Json<SyncResponse>, ApiError> {
    let mut db = state.store.read().await?;
    let position = db
        .bank_accounts
        .iter()
        .position(|a| a.id == account_id && a.user_id == user_id)
        .ok_or(ApiError::NotFound("Bank account not found"))?;

    let account_balance = db.bank_accounts[position].balance;
    let now = OffsetDateTime::now_utc();

    // Rng stays inside this block so the handler future remains Send.
    let synced: Vec<BankTransaction> = {
        let mut rng = rand::thread_rng();
        let reference_ms = now.unix_timestamp_nanos() / 1_000_000;
        (0..10)
            .map(|i| {
                let is_debit = rng.gen_bool(0.7);
                let amount = rng.gen_range(50..5050) as f64;
                let days_ago = rng.gen_range(0..30);
                let when = now - TimeDuration::days(days_ago);
                let (description, category) = if is_debit {
                    (
                        MERCHANTS[rng.gen_range(0..MERCHANTS.len())].to_string(),
                        CATEGORIES[rng.gen_range(0..CATEGORIES.len())].to_string(),
                    )
                } else {
                    ("Transfer".to_string(), "income".to_string())
                };

                BankTransaction {
                    id: Uuid::new_v4(),
                    account_id,
                    user_id,
                    kind: if is_debit {
                        BankTransactionKind::Debit
                    } else {
                        BankTransactionKind::Credit
                    },
                    amount,
                    balance: account_balance + if is_debit { -amount } else { amount },
                    description,
                    category,
                    date: when.date(),
                    timestamp: when,
                    reference: format!("TXN{}{}", reference_ms, i),
                    status: "completed".to_string(),
                    is_imported: false,
                    expense_id: None,
                }
            })
            .collect()
    };

    db.bank_transactions.extend(synced.iter().cloned());
    db.bank_accounts[position].last_synced_at = now;
    state.store.write(&db).await?;

    info!(account_id = %account_id, count = synced.len(), "bank transactions synced");
    Ok(Json(SyncResponse {
        message: "Transactions synced successfully",
        count: synced.len(),
        transactions: synced,
    }))
}

#[instrument(skip(state))]
pub async fn list_bank_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<BankTransaction>>, ApiError> {
    let db = state.store.read().await?;
    let mut transactions: Vec<_> = db
        .bank_transactions
        .iter()
        .filter(|t| t.account_id == account_id && t.user_id == user_id)
        .cloned()
        .collect();
    transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(transactions))
}

/// Turn a synced bank transaction into a shared expense. An explicit
/// participant list re-splits the amount (validated first); the payer's own
/// row comes out settled either way.
#[instrument(skip(state, payload))]
pub async fn import_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let mut db = state.store.read().await?;
    let position = db
        .bank_transactions
        .iter()
        .position(|t| t.id == transaction_id && t.user_id == user_id)
        .ok_or(ApiError::NotFound("Bank transaction not found"))?;

    let bank_txn = &db.bank_transactions[position];
    if bank_txn.is_imported {
        return Err(ApiError::Validation("Transaction already imported".into()));
    }

    let participants = match payload.participants {
        Some(requested) if !requested.is_empty() => {
            let participants: Vec<Participant> = requested
                .into_iter()
                .map(|p| Participant {
                    user_id: p.user_id,
                    share: p.share,
                    settled: p.user_id == user_id,
                })
                .collect();
            if let Err(mismatch) = validate_split(bank_txn.amount, &participants) {
                warn!(
                    total = mismatch.total,
                    amount = mismatch.amount,
                    "import split mismatch"
                );
                return Err(mismatch.into());
            }
            participants
        }
        _ => vec![Participant {
            user_id,
            share: bank_txn.amount,
            settled: true,
        }],
    };

    let expense = Transaction {
        id: Uuid::new_v4(),
        description: bank_txn.description.clone(),
        amount: bank_txn.amount,
        category: bank_txn.category.clone(),
        paid_by: user_id,
        participants,
        group_id: None,
        date: bank_txn.date.midnight().assume_utc(),
        created_at: OffsetDateTime::now_utc(),
        created_by: user_id,
        bank_transaction_id: Some(bank_txn.id),
    };

    db.transactions.push(expense.clone());

    let bank_txn = &mut db.bank_transactions[position];
    bank_txn.is_imported = true;
    bank_txn.expense_id = Some(expense.id);
    let imported = bank_txn.clone();

    state.store.write(&db).await?;

    info!(bank_transaction_id = %transaction_id, expense_id = %expense.id, "bank transaction imported");
    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            expense,
            bank_transaction: imported,
        }),
    ))
}
