use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{BankTransaction, Transaction};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAccountRequest {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub ifsc: Option<String>,
}

/// Optional re-split for an imported bank transaction. Without participants
/// the caller becomes the sole, already-settled participant.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub participants: Option<Vec<ImportParticipant>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportParticipant {
    pub user_id: Uuid,
    #[serde(default)]
    pub share: f64,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: &'static str,
    pub count: usize,
    pub transactions: Vec<BankTransaction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub expense: Transaction,
    pub bank_transaction: BankTransaction,
}
