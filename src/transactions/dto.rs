use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::Participant;

/// Request body for creating a transaction. Required fields are `Option` so
/// their absence surfaces as a 400 with the usual message instead of a
/// deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub paid_by: Option<Uuid>,
    pub participants: Option<Vec<ParticipantInput>>,
    pub group_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInput {
    pub user_id: Uuid,
    pub share: f64,
    #[serde(default)]
    pub settled: bool,
}

impl From<ParticipantInput> for Participant {
    fn from(input: ParticipantInput) -> Self {
        Self {
            user_id: input.user_id,
            share: input.share,
            settled: input.settled,
        }
    }
}
