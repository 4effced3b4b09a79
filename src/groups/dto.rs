use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Group, MemberRole, Transaction};

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub members: Option<Vec<GroupMemberInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberInput {
    pub user_id: Uuid,
    pub role: Option<MemberRole>,
}

/// Admin-editable group fields. The members list deliberately has no place
/// here; it only grows through the add-member route.
#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Option<Uuid>,
}

/// Group record augmented with its transactions and per-member balances.
#[derive(Debug, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub transactions: Vec<Transaction>,
    pub balances: HashMap<Uuid, f64>,
}
