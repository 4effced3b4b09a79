use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettlementRequest {
    pub paid_to: Option<Uuid>,
    pub amount: Option<f64>,
    pub note: Option<String>,
    pub group_id: Option<Uuid>,
}
