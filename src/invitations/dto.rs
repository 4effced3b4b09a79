use serde::Deserialize;

/// Request body for inviting someone, by any handle the caller knows.
#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
}
