use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    invitations::dto::CreateInvitationRequest,
    model::{Invitation, InvitationStatus},
    state::AppState,
    users::dto::PublicUser,
};

pub fn invitation_routes() -> Router<AppState> {
    Router::new()
        .route("/invitations", post(create_invitation))
        .route("/invitations/sent", get(sent_invitations))
        .route("/invitations/received", get(received_invitations))
        .route("/invitations/contacts", get(contacts))
        .route("/invitations/:id/accept", post(accept_invitation))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn create_invitation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<Invitation>), ApiError> {
    let email = non_empty(payload.email);
    let phone = non_empty(payload.phone);
    let name = non_empty(payload.name);

    if email.is_none() && phone.is_none() && name.is_none() {
        return Err(ApiError::Validation(
            "Please provide at least email, phone, or name".into(),
        ));
    }

    let mut db = state.store.read().await?;

    // An existing account under the invited email makes this a connection
    // rather than a pending invite.
    let invited_user_id = email.as_deref().and_then(|email| {
        db.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.id)
    });
    let inviter = db.users.iter().find(|u| u.id == user_id);

    let invitation = Invitation {
        id: Uuid::new_v4(),
        invited_by: user_id,
        invited_by_email: inviter.map(|u| u.email.clone()),
        invited_by_name: inviter.map(|u| u.name.clone()),
        email,
        phone,
        name,
        user_id: invited_user_id,
        message: payload.message.unwrap_or_default(),
        status: if invited_user_id.is_some() {
            InvitationStatus::Connected
        } else {
            InvitationStatus::Pending
        },
        created_at: OffsetDateTime::now_utc(),
        accepted_at: None,
    };

    db.invitations.push(invitation.clone());
    state.store.write(&db).await?;

    info!(invitation_id = %invitation.id, status = ?invitation.status, "invitation created");
    Ok((StatusCode::CREATED, Json(invitation)))
}

#[instrument(skip(state))]
pub async fn sent_invitations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Invitation>>, ApiError> {
    let db = state.store.read().await?;
    let invitations = db
        .invitations
        .iter()
        .filter(|i| i.invited_by == user_id)
        .cloned()
        .collect();
    Ok(Json(invitations))
}

#[instrument(skip(state))]
pub async fn received_invitations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Invitation>>, ApiError> {
    let db = state.store.read().await?;
    let user = db
        .users
        .iter()
        .find(|u| u.id == user_id)
        .ok_or(ApiError::NotFound("User not found"))?;

    let invitations = db
        .invitations
        .iter()
        .filter(|i| {
            i.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(&user.email))
                || (!user.phone.is_empty() && i.phone.as_deref() == Some(user.phone.as_str()))
                || i.user_id == Some(user_id)
        })
        .cloned()
        .collect();
    Ok(Json(invitations))
}

#[instrument(skip(state))]
pub async fn accept_invitation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invitation>, ApiError> {
    let mut db = state.store.read().await?;
    let invitation = db
        .invitations
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or(ApiError::NotFound("Invitation not found"))?;

    invitation.user_id = Some(user_id);
    invitation.status = InvitationStatus::Accepted;
    invitation.accepted_at = Some(OffsetDateTime::now_utc());

    let accepted = invitation.clone();
    state.store.write(&db).await?;

    info!(invitation_id = %id, "invitation accepted");
    Ok(Json(accepted))
}

/// Everyone the caller is connected to through an accepted or connected
/// invitation, in either direction. Invitations whose counterparty cannot
/// be resolved to a user are skipped.
#[instrument(skip(state))]
pub async fn contacts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let db = state.store.read().await?;
    let contacts = db
        .invitations
        .iter()
        .filter(|i| {
            matches!(
                i.status,
                InvitationStatus::Accepted | InvitationStatus::Connected
            ) && ((i.invited_by == user_id && i.user_id.is_some())
                || i.user_id == Some(user_id))
        })
        .filter_map(|i| {
            let contact_id = if i.invited_by == user_id {
                i.user_id?
            } else {
                i.invited_by
            };
            db.users.iter().find(|u| u.id == contact_id)
        })
        .map(PublicUser::from)
        .collect();
    Ok(Json(contacts))
}
