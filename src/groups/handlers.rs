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
    balance::group_balances,
    error::ApiError,
    groups::dto::{AddMemberRequest, CreateGroupRequest, GroupDetail, UpdateGroupRequest},
    model::{Group, GroupMember, MemberRole},
    state::AppState,
};

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/:id", get(get_group).put(update_group))
        .route("/groups/:id/members", post(add_member))
}

fn member_of(group: &Group, user_id: Uuid) -> bool {
    group.members.iter().any(|m| m.user_id == user_id)
}

fn admin_of(group: &Group, user_id: Uuid) -> bool {
    group
        .members
        .iter()
        .any(|m| m.user_id == user_id && m.role == MemberRole::Admin)
}

#[instrument(skip(state))]
pub async fn list_groups(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Group>>, ApiError> {
    let db = state.store.read().await?;
    let groups = db
        .groups
        .iter()
        .filter(|g| member_of(g, user_id))
        .cloned()
        .collect();
    Ok(Json(groups))
}

#[instrument(skip(state, payload))]
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let name = payload.name.unwrap_or_default();
    let mut requested = payload.members.unwrap_or_default();

    if name.is_empty() || requested.is_empty() {
        return Err(ApiError::Validation(
            "Please provide group name and members".into(),
        ));
    }

    // The creator joins as admin unless the list already names them.
    let now = OffsetDateTime::now_utc();
    let mut members: Vec<GroupMember> = Vec::with_capacity(requested.len() + 1);
    let creator_listed = requested.iter().any(|m| m.user_id == user_id);
    for input in requested.drain(..) {
        members.push(GroupMember {
            user_id: input.user_id,
            role: input.role.unwrap_or(MemberRole::Member),
            joined_at: now,
        });
    }
    if !creator_listed {
        members.push(GroupMember {
            user_id,
            role: MemberRole::Admin,
            joined_at: now,
        });
    }

    let mut db = state.store.read().await?;

    let group = Group {
        id: Uuid::new_v4(),
        name,
        description: payload.description.unwrap_or_default(),
        members,
        created_by: user_id,
        created_at: now,
        updated_at: None,
    };

    db.groups.push(group.clone());
    state.store.write(&db).await?;

    info!(group_id = %group.id, members = group.members.len(), "group created");
    Ok((StatusCode::CREATED, Json(group)))
}

/// Group record plus its transactions and the per-member balance map.
#[instrument(skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupDetail>, ApiError> {
    let db = state.store.read().await?;
    let group = db
        .groups
        .iter()
        .find(|g| g.id == id)
        .ok_or(ApiError::NotFound("Group not found"))?;

    if !member_of(group, user_id) {
        return Err(ApiError::AccessDenied("Access denied"));
    }

    let transactions: Vec<_> = db
        .transactions
        .iter()
        .filter(|t| t.group_id == Some(group.id))
        .cloned()
        .collect();
    let balances = group_balances(&group.members, &transactions);

    Ok(Json(GroupDetail {
        group: group.clone(),
        transactions,
        balances,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let mut db = state.store.read().await?;
    let group = db
        .groups
        .iter_mut()
        .find(|g| g.id == id)
        .ok_or(ApiError::NotFound("Group not found"))?;

    if !admin_of(group, user_id) {
        return Err(ApiError::AccessDenied("Only admins can update group"));
    }

    if let Some(name) = payload.name {
        if !name.trim().is_empty() {
            group.name = name;
        }
    }
    if let Some(description) = payload.description {
        group.description = description;
    }
    group.updated_at = Some(OffsetDateTime::now_utc());

    let updated = group.clone();
    state.store.write(&db).await?;

    info!(group_id = %id, "group updated");
    Ok(Json(updated))
}

#[instrument(skip(state, payload))]
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let Some(new_member) = payload.user_id else {
        return Err(ApiError::Validation("Please provide userId".into()));
    };

    let mut db = state.store.read().await?;
    let group = db
        .groups
        .iter_mut()
        .find(|g| g.id == id)
        .ok_or(ApiError::NotFound("Group not found"))?;

    if !admin_of(group, user_id) {
        return Err(ApiError::AccessDenied("Only admins can add members"));
    }

    if member_of(group, new_member) {
        return Err(ApiError::Validation("Member already in group".into()));
    }

    group.members.push(GroupMember {
        user_id: new_member,
        role: MemberRole::Member,
        joined_at: OffsetDateTime::now_utc(),
    });

    let updated = group.clone();
    state.store.write(&db).await?;

    info!(group_id = %id, member = %new_member, "member added");
    Ok(Json(updated))
}
