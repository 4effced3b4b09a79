use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::UserProfile, jwt::AuthUser},
    error::ApiError,
    state::AppState,
    users::dto::{PublicUser, SearchQuery, UpdateProfileRequest},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me).put(update_me))
        .route("/users/search", get(search_users))
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let db = state.store.read().await?;
    let user = db
        .users
        .iter()
        .find(|u| u.id == user_id)
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(UserProfile::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut db = state.store.read().await?;
    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == user_id)
        .ok_or(ApiError::NotFound("User not found"))?;

    if let Some(name) = payload.name {
        if !name.trim().is_empty() {
            user.name = name;
        }
    }
    if let Some(phone) = payload.phone {
        user.phone = phone;
    }
    user.updated_at = Some(OffsetDateTime::now_utc());

    let profile = UserProfile::from(&*user);
    state.store.write(&db).await?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(profile))
}

#[instrument(skip(state, params))]
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("Please provide search query".into()))?;
    let needle = query.to_lowercase();

    let db = state.store.read().await?;
    let results = db
        .users
        .iter()
        .filter(|u| {
            u.name.to_lowercase().contains(&needle)
                || u.email.to_lowercase().contains(&needle)
                || (!u.phone.is_empty() && u.phone.contains(query))
        })
        .take(10)
        .map(PublicUser::from)
        .collect();

    Ok(Json(results))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let db = state.store.read().await?;
    let user = db
        .users
        .iter()
        .find(|u| u.id == id)
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(PublicUser::from(user)))
}
