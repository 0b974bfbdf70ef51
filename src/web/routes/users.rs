use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{GuildInfo, Location, SharingSettings, VisibleUser};
use crate::services::identity_service::SessionError;
use crate::services::visibility_service::{self, VisibilityPolicy};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

/// Peer list for `user_id`, computed over one store snapshot.
pub async fn peer_list(
    state: &AppState,
    user_id: &str,
    policy: VisibilityPolicy,
) -> AppResult<Vec<VisibleUser>> {
    let population = state.store.snapshot().await?;
    let caller = population
        .iter()
        .find(|u| u.id == user_id)
        .ok_or(AppError::Session(SessionError::Unknown))?;

    Ok(visibility_service::compute_visible_peers(
        caller,
        &population,
        &state.config.supported_guilds,
        policy,
    ))
}

/// Closest first; `[0]` is the caller when they have a location.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<VisibleUser>>> {
    peer_list(&state, &auth_user.id, VisibilityPolicy::V1)
        .await
        .map(Json)
}

pub async fn list_users_v2_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<VisibleUser>>> {
    peer_list(&state, &auth_user.id, VisibilityPolicy::V2)
        .await
        .map(Json)
}

#[derive(Debug, Serialize)]
pub struct MeView {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub location: Option<Location>,
    pub guilds: Vec<GuildInfo>,
    pub settings: SharingSettings,
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> AppResult<Json<MeView>> {
    let user = state
        .store
        .get(&auth_user.id)
        .await?
        .ok_or(AppError::Session(SessionError::Unknown))?;

    Ok(Json(MeView {
        avatar_url: user.avatar_url_or_default(),
        id: user.id,
        name: user.username,
        location: user.location,
        guilds: user.guilds,
        settings: user.settings,
    }))
}
