use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::SettingsRequest;
use crate::services::identity_service::SessionError;
use crate::services::settings_service;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn settings_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<SettingsRequest>,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .get(&auth_user.id)
        .await?
        .ok_or(AppError::Session(SessionError::Unknown))?;

    let settings = settings_service::apply_settings(
        state.store.as_ref(),
        &user,
        &request,
        &state.config.supported_guilds,
    )
    .await
    .map_err(|e| {
        info!(user_id = %user.id, "Settings rejected: {}", e);
        AppError::from(e)
    })?;

    info!(user_id = %user.id, guilds = settings.guild_ids.len(), "Settings updated");
    Ok(Json(json!({ "status": "ok" })))
}
