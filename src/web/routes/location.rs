use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::Location;
use crate::services::identity_service::SessionError;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn update_location_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(location): Json<Location>,
) -> AppResult<Json<Value>> {
    location.coords.check()?;

    if !state.store.set_location(&auth_user.id, location).await? {
        // Deleted between session check and write.
        return Err(AppError::Session(SessionError::Unknown));
    }

    Ok(Json(json!({ "status": "ok" })))
}
