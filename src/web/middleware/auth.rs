use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::UserRecord;
use crate::services::identity_service::{self, ResolveError};
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub session: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match identity_service::extract_session_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            info!(path = %request.uri().path(), "Rejected request: {}", e);
            return AppError::from(e).into_response();
        }
    };

    match identity_service::resolve_session(state.store.as_ref(), &token, identity_service::unix_now())
        .await
    {
        Ok(user) => {
            request.extensions_mut().insert(AuthenticatedUser {
                id: user.id,
                session: token,
            });
            next.run(request).await
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// For pages that work with or without a login. Session problems mean "no
/// user"; store failures are still errors.
pub async fn try_current_user(
    state: &AppState,
    headers: &HeaderMap,
) -> AppResult<Option<(UserRecord, String)>> {
    let token = match identity_service::extract_session_token(headers) {
        Ok(token) => token,
        Err(e) => {
            info!("No usable session: {}", e);
            return Ok(None);
        }
    };

    match identity_service::resolve_session(state.store.as_ref(), &token, identity_service::unix_now())
        .await
    {
        Ok(user) => Ok(Some((user, token))),
        Err(ResolveError::Session(e)) => {
            warn!("No usable session: {}", e);
            Ok(None)
        }
        Err(ResolveError::Store(e)) => Err(e.into()),
    }
}
