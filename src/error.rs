use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::database::StoreError;
use crate::models::LocationError;
use crate::services::account_service::LoginError;
use crate::services::discord_service::DiscordError;
use crate::services::identity_service::{ResolveError, SessionError};
use crate::services::settings_service::{ApplySettingsError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("invalid location: {0}")]
    InvalidLocation(#[from] LocationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Discord(#[from] DiscordError),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("not found")]
    NotFound,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidLocation(_) => StatusCode::BAD_REQUEST,
            AppError::Session(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Discord(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(e) => e.code(),
            AppError::Session(e) => e.code(),
            AppError::InvalidLocation(_) => "invalid_location",
            AppError::Store(_) | AppError::Render(_) => "internal",
            AppError::Discord(_) => "discord_upstream",
            AppError::NotFound => "not_found",
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Session(e) => AppError::Session(e),
            ResolveError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<ApplySettingsError> for AppError {
    fn from(e: ApplySettingsError) -> Self {
        match e {
            ApplySettingsError::Invalid(e) => AppError::Validation(e),
            ApplySettingsError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<LoginError> for AppError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::Discord(e) => AppError::Discord(e),
            LoginError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internals stay in the log, not in the response.
        let detail = if status.is_server_error() && !matches!(self, AppError::Discord(_)) {
            error!("Request failed: {}", self);
            "internal error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({ "error": self.code(), "detail": detail })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests_with_specific_codes() {
        let e = AppError::from(ValidationError::UnsupportedGuild("9".to_string()));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.code(), "unsupported_guild");

        let e = AppError::from(ValidationError::InvalidMargin {
            guild_id: "9".to_string(),
            value: -1.0,
        });
        assert_eq!(e.code(), "invalid_margin");
    }

    #[test]
    fn session_errors_are_unauthorized() {
        for (err, code) in [
            (SessionError::Missing, "session_missing"),
            (SessionError::Malformed, "session_malformed"),
            (SessionError::Unknown, "session_unknown"),
            (SessionError::Expired, "session_expired"),
        ] {
            let e = AppError::from(err);
            assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(e.code(), code);
        }
    }

    #[test]
    fn store_errors_hide_details() {
        let e = AppError::from(StoreError::Corrupt {
            user_id: "1".to_string(),
            reason: "bad".to_string(),
        });
        let resp = e.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn discord_failures_are_bad_gateway_naming_the_upstream_status() {
        let e = AppError::from(DiscordError::Status {
            endpoint: "oauth2/token",
            status: 401,
        });
        assert_eq!(e.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(e.code(), "discord_upstream");
        assert_eq!(e.to_string(), "Discord oauth2/token error: 401");
    }
}
