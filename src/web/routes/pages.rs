use askama::Template;
use axum::{extract::State, response::Html};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "privacy_policy.html")]
struct PrivacyPolicyTemplate {
    body: String,
}

#[derive(Template)]
#[template(path = "support.html")]
struct SupportTemplate {
    email: String,
}

/// Policy text is read per request so edits go live without a restart.
pub async fn privacy_policy_handler(State(state): State<AppState>) -> AppResult<Html<String>> {
    let path = &state.config.privacy_policy_path;
    let body = tokio::fs::read_to_string(path).await.map_err(|e| {
        warn!(path = %path, "Privacy policy unavailable: {}", e);
        AppError::NotFound
    })?;

    Ok(Html(PrivacyPolicyTemplate { body }.render()?))
}

pub async fn support_handler(State(state): State<AppState>) -> AppResult<Html<String>> {
    let template = SupportTemplate {
        email: state.config.support_email.clone(),
    };
    Ok(Html(template.render()?))
}
