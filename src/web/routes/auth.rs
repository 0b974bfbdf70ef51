use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::{GuildInfo, Location, VisibleUser};
use crate::services::account_service::{self, LoginExtras};
use crate::services::identity_service::SESSION_COOKIE;
use crate::services::visibility_service::VisibilityPolicy;
use crate::state::AppState;
use crate::web::routes::users::peer_list;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub code: String,
    pub code_verifier: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, rename = "pushToken")]
    pub push_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub session: String,
    pub users: Vec<VisibleUser>,
    pub guilds: Vec<GuildInfo>,
}

/// Mobile PKCE login. Answers with the session and the first peer list so the
/// app can draw the map straight away.
pub async fn mobile_login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if let Some(location) = &request.location {
        location.coords.check()?;
    }

    let outcome = account_service::login_with_code(
        state.store.as_ref(),
        &state.discord,
        &state.config.supported_guilds,
        &request.code,
        &state.config.mobile_redirect_uri,
        Some(&request.code_verifier),
        LoginExtras {
            location: request.location,
            push_token: request.push_token,
        },
    )
    .await?;

    let users = peer_list(&state, &outcome.user.id, VisibilityPolicy::V1).await?;
    Ok(Json(LoginResponse {
        status: "ok",
        session: outcome.session,
        users,
        guilds: outcome.guilds,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRedirectQuery {
    pub return_to: Option<String>,
}

pub async fn login_redirect_handler(
    State(state): State<AppState>,
    Query(query): Query<LoginRedirectQuery>,
) -> Redirect {
    let url = state.discord.authorize_url(
        &state.config.web_redirect_uri(),
        query.return_to.as_deref().unwrap_or(""),
    );
    Redirect::to(&url)
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: Option<String>,
}

#[derive(Template)]
#[template(path = "redirect.html")]
pub struct RedirectTemplate {
    pub target: String,
}

/// Web login. Sets the session cookie, then bounces the browser to where the
/// login started.
pub async fn discord_callback_handler(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    let outcome = account_service::login_with_code(
        state.store.as_ref(),
        &state.discord,
        &state.config.supported_guilds,
        &query.code,
        &state.config.web_redirect_uri(),
        None,
        LoginExtras::default(),
    )
    .await?;
    info!(user_id = %outcome.user.id, "Web login complete");

    let template = RedirectTemplate {
        target: safe_return_to(query.state.as_deref()),
    };
    let mut response = Html(template.render()?).into_response();
    let cookie = session_cookie(&outcome.session);
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => error!("Session cookie is not a valid header value: {}", e),
    }
    Ok(response)
}

pub fn session_cookie(token: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie
}

/// Only same-site relative paths; anything else goes to `/`.
pub fn safe_return_to(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|s| s.starts_with('/') && !s.starts_with("//") && !s.contains("://"))
        .filter(|s| !s.contains('\\'))
        .unwrap_or("/")
        .to_string()
}
