use askama::Template;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::info;

use crate::error::AppResult;
use crate::services::account_service;
use crate::state::AppState;
use crate::web::middleware::auth::try_current_user;

const LOGIN_FOR_DELETE: &str = "/login/discord?return_to=/delete_data";

#[derive(Template)]
#[template(path = "delete_data.html")]
struct DeleteDataTemplate {
    username: String,
}

#[derive(Template)]
#[template(path = "data_deleted.html")]
struct DataDeletedTemplate {
    username: String,
}

pub async fn delete_data_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let Some((user, _)) = try_current_user(&state, &headers).await? else {
        return Ok(Redirect::to(LOGIN_FOR_DELETE).into_response());
    };

    let template = DeleteDataTemplate {
        username: user.username,
    };
    Ok(Html(template.render()?).into_response())
}

/// Removes the user and every session they hold, then confirms.
pub async fn delete_data_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let Some((user, _)) = try_current_user(&state, &headers).await? else {
        return Ok(Redirect::to(LOGIN_FOR_DELETE).into_response());
    };

    account_service::delete_account(state.store.as_ref(), &user.id).await?;
    info!(user_id = %user.id, "Delete request served");

    let template = DataDeletedTemplate {
        username: user.username,
    };
    Ok(Html(template.render()?).into_response())
}
