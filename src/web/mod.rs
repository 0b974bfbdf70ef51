pub mod middleware;
pub mod routes;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::state::AppState;
use middleware::auth as auth_middleware;
use routes::{account, auth, location, pages, settings, users};

pub fn router(state: AppState) -> Router {
    // Everything here needs a live session.
    let protected_routes = Router::new()
        .route("/update", post(location::update_location_handler))
        .route("/users", get(users::list_users_handler))
        .route("/v2/users", get(users::list_users_v2_handler))
        .route("/me", get(users::me_handler))
        .route("/settings", post(settings::settings_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    let static_files =
        ServeDir::new(state.config.static_dir.clone()).append_index_html_on_directories(true);

    Router::new()
        .route(
            "/login/discord",
            get(auth::login_redirect_handler).post(auth::mobile_login_handler),
        )
        .route("/discord-callback", get(auth::discord_callback_handler))
        .route(
            "/delete_data",
            get(account::delete_data_form_handler).post(account::delete_data_handler),
        )
        .route("/privacy-policy", get(pages::privacy_policy_handler))
        .route("/support", get(pages::support_handler))
        .merge(protected_routes)
        .fallback_service(static_files)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
