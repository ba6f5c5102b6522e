//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the HTML pages and the JSON API. Every route sits
//! behind the session middleware, so handlers can rely on a session token.
//!
//! Nothing here is authenticated, so cross-origin access is off unless
//! `CORS_ALLOW_ORIGIN` names the one origin allowed to call the API.

pub mod chat;
pub mod pages;
pub mod session;
pub mod settings;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let origin = std::env::var("CORS_ALLOW_ORIGIN").ok();
    app_with_cors(state, cors_layer(origin.as_deref()))
}

/// CORS restricted to a single configured origin, or `None` for same-origin only.
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin.map(str::trim).filter(|o| !o.is_empty())?;
    match HeaderValue::from_str(origin) {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true),
        ),
        Err(e) => {
            tracing::warn!(%origin, error = %e, "ignoring invalid CORS_ALLOW_ORIGIN");
            None
        }
    }
}

fn app_with_cors(state: AppState, cors: Option<CorsLayer>) -> Router {
    let mut router = Router::new()
        .route("/", get(pages::index))
        .route("/page/{key}", get(pages::show_page))
        .route("/api/nav", get(pages::nav))
        .route("/api/pages/{key}", get(pages::page_json))
        .route(
            "/api/chat",
            get(chat::get_chat).post(chat::post_chat).delete(chat::clear_chat),
        )
        .route("/api/chats", get(chat::list_chats))
        .route("/api/chats/new", post(chat::new_chat))
        .route("/api/chats/{id}/load", post(chat::load_chat))
        .route("/api/diagram/render", post(chat::render_diagram))
        .route(
            "/api/settings/api",
            get(settings::get_api_settings).put(settings::put_api_settings),
        )
        .route(
            "/api/settings/theme",
            get(settings::get_theme).put(settings::put_theme),
        )
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn(session::ensure_session));
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
