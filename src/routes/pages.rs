//! Page routes: HTML shell, menu JSON and page content JSON.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use super::session::SessionToken;
use crate::chat::archive::DEFAULT_RECENT_LIMIT;
use crate::error::ApiError;
use crate::nav::MenuItem;
use crate::pages::{Page, PageContent, PageContext};
use crate::render::{self, ShellView};
use crate::services::assistant::{self, ASSISTANT_NAME};
use crate::state::AppState;

fn no_pages() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "E_NO_PAGES", "no pages are registered")
}

/// Gather what `page` needs to render for this session.
pub(crate) async fn page_context(state: &AppState, page: &dyn Page, token: &str) -> PageContext {
    let settings = state.settings().await;
    let llm = state.llm_status().await;
    if !page.uses_chat() {
        return PageContext { settings, llm, chat: None, recent_chats: Vec::new() };
    }

    let chat = assistant::current_chat(state, token).await;
    let recent_chats = match state.archive.recent(ASSISTANT_NAME, DEFAULT_RECENT_LIMIT).await {
        Ok(recent) => recent,
        Err(e) => {
            tracing::warn!(error = %e, "listing recent chats failed");
            Vec::new()
        }
    };
    PageContext { settings, llm, chat: Some(chat), recent_chats }
}

fn menu_for(state: &AppState, nested: bool) -> Vec<MenuItem> {
    if nested { state.registry.menu().to_vec() } else { state.registry.flat_menu() }
}

async fn render_shell(state: &AppState, key: Option<&str>, token: &str) -> Response {
    let Some(page) = state.registry.resolve(key).map(Arc::clone) else {
        return no_pages().into_response();
    };
    if let Some(requested) = key.filter(|k| *k != page.key()) {
        tracing::debug!(requested, fallback = page.key(), "unknown page key");
    }

    let ctx = page_context(state, page.as_ref(), token).await;
    let content = page.content(&ctx);
    let menu = menu_for(state, ctx.settings.app.menu.use_multi_icon_menu);
    Html(render::page_html(&ShellView { settings: &ctx.settings, menu: &menu, active: page.key(), content: &content }))
        .into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /`: the default page.
pub async fn index(State(state): State<AppState>, SessionToken(token): SessionToken) -> Response {
    render_shell(&state, None, &token).await
}

/// `GET /page/{key}`: the named page, or the default page for unknown keys.
pub async fn show_page(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(key): Path<String>,
) -> Response {
    render_shell(&state, Some(&key), &token).await
}

#[derive(Debug, Deserialize)]
pub struct NavQuery {
    selected: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NavResponse {
    pub nested: bool,
    pub menu: Vec<MenuItem>,
    pub default_key: Option<String>,
    /// The page a `selected` key resolves to.
    pub selected: Option<String>,
    /// Pages refused at registration (empty or duplicate keys).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

/// `GET /api/nav`: menu tree, or the flat menu when nesting is disabled.
pub async fn nav(State(state): State<AppState>, Query(query): Query<NavQuery>) -> Json<NavResponse> {
    let nested = state.settings.read().await.app.menu.use_multi_icon_menu;
    let registry = &state.registry;
    Json(NavResponse {
        nested,
        menu: menu_for(&state, nested),
        default_key: registry.default_page().map(|p| p.key().to_string()),
        selected: registry.resolve(query.selected.as_deref()).map(|p| p.key().to_string()),
        rejected: registry.rejected().to_vec(),
    })
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub key: String,
    #[serde(flatten)]
    pub content: PageContent,
}

/// `GET /api/pages/{key}`: one page's content blocks.
pub async fn page_json(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(key): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .registry
        .get(&key)
        .map(Arc::clone)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "E_PAGE_NOT_FOUND", format!("no page named {key}")))?;
    let ctx = page_context(&state, page.as_ref(), &token).await;
    Ok(Json(PageResponse { key, content: page.content(&ctx) }))
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
