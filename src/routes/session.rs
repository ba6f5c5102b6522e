//! Browser session cookie.
//!
//! `ensure_session` runs in front of every route: a request without the
//! cookie gets a fresh random token, passed to handlers through a request
//! extension and set on the response. Handlers read it with [`SessionToken`].

use axum::extract::{FromRequestParts, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::chat::sessions::generate_token;

pub const COOKIE_NAME: &str = "multipage_session";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn cookie_secure() -> bool {
    env_bool("COOKIE_SECURE").unwrap_or(false)
}

/// Session token of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = parts.extensions.get::<SessionToken>() {
            return Ok(token.clone());
        }
        let jar = CookieJar::from_headers(&parts.headers);
        match jar.get(COOKIE_NAME).map(Cookie::value) {
            Some(token) if !token.is_empty() => Ok(Self(token.to_owned())),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

/// Middleware issuing a session cookie to requests that lack one.
pub async fn ensure_session(jar: CookieJar, mut req: Request, next: Next) -> Response {
    if jar.get(COOKIE_NAME).is_some_and(|c| !c.value().is_empty()) {
        return next.run(req).await;
    }

    let token = generate_token();
    req.extensions_mut().insert(SessionToken(token.clone()));
    let response = next.run(req).await;

    let cookie = Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure());
    tracing::debug!("issued session cookie");
    (CookieJar::new().add(cookie), response).into_response()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
